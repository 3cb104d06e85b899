mod chat;
mod documents;
mod health;

pub use chat::{
    create_session_handler, delete_session_handler, get_session_handler, list_messages_handler,
    list_sessions_handler, send_message_handler,
};
pub use documents::{document_status_handler, upload_document_handler};
pub use health::{ai_status_handler, health_handler};
