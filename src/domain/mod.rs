mod chat_message;
mod chat_session;
mod document;
mod document_status;
mod lab_result;
mod message_role;
mod symptom_entry;
mod user_id;
mod wearable;

pub use chat_message::{ChatMessage, MessageId};
pub use chat_session::{ChatSession, SessionId};
pub use document::{Document, DocumentId, DocumentType};
pub use document_status::DocumentStatus;
pub use lab_result::{LabResult, LabResultId, LabStatus};
pub use message_role::MessageRole;
pub use symptom_entry::{SymptomEntry, SymptomEntryId};
pub use user_id::UserId;
pub use wearable::{EventCategory, HealthEvent, SeriesDefinition, SeriesSample};
