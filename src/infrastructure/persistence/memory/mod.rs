mod chat_store;
mod document_store;
mod health_data_store;
mod lab_store;

pub use chat_store::InMemoryChatStore;
pub use document_store::InMemoryDocumentStore;
pub use health_data_store::InMemoryHealthDataStore;
pub use lab_store::InMemoryLabStore;
