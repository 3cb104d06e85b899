mod chat_repository;
mod document_extractor;
mod document_repository;
mod lab_repository;
mod provider_client;
mod repository_error;
mod symptom_repository;
mod wearable_repository;

pub use chat_repository::ChatRepository;
pub use document_extractor::{DocumentExtractor, ExtractorError, ExtractorHealth};
pub use document_repository::DocumentRepository;
pub use lab_repository::LabResultRepository;
pub use provider_client::{
    AssistantTurn, ConnectivityStatus, ProviderClient, ProviderError, ProviderHealth,
    ProviderMessage, TokenStream, ToolCallRequest, WireRole,
};
pub use repository_error::RepositoryError;
pub use symptom_repository::SymptomRepository;
pub use wearable_repository::WearableRepository;
