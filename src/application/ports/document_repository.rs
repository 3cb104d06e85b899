use async_trait::async_trait;

use crate::domain::{Document, DocumentId, DocumentStatus};

use super::RepositoryError;

/// Documents are mutated only through these named transition operations;
/// the pipeline guards each stage on the current status.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn create(&self, document: &Document) -> Result<(), RepositoryError>;

    async fn get_by_id(&self, id: DocumentId) -> Result<Option<Document>, RepositoryError>;

    async fn update_status(
        &self,
        id: DocumentId,
        status: DocumentStatus,
    ) -> Result<(), RepositoryError>;

    /// Store extracted text and advance to `parsed` in one operation.
    async fn mark_parsed(&self, id: DocumentId, raw_text: &str) -> Result<(), RepositoryError>;

    /// Advance to `completed`, storing the extraction summary as the
    /// document's parsed payload.
    async fn mark_completed(
        &self,
        id: DocumentId,
        summary: serde_json::Value,
    ) -> Result<(), RepositoryError>;
}
