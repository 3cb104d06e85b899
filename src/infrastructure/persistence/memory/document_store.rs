use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::application::ports::{DocumentRepository, RepositoryError};
use crate::domain::{Document, DocumentId, DocumentStatus};

/// In-memory document adapter. Stands in for the relational store in the
/// composition root and tests.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    documents: Mutex<Vec<Document>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_transition(document: &Document, next: DocumentStatus) -> Result<(), RepositoryError> {
    if document.status.can_advance_to(next) {
        Ok(())
    } else {
        Err(RepositoryError::QueryFailed(format!(
            "illegal status transition {} -> {} for document {}",
            document.status,
            next,
            document.id.as_uuid()
        )))
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentStore {
    async fn create(&self, document: &Document) -> Result<(), RepositoryError> {
        self.documents.lock().await.push(document.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: DocumentId) -> Result<Option<Document>, RepositoryError> {
        Ok(self
            .documents
            .lock()
            .await
            .iter()
            .find(|d| d.id == id)
            .cloned())
    }

    async fn update_status(
        &self,
        id: DocumentId,
        status: DocumentStatus,
    ) -> Result<(), RepositoryError> {
        let mut documents = self.documents.lock().await;
        let document = documents
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| RepositoryError::NotFound(format!("document {}", id.as_uuid())))?;
        check_transition(document, status)?;
        document.status = status;
        Ok(())
    }

    async fn mark_parsed(&self, id: DocumentId, raw_text: &str) -> Result<(), RepositoryError> {
        let mut documents = self.documents.lock().await;
        let document = documents
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| RepositoryError::NotFound(format!("document {}", id.as_uuid())))?;
        check_transition(document, DocumentStatus::Parsed)?;
        document.raw_text = Some(raw_text.to_string());
        document.status = DocumentStatus::Parsed;
        Ok(())
    }

    async fn mark_completed(
        &self,
        id: DocumentId,
        summary: serde_json::Value,
    ) -> Result<(), RepositoryError> {
        let mut documents = self.documents.lock().await;
        let document = documents
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| RepositoryError::NotFound(format!("document {}", id.as_uuid())))?;
        check_transition(document, DocumentStatus::Completed)?;
        document.parsed_data = Some(summary);
        document.status = DocumentStatus::Completed;
        Ok(())
    }
}
