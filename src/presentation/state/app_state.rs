use std::sync::Arc;

use tokio::sync::mpsc;

use crate::application::ports::{DocumentExtractor, DocumentRepository, ProviderClient};
use crate::application::services::{ChatService, PipelineMessage};
use crate::presentation::config::Settings;

pub struct AppState<P: ?Sized, X: ?Sized>
where
    P: ProviderClient,
    X: DocumentExtractor,
{
    pub chat_service: Arc<ChatService<P>>,
    pub provider: Arc<P>,
    pub extractor: Arc<X>,
    pub document_repository: Arc<dyn DocumentRepository>,
    pub pipeline_sender: mpsc::Sender<PipelineMessage>,
    pub settings: Settings,
}

impl<P: ?Sized, X: ?Sized> Clone for AppState<P, X>
where
    P: ProviderClient,
    X: DocumentExtractor,
{
    fn clone(&self) -> Self {
        Self {
            chat_service: Arc::clone(&self.chat_service),
            provider: Arc::clone(&self.provider),
            extractor: Arc::clone(&self.extractor),
            document_repository: Arc::clone(&self.document_repository),
            pipeline_sender: self.pipeline_sender.clone(),
            settings: self.settings.clone(),
        }
    }
}
