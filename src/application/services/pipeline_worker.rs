use std::sync::Arc;

use tokio::sync::mpsc;

use crate::application::ports::{DocumentExtractor, ProviderClient};
use crate::domain::DocumentId;

use super::document_pipeline::{DocumentPipeline, PipelineOutcome};

pub struct PipelineMessage {
    pub document_id: DocumentId,
}

/// Drains accepted uploads and runs each through the pipeline as one unit
/// of work. A failed document never takes the worker down.
pub struct PipelineWorker<X: ?Sized, P: ?Sized> {
    receiver: mpsc::Receiver<PipelineMessage>,
    pipeline: Arc<DocumentPipeline<X, P>>,
}

impl<X, P> PipelineWorker<X, P>
where
    X: DocumentExtractor + ?Sized + 'static,
    P: ProviderClient + ?Sized + 'static,
{
    pub fn new(
        receiver: mpsc::Receiver<PipelineMessage>,
        pipeline: Arc<DocumentPipeline<X, P>>,
    ) -> Self {
        Self { receiver, pipeline }
    }

    pub async fn run(mut self) {
        tracing::info!("Document pipeline worker started");
        while let Some(msg) = self.receiver.recv().await {
            let span = tracing::info_span!(
                "document_pipeline",
                document_id = %msg.document_id.as_uuid(),
            );
            let _guard = span.enter();

            match self.pipeline.process(msg.document_id).await {
                Ok(PipelineOutcome::Completed { report, .. }) => {
                    tracing::info!(
                        saved = report.saved,
                        skipped = report.skipped,
                        "Document processing completed"
                    );
                }
                Ok(PipelineOutcome::Failed { stage, reason, .. }) => {
                    tracing::error!(
                        stage = stage.as_str(),
                        reason = %reason,
                        "Document processing failed"
                    );
                }
                Ok(PipelineOutcome::Skipped { status, .. }) => {
                    tracing::debug!(status = %status, "Document already being processed");
                }
                Ok(PipelineOutcome::NotFound { .. }) => {
                    tracing::error!("Document not found");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Pipeline run failed");
                }
            }
        }
        tracing::info!("Document pipeline worker stopped: channel closed");
    }
}
