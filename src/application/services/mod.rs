mod chat_orchestrator;
mod chat_service;
mod document_pipeline;
mod pipeline_worker;

pub use chat_orchestrator::{
    ChatEvent, ChatEventStream, ChatOrchestrator, DEFAULT_MAX_TOOL_ROUNDS,
};
pub use chat_service::{ChatService, ChatServiceError};
pub use document_pipeline::{
    DocumentPipeline, ExtractionReport, PipelineError, PipelineOutcome, PipelineStage,
    RetryPolicy, DEFAULT_EXTRACTION_TEXT_LIMIT,
};
pub use pipeline_worker::{PipelineMessage, PipelineWorker};
