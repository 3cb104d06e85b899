use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use meridian::application::ports::{
    ChatRepository, DocumentExtractor, DocumentRepository, LabResultRepository, ProviderClient,
    SymptomRepository, WearableRepository,
};
use meridian::application::services::{
    ChatService, DocumentPipeline, PipelineWorker, RetryPolicy,
};
use meridian::infrastructure::extractor::{DoclingClient, DoclingConfig};
use meridian::infrastructure::llm::{
    OllamaClient, OllamaConfig, OpenRouterClient, OpenRouterConfig,
};
use meridian::infrastructure::observability::{TracingConfig, init_tracing};
use meridian::infrastructure::persistence::{
    InMemoryChatStore, InMemoryDocumentStore, InMemoryHealthDataStore, InMemoryLabStore,
};
use meridian::presentation::{AppState, ChatProviderKind, Settings, create_router};

const PIPELINE_QUEUE_CAPACITY: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env();

    init_tracing(
        TracingConfig {
            environment: settings.environment.to_string(),
            json_format: settings.logging.enable_json,
        },
        settings.server.port,
    );

    // Chat provider is selected by config; the orchestrator only ever sees
    // the trait.
    let chat_provider: Arc<dyn ProviderClient> = match settings.provider.chat_provider {
        ChatProviderKind::OpenRouter => Arc::new(OpenRouterClient::new(OpenRouterConfig {
            base_url: settings.provider.openrouter.base_url.clone(),
            api_key: settings.provider.openrouter.api_key.clone(),
            model: settings.provider.openrouter.model.clone(),
            timeout_seconds: settings.provider.ollama.timeout_seconds,
        })),
        ChatProviderKind::Ollama => Arc::new(OllamaClient::new(OllamaConfig {
            host: settings.provider.ollama.host.clone(),
            model: settings.provider.ollama.chat_model.clone(),
            timeout_seconds: settings.provider.ollama.timeout_seconds,
            json_format: false,
        })),
    };

    // The pipeline gets its own instance carrying the extraction model and
    // JSON output mode.
    let extraction_provider: Arc<dyn ProviderClient> = Arc::new(OllamaClient::new(OllamaConfig {
        host: settings.provider.ollama.host.clone(),
        model: settings.provider.ollama.extraction_model.clone(),
        timeout_seconds: settings.provider.ollama.timeout_seconds,
        json_format: true,
    }));

    let extractor: Arc<dyn DocumentExtractor> = Arc::new(DoclingClient::new(DoclingConfig {
        url: settings.extractor.url.clone(),
        timeout_seconds: settings.extractor.timeout_seconds,
    }));

    let document_repository: Arc<dyn DocumentRepository> = Arc::new(InMemoryDocumentStore::new());
    let lab_repository: Arc<dyn LabResultRepository> = Arc::new(InMemoryLabStore::new());
    let chat_repository: Arc<dyn ChatRepository> = Arc::new(InMemoryChatStore::new());
    let health_data = Arc::new(InMemoryHealthDataStore::new());
    let symptom_repository: Arc<dyn SymptomRepository> = health_data.clone();
    let wearable_repository: Arc<dyn WearableRepository> = health_data;

    let pipeline = Arc::new(DocumentPipeline::new(
        Arc::clone(&extractor),
        Arc::clone(&extraction_provider),
        Arc::clone(&document_repository),
        Arc::clone(&lab_repository),
        RetryPolicy {
            max_retries: settings.pipeline.max_retries,
            backoff: Duration::from_secs(settings.pipeline.retry_backoff_seconds),
        },
    ));

    let (pipeline_sender, pipeline_receiver) = mpsc::channel(PIPELINE_QUEUE_CAPACITY);
    let worker = PipelineWorker::new(pipeline_receiver, pipeline);
    tokio::spawn(worker.run());

    let chat_service = Arc::new(ChatService::new(
        Arc::clone(&chat_provider),
        chat_repository,
        Arc::clone(&lab_repository),
        symptom_repository,
        wearable_repository,
        settings.chat.max_tool_rounds,
    ));

    let state = AppState {
        chat_service,
        provider: chat_provider,
        extractor,
        document_repository,
        pipeline_sender,
        settings: settings.clone(),
    };

    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
