mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    ChatProviderKind, ChatSettings, ExtractorSettings, LoggingSettings, OllamaSettings,
    OpenRouterSettings, PipelineSettings, ProviderSettings, ServerSettings, Settings,
    StorageSettings,
};
