use std::str::FromStr;

use serde::Deserialize;

use super::Environment;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub environment: Environment,
    pub server: ServerSettings,
    pub provider: ProviderSettings,
    pub extractor: ExtractorSettings,
    pub pipeline: PipelineSettings,
    pub chat: ChatSettings,
    pub storage: StorageSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSettings {
    pub chat_provider: ChatProviderKind,
    pub ollama: OllamaSettings,
    pub openrouter: OpenRouterSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatProviderKind {
    Ollama,
    OpenRouter,
}

impl ChatProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatProviderKind::Ollama => "ollama",
            ChatProviderKind::OpenRouter => "openrouter",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OllamaSettings {
    pub host: String,
    pub chat_model: String,
    pub extraction_model: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenRouterSettings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractorSettings {
    pub url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSettings {
    pub max_retries: u32,
    pub retry_backoff_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatSettings {
    pub max_tool_rounds: usize,
    pub sse_keep_alive_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    pub upload_dir: String,
    pub max_upload_size_mb: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub enable_json: bool,
}

impl Settings {
    /// Build the settings tree from environment variables (a `.env` file is
    /// loaded by the composition root first). Every key has a local-dev
    /// default except the gateway credentials.
    pub fn from_env() -> Self {
        Self {
            environment: Environment::try_from(env_or("APP_ENV", "local"))
                .unwrap_or(Environment::Local),
            server: ServerSettings {
                host: env_or("SERVER_HOST", "0.0.0.0"),
                port: env_parse("SERVER_PORT", 8000),
            },
            provider: ProviderSettings {
                chat_provider: match env_or("CHAT_PROVIDER", "ollama").to_lowercase().as_str() {
                    "openrouter" => ChatProviderKind::OpenRouter,
                    _ => ChatProviderKind::Ollama,
                },
                ollama: OllamaSettings {
                    host: env_or("OLLAMA_HOST", "http://localhost:11434"),
                    chat_model: env_or("OLLAMA_CHAT_MODEL", "llama3.1:8b"),
                    extraction_model: env_or("OLLAMA_EXTRACTION_MODEL", "llama3.1:8b"),
                    timeout_seconds: env_parse("OLLAMA_TIMEOUT_SECONDS", 120),
                },
                openrouter: OpenRouterSettings {
                    base_url: env_or("OPENROUTER_BASE_URL", "https://openrouter.ai/api/v1"),
                    api_key: env_or("OPENROUTER_API_KEY", ""),
                    model: env_or("OPENROUTER_MODEL", "anthropic/claude-3.5-haiku"),
                },
            },
            extractor: ExtractorSettings {
                url: env_or("DOCLING_URL", "http://localhost:5001"),
                timeout_seconds: env_parse("DOCLING_TIMEOUT_SECONDS", 300),
            },
            pipeline: PipelineSettings {
                max_retries: env_parse("PIPELINE_MAX_RETRIES", 2),
                retry_backoff_seconds: env_parse("PIPELINE_RETRY_BACKOFF_SECONDS", 30),
            },
            chat: ChatSettings {
                max_tool_rounds: env_parse("CHAT_MAX_TOOL_ROUNDS", 5),
                sse_keep_alive_seconds: env_parse("SSE_KEEP_ALIVE_SECONDS", 15),
            },
            storage: StorageSettings {
                upload_dir: env_or("UPLOAD_DIR", "./uploads"),
                max_upload_size_mb: env_parse("MAX_UPLOAD_SIZE_MB", 20),
            },
            logging: LoggingSettings {
                level: env_or("LOG_LEVEL", "info"),
                enable_json: env_parse("LOG_JSON", false),
            },
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
