mod ollama_client;
mod openrouter_client;
mod scripted_provider;

pub use ollama_client::{OllamaClient, OllamaConfig};
pub use openrouter_client::{OpenRouterClient, OpenRouterConfig};
pub use scripted_provider::ScriptedProvider;
