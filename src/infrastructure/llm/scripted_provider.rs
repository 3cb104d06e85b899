use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::application::ports::{
    AssistantTurn, ConnectivityStatus, ProviderClient, ProviderError, ProviderHealth,
    ProviderMessage, TokenStream,
};
use crate::application::tools::ToolDefinition;

/// Test double with a scripted queue of turns. Each `chat_once` pops the
/// next scripted result; `chat_stream` replays the configured tokens.
#[derive(Default)]
pub struct ScriptedProvider {
    turns: Mutex<VecDeque<Result<AssistantTurn, ProviderError>>>,
    stream_tokens: Mutex<Vec<Result<String, ProviderError>>>,
    chat_once_calls: AtomicUsize,
    chat_stream_calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_turn(&self, turn: AssistantTurn) {
        self.turns.lock().unwrap().push_back(Ok(turn));
    }

    pub fn push_error(&self, error: ProviderError) {
        self.turns.lock().unwrap().push_back(Err(error));
    }

    pub fn set_stream_tokens(&self, tokens: Vec<&str>) {
        *self.stream_tokens.lock().unwrap() =
            tokens.into_iter().map(|t| Ok(t.to_string())).collect();
    }

    pub fn set_stream_error(&self, error: ProviderError) {
        *self.stream_tokens.lock().unwrap() = vec![Err(error)];
    }

    pub fn chat_once_calls(&self) -> usize {
        self.chat_once_calls.load(Ordering::SeqCst)
    }

    pub fn chat_stream_calls(&self) -> usize {
        self.chat_stream_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderClient for ScriptedProvider {
    async fn chat_once(
        &self,
        _messages: &[ProviderMessage],
        _tools: Option<&[ToolDefinition]>,
    ) -> Result<AssistantTurn, ProviderError> {
        self.chat_once_calls.fetch_add(1, Ordering::SeqCst);
        self.turns
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::InvalidResponse("script exhausted".to_string())))
    }

    async fn chat_stream(
        &self,
        _messages: &[ProviderMessage],
    ) -> Result<TokenStream, ProviderError> {
        self.chat_stream_calls.fetch_add(1, Ordering::SeqCst);
        let tokens: Vec<Result<String, ProviderError>> =
            std::mem::take(&mut *self.stream_tokens.lock().unwrap());
        Ok(Box::pin(futures::stream::iter(tokens)))
    }

    async fn health_check(&self) -> ProviderHealth {
        ProviderHealth {
            status: ConnectivityStatus::Connected,
            host: "scripted".to_string(),
            chat_model: None,
            available_models: Vec::new(),
            error: None,
        }
    }
}
