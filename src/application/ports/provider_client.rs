use std::pin::Pin;

use async_trait::async_trait;
use futures::stream::Stream;

use crate::application::tools::ToolDefinition;

/// Finite stream of text deltas from a streaming chat call.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, ProviderError>> + Send + 'static>>;

/// Uniform interface to one conversational-model backend. Both adapters
/// (local-model and hosted-gateway) satisfy the same contract so the
/// orchestrator never branches on provider identity.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Single non-streaming call. Returns the assistant's content and any
    /// tool invocations it requested. No retry inside the client; that
    /// belongs to the caller.
    async fn chat_once(
        &self,
        messages: &[ProviderMessage],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<AssistantTurn, ProviderError>;

    /// Streaming call without tools, terminated by the backend's end marker.
    async fn chat_stream(&self, messages: &[ProviderMessage])
        -> Result<TokenStream, ProviderError>;

    /// Connectivity probe. Never fails; unreachability is a status.
    async fn health_check(&self) -> ProviderHealth;
}

/// One conversation turn in provider wire form. `tool_calls` is populated on
/// assistant turns that requested tools; `tool_call_id` on tool-result turns
/// (consumed by the hosted-gateway adapter, ignored by the local one).
#[derive(Debug, Clone)]
pub struct ProviderMessage {
    pub role: WireRole,
    pub content: String,
    pub tool_calls: Vec<ToolCallRequest>,
    pub tool_call_id: Option<String>,
}

impl ProviderMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(WireRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(WireRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(WireRole::Assistant, content)
    }

    pub fn tool_result(content: impl Into<String>, tool_call_id: Option<String>) -> Self {
        Self {
            role: WireRole::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id,
        }
    }

    pub fn from_assistant_turn(turn: &AssistantTurn) -> Self {
        Self {
            role: WireRole::Assistant,
            content: turn.content.clone(),
            tool_calls: turn.tool_calls.clone(),
            tool_call_id: None,
        }
    }

    fn plain(role: WireRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireRole {
    System,
    User,
    Assistant,
    Tool,
}

impl WireRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            WireRole::System => "system",
            WireRole::User => "user",
            WireRole::Assistant => "assistant",
            WireRole::Tool => "tool",
        }
    }
}

/// The assistant's reply to a non-streaming call.
#[derive(Debug, Clone, Default)]
pub struct AssistantTurn {
    pub content: String,
    pub tool_calls: Vec<ToolCallRequest>,
}

/// A tool invocation requested by the model. `id` is set by providers that
/// tag tool results (hosted gateway); arguments arrive as loose JSON.
#[derive(Debug, Clone)]
pub struct ToolCallRequest {
    pub id: Option<String>,
    pub name: String,
    pub arguments: serde_json::Value,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::RequestFailed(_))
    }
}

#[derive(Debug, Clone)]
pub struct ProviderHealth {
    pub status: ConnectivityStatus,
    pub host: String,
    pub chat_model: Option<String>,
    pub available_models: Vec<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityStatus {
    Connected,
    Unreachable,
    Error,
}

impl ConnectivityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectivityStatus::Connected => "connected",
            ConnectivityStatus::Unreachable => "unreachable",
            ConnectivityStatus::Error => "error",
        }
    }
}
