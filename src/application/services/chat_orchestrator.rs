use std::pin::Pin;
use std::sync::Arc;

use futures::stream::{Stream, StreamExt};
use serde::Serialize;

use crate::application::ports::{ProviderClient, ProviderMessage};
use crate::application::tools::{ToolDefinition, ToolExecutor};

pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 5;

/// Normalized event vocabulary emitted to the chat caller. Identical for
/// every provider; serialized shape matches the SSE frames.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    Content { content: String },
    ToolCall { name: String, arguments: serde_json::Value },
    ToolResult { name: String, result: String },
    Done,
    Error { error: String },
}

pub type ChatEventStream = Pin<Box<dyn Stream<Item = ChatEvent> + Send + 'static>>;

/// Drives the tool-calling loop against one provider. Each round makes a
/// non-streaming call with the tool catalog; requested calls execute
/// strictly sequentially, in the order the model returned them, with the
/// serialized result fed back into the conversation before the next round.
pub struct ChatOrchestrator<P: ProviderClient + ?Sized> {
    provider: Arc<P>,
    max_tool_rounds: usize,
}

impl<P: ProviderClient + ?Sized + 'static> ChatOrchestrator<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }

    pub fn with_max_tool_rounds(mut self, max_tool_rounds: usize) -> Self {
        self.max_tool_rounds = max_tool_rounds;
        self
    }

    pub fn run(
        &self,
        conversation: Vec<ProviderMessage>,
        tools: Vec<ToolDefinition>,
        executor: Arc<dyn ToolExecutor>,
    ) -> ChatEventStream {
        let provider = Arc::clone(&self.provider);
        let max_tool_rounds = self.max_tool_rounds;

        Box::pin(async_stream::stream! {
            let mut conversation = conversation;

            for round in 0..max_tool_rounds {
                let turn = match provider.chat_once(&conversation, Some(tools.as_slice())).await {
                    Ok(turn) => turn,
                    Err(e) => {
                        tracing::error!(error = %e, round, "Provider call failed");
                        yield ChatEvent::Error { error: e.to_string() };
                        return;
                    }
                };

                if turn.tool_calls.is_empty() {
                    if !turn.content.is_empty() {
                        yield ChatEvent::Content { content: turn.content };
                    }
                    yield ChatEvent::Done;
                    return;
                }

                tracing::debug!(round, tool_calls = turn.tool_calls.len(), "Tool round");
                conversation.push(ProviderMessage::from_assistant_turn(&turn));

                for call in &turn.tool_calls {
                    yield ChatEvent::ToolCall {
                        name: call.name.clone(),
                        arguments: call.arguments.clone(),
                    };

                    let result = executor.execute(&call.name, &call.arguments).await;

                    yield ChatEvent::ToolResult {
                        name: call.name.clone(),
                        result: result.clone(),
                    };

                    conversation.push(ProviderMessage::tool_result(result, call.id.clone()));
                }
            }

            // Round bound hit with tools still pending: force a terminal
            // textual answer with a tools-disabled streaming call.
            tracing::warn!(
                max_tool_rounds,
                "Max tool rounds reached, generating final response without tools"
            );
            let mut stream = match provider.chat_stream(&conversation).await {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::error!(error = %e, "Fallback stream failed to start");
                    yield ChatEvent::Error { error: e.to_string() };
                    return;
                }
            };

            while let Some(delta) = stream.next().await {
                match delta {
                    Ok(token) => {
                        if !token.is_empty() {
                            yield ChatEvent::Content { content: token };
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Fallback stream error");
                        yield ChatEvent::Error { error: e.to_string() };
                        return;
                    }
                }
            }
            yield ChatEvent::Done;
        })
    }
}
