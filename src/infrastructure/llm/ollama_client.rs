use std::time::Duration;

use async_trait::async_trait;
use futures::stream::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::application::ports::{
    AssistantTurn, ConnectivityStatus, ProviderClient, ProviderError, ProviderHealth,
    ProviderMessage, TokenStream, ToolCallRequest, WireRole,
};
use crate::application::tools::ToolDefinition;

#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub host: String,
    pub model: String,
    pub timeout_seconds: u64,
    /// Ask the backend for a single JSON object instead of free text. Set on
    /// the extraction-pipeline instance.
    pub json_format: bool,
}

/// Local-model adapter speaking the Ollama chat protocol: plain JSON in,
/// `{message, done}` out, newline-delimited JSON when streaming. Tool
/// results are fed back as plain `role:"tool"` messages without an id.
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    json_format: bool,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: config.host.trim_end_matches('/').to_string(),
            model: config.model,
            json_format: config.json_format,
        }
    }

    fn build_payload(
        &self,
        messages: &[ProviderMessage],
        tools: Option<&[ToolDefinition]>,
        stream: bool,
    ) -> Value {
        let messages: Vec<Value> = messages.iter().map(wire_message).collect();
        let mut payload = json!({
            "model": self.model,
            "messages": messages,
            "stream": stream,
        });
        if let Some(tools) = tools {
            payload["tools"] = Value::Array(tools.iter().map(|t| t.to_wire()).collect());
        }
        if self.json_format {
            payload["format"] = json!("json");
        }
        payload
    }
}

fn wire_message(message: &ProviderMessage) -> Value {
    let mut wire = json!({
        "role": message.role.as_str(),
        "content": message.content,
    });
    if message.role == WireRole::Assistant && !message.tool_calls.is_empty() {
        wire["tool_calls"] = Value::Array(
            message
                .tool_calls
                .iter()
                .map(|call| {
                    json!({
                        "function": {
                            "name": call.name,
                            "arguments": call.arguments,
                        },
                    })
                })
                .collect(),
        );
    }
    wire
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: ResponseMessage,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    tool_calls: Vec<ResponseToolCall>,
}

#[derive(Debug, Deserialize)]
struct ResponseToolCall {
    function: ResponseFunction,
}

#[derive(Debug, Deserialize)]
struct ResponseFunction {
    #[serde(default)]
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[async_trait]
impl ProviderClient for OllamaClient {
    async fn chat_once(
        &self,
        messages: &[ProviderMessage],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<AssistantTurn, ProviderError> {
        let payload = self.build_payload(messages, tools, false);

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::RequestFailed(format!(
                "ollama returned {}: {}",
                status, body
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Ok(AssistantTurn {
            content: parsed.message.content,
            tool_calls: parsed
                .message
                .tool_calls
                .into_iter()
                .map(|call| ToolCallRequest {
                    id: None,
                    name: call.function.name,
                    arguments: call.function.arguments,
                })
                .collect(),
        })
    }

    async fn chat_stream(
        &self,
        messages: &[ProviderMessage],
    ) -> Result<TokenStream, ProviderError> {
        let payload = self.build_payload(messages, None, true);

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::RequestFailed(format!(
                "ollama returned {}: {}",
                status, body
            )));
        }

        let stream = async_stream::stream! {
            let mut bytes = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(ProviderError::RequestFailed(e.to_string()));
                        return;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                // Drain complete NDJSON lines; partial lines wait for the
                // next chunk.
                while let Some(newline) = buffer.find('\n') {
                    let line = buffer[..newline].trim().to_string();
                    buffer = buffer[newline + 1..].to_string();
                    if line.is_empty() {
                        continue;
                    }

                    match serde_json::from_str::<Value>(&line) {
                        Ok(parsed) => {
                            let content = parsed["message"]["content"].as_str().unwrap_or("");
                            if !content.is_empty() {
                                yield Ok(content.to_string());
                            }
                            if parsed["done"].as_bool().unwrap_or(false) {
                                return;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to parse ollama stream chunk");
                        }
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }

    async fn health_check(&self) -> ProviderHealth {
        match self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                let models = match response.json::<Value>().await {
                    Ok(parsed) => parsed["models"]
                        .as_array()
                        .map(|models| {
                            models
                                .iter()
                                .filter_map(|m| m["name"].as_str().map(String::from))
                                .collect()
                        })
                        .unwrap_or_default(),
                    Err(_) => Vec::new(),
                };
                ProviderHealth {
                    status: ConnectivityStatus::Connected,
                    host: self.base_url.clone(),
                    chat_model: Some(self.model.clone()),
                    available_models: models,
                    error: None,
                }
            }
            Ok(response) => ProviderHealth {
                status: ConnectivityStatus::Error,
                host: self.base_url.clone(),
                chat_model: Some(self.model.clone()),
                available_models: Vec::new(),
                error: Some(format!("ollama returned {}", response.status())),
            },
            Err(e) if e.is_connect() => ProviderHealth {
                status: ConnectivityStatus::Unreachable,
                host: self.base_url.clone(),
                chat_model: Some(self.model.clone()),
                available_models: Vec::new(),
                error: Some(format!("Cannot connect to Ollama at {}", self.base_url)),
            },
            Err(e) => ProviderHealth {
                status: ConnectivityStatus::Error,
                host: self.base_url.clone(),
                chat_model: Some(self.model.clone()),
                available_models: Vec::new(),
                error: Some(e.to_string()),
            },
        }
    }
}
