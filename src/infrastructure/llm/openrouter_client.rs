use std::time::Duration;

use async_trait::async_trait;
use futures::stream::StreamExt;
use reqwest::Client;
use serde_json::{json, Value};

use crate::application::ports::{
    AssistantTurn, ConnectivityStatus, ProviderClient, ProviderError, ProviderHealth,
    ProviderMessage, TokenStream, ToolCallRequest, WireRole,
};
use crate::application::tools::ToolDefinition;

#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_seconds: u64,
}

/// Hosted-gateway adapter speaking the OpenAI-style `/chat/completions`
/// protocol with SSE streaming. Tool results are fed back tagged with the
/// originating tool-call id; tool-call arguments may arrive as a
/// JSON-encoded string and are decoded leniently.
pub struct OpenRouterClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenRouterClient {
    pub fn new(config: OpenRouterConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            model: config.model,
        }
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("HTTP-Referer", "http://localhost:3000")
            .header("X-Title", "Meridian")
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
                        "id": call.id.clone().unwrap_or_default(),
                        "type": "function",
                        "function": {
                            "name": call.name,
                            "arguments": call.arguments.to_string(),
                        },
                    })
                })
                .collect(),
        );
    }
    if message.role == WireRole::Tool {
        wire["tool_call_id"] = json!(message.tool_call_id.clone().unwrap_or_default());
    }
    wire
}

/// Gateway models return arguments either as an object or as an encoded
/// string; anything unparseable becomes an empty object.
fn decode_arguments(raw: &Value) -> Value {
    match raw {
        Value::String(s) => serde_json::from_str(s).unwrap_or_else(|_| {
            tracing::warn!(raw = %s, "Could not parse tool arguments");
            json!({})
        }),
        Value::Object(_) => raw.clone(),
        _ => json!({}),
    }
}

#[async_trait]
impl ProviderClient for OpenRouterClient {
    async fn chat_once(
        &self,
        messages: &[ProviderMessage],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<AssistantTurn, ProviderError> {
        let payload = self.build_payload(messages, tools, false);

        let response = self
            .request("/chat/completions")
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::RequestFailed(format!(
                "openrouter returned {}: {}",
                status, body
            )));
        }

        let parsed: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let choice = parsed["choices"]
            .get(0)
            .ok_or_else(|| ProviderError::InvalidResponse("empty choices".to_string()))?;
        let message = &choice["message"];
        let finish_reason = choice["finish_reason"].as_str().unwrap_or("stop");

        let tool_calls = if finish_reason == "tool_calls" {
            message["tool_calls"]
                .as_array()
                .map(|calls| {
                    calls
                        .iter()
                        .map(|call| ToolCallRequest {
                            id: call["id"].as_str().map(String::from),
                            name: call["function"]["name"].as_str().unwrap_or("").to_string(),
                            arguments: decode_arguments(&call["function"]["arguments"]),
                        })
                        .collect()
                })
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        Ok(AssistantTurn {
            content: message["content"].as_str().unwrap_or("").to_string(),
            tool_calls,
        })
    }

    async fn chat_stream(
        &self,
        messages: &[ProviderMessage],
    ) -> Result<TokenStream, ProviderError> {
        let payload = self.build_payload(messages, None, true);

        let response = self
            .request("/chat/completions")
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::RequestFailed(format!(
                "openrouter returned {}: {}",
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

                while let Some(newline) = buffer.find('\n') {
                    let line = buffer[..newline].trim().to_string();
                    buffer = buffer[newline + 1..].to_string();

                    let Some(data) = line.strip_prefix("data: ") else {
                        continue;
                    };
                    if data == "[DONE]" {
                        return;
                    }

                    match serde_json::from_str::<Value>(data) {
                        Ok(parsed) => {
                            let content =
                                parsed["choices"][0]["delta"]["content"].as_str().unwrap_or("");
                            if !content.is_empty() {
                                yield Ok(content.to_string());
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to parse SSE chunk");
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
            .get(format!("{}/models", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => ProviderHealth {
                status: ConnectivityStatus::Connected,
                host: self.base_url.clone(),
                chat_model: Some(self.model.clone()),
                available_models: Vec::new(),
                error: None,
            },
            Ok(response) => ProviderHealth {
                status: ConnectivityStatus::Error,
                host: self.base_url.clone(),
                chat_model: Some(self.model.clone()),
                available_models: Vec::new(),
                error: Some(format!("openrouter returned {}", response.status())),
            },
            Err(e) if e.is_connect() => ProviderHealth {
                status: ConnectivityStatus::Unreachable,
                host: self.base_url.clone(),
                chat_model: Some(self.model.clone()),
                available_models: Vec::new(),
                error: Some(format!("Cannot connect to OpenRouter at {}", self.base_url)),
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
