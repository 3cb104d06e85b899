use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde_json::{json, Value};

use crate::application::ports::{
    ConnectivityStatus, DocumentExtractor, ExtractorError, ExtractorHealth,
};

#[derive(Debug, Clone)]
pub struct DoclingConfig {
    pub url: String,
    /// Heavy OCR can be slow; default generously.
    pub timeout_seconds: u64,
}

/// Client for the Docling sidecar: ships the file as base64, gets back
/// markdown-like extracted text.
pub struct DoclingClient {
    client: Client,
    base_url: String,
}

impl DoclingClient {
    pub fn new(config: DoclingConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        }
    }
}

/// The sidecar has shipped the text under different keys across versions.
fn text_field(value: &Value) -> Option<String> {
    for key in ["md_content", "markdown", "output"] {
        if let Some(text) = value[key].as_str() {
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }
    }
    None
}

#[async_trait]
impl DocumentExtractor for DoclingClient {
    async fn extract(&self, file_path: &str) -> Result<String, ExtractorError> {
        let raw_bytes = tokio::fs::read(file_path)
            .await
            .map_err(|_| ExtractorError::FileNotFound(file_path.to_string()))?;

        let filename = Path::new(file_path)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file_path.to_string());

        let encoded = base64::engine::general_purpose::STANDARD.encode(&raw_bytes);
        let payload = json!({
            "sources": [{
                "kind": "base64",
                "data": encoded,
                "filename": filename,
            }],
        });

        tracing::info!(
            filename = %filename,
            bytes = raw_bytes.len(),
            "Sending document to Docling"
        );

        let response = self
            .client
            .post(format!("{}/v1/convert/source", self.base_url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| ExtractorError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractorError::RequestFailed(format!(
                "docling returned {}: {}",
                status, body
            )));
        }

        let parsed: Value = response
            .json()
            .await
            .map_err(|e| ExtractorError::InvalidResponse(e.to_string()))?;

        if let Some(text) = parsed["documents"].get(0).and_then(text_field) {
            tracing::info!(chars = text.len(), filename = %filename, "Docling extracted text");
            return Ok(text);
        }
        if let Some(text) = text_field(&parsed) {
            tracing::info!(
                chars = text.len(),
                filename = %filename,
                "Docling extracted text (top-level)"
            );
            return Ok(text);
        }

        Err(ExtractorError::NoExtractableText(filename))
    }

    async fn health_check(&self) -> ExtractorHealth {
        match self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => ExtractorHealth {
                status: ConnectivityStatus::Connected,
                host: self.base_url.clone(),
                error: None,
            },
            Ok(response) => ExtractorHealth {
                status: ConnectivityStatus::Error,
                host: self.base_url.clone(),
                error: Some(format!("docling returned {}", response.status())),
            },
            Err(e) if e.is_connect() => ExtractorHealth {
                status: ConnectivityStatus::Unreachable,
                host: self.base_url.clone(),
                error: None,
            },
            Err(e) => ExtractorHealth {
                status: ConnectivityStatus::Error,
                host: self.base_url.clone(),
                error: Some(e.to_string()),
            },
        }
    }
}
