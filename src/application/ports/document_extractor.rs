use async_trait::async_trait;

/// OCR/document-conversion boundary: turns a stored file into extracted
/// text (markdown-like plain text).
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract(&self, file_path: &str) -> Result<String, ExtractorError>;

    /// Reachability probe. Never fails; unreachability is a status.
    async fn health_check(&self) -> ExtractorHealth;
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractorError {
    /// Transport-level failure. The only retryable variant.
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("no extractable text in {0}")]
    NoExtractableText(String),
    #[error("file not found: {0}")]
    FileNotFound(String),
}

impl ExtractorError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ExtractorError::RequestFailed(_))
    }
}

#[derive(Debug, Clone)]
pub struct ExtractorHealth {
    pub status: super::ConnectivityStatus,
    pub host: String,
    pub error: Option<String>,
}
