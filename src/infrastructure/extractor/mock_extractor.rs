use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::application::ports::{
    ConnectivityStatus, DocumentExtractor, ExtractorError, ExtractorHealth,
};

/// Test double with a scripted queue of extraction results and a call
/// counter.
#[derive(Default)]
pub struct MockExtractor {
    results: Mutex<VecDeque<Result<String, ExtractorError>>>,
    calls: AtomicUsize,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&self, text: &str) {
        self.results.lock().unwrap().push_back(Ok(text.to_string()));
    }

    pub fn push_error(&self, error: ExtractorError) {
        self.results.lock().unwrap().push_back(Err(error));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentExtractor for MockExtractor {
    async fn extract(&self, _file_path: &str) -> Result<String, ExtractorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ExtractorError::RequestFailed("script exhausted".to_string())))
    }

    async fn health_check(&self) -> ExtractorHealth {
        ExtractorHealth {
            status: ConnectivityStatus::Connected,
            host: "mock".to_string(),
            error: None,
        }
    }
}
