mod docling_client;
mod mock_extractor;

pub use docling_client::{DoclingClient, DoclingConfig};
pub use mock_extractor::MockExtractor;
