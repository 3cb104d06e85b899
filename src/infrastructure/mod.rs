pub mod extractor;
pub mod llm;
pub mod observability;
pub mod persistence;
