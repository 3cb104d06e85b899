mod memory;

pub use memory::{
    InMemoryChatStore, InMemoryDocumentStore, InMemoryHealthDataStore, InMemoryLabStore,
};
