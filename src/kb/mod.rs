pub mod chunker;
pub mod seed;
pub mod service;
pub mod store;

pub use service::KnowledgeService;
pub use store::{DocumentChunk, DocumentStore, SearchResult, StoreStatus};
