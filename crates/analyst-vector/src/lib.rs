//! Vector storage for report chunks: the on-disk LanceDB collection, an
//! in-memory store for tests and the chunk-embed-store indexing pipeline.

#![deny(dead_code)]

pub mod memory;
pub mod pipeline;
pub mod schema;
pub mod store;
pub mod table;

pub use memory::MemoryVectorStore;
pub use pipeline::{index_document, index_if_empty, IndexReport};
pub use store::LanceVectorStore;

/// Default collection name.
pub const DEFAULT_COLLECTION: &str = "market_research";
