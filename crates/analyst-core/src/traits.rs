use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Chunk, CollectionStats, EmbedIntent, GenerationParams, MetadataFilter, QueryResult};

/// Remote or local embedding backend.
#[async_trait]
pub trait EmbedProvider: Send + Sync {
    /// Stable model identifier, e.g. `models/text-embedding-004`.
    fn model_id(&self) -> &str;
    fn dim(&self) -> usize;
    async fn embed(&self, text: &str, intent: EmbedIntent) -> Result<Vec<f32>>;
}

/// Generative language model backend.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn model_id(&self) -> &str;
    async fn generate(&self, prompt: &str, params: GenerationParams) -> Result<String>;
}

/// Persistent collection of embedded chunks searched by cosine distance.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn add_documents(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<()>;
    async fn query(&self, embedding: &[f32], top_k: usize, filter: Option<&MetadataFilter>) -> Result<QueryResult>;
    async fn collection_stats(&self) -> Result<CollectionStats>;
    async fn clear_collection(&self) -> Result<()>;
}
