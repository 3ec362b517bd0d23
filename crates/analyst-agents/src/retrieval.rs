use std::sync::Arc;

use tracing::debug;

use analyst_core::traits::VectorStore;
use analyst_core::types::{MetadataFilter, QueryResult};
use analyst_core::Result;
use analyst_embed::Embedder;

/// Dense retrieval: embed the query with query intent, then ask the store for neighbours.
#[derive(Clone)]
pub struct Retriever {
    embedder: Embedder,
    store: Arc<dyn VectorStore>,
}

impl Retriever {
    pub fn new(embedder: Embedder, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }

    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<QueryResult> {
        self.retrieve_filtered(query, top_k, None).await
    }

    pub async fn retrieve_filtered(&self, query: &str, top_k: usize, filter: Option<&MetadataFilter>) -> Result<QueryResult> {
        let q_vec = self.embedder.embed_query(query).await?;
        let hits = self.store.query(&q_vec, top_k, filter).await?;
        debug!(top_k, hits = hits.len(), "retrieved context");
        Ok(hits)
    }
}
