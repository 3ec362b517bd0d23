use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use analyst_core::traits::VectorStore;
use analyst_core::types::{Chunk, ChunkMetadata, CollectionStats, MetadataFilter, QueryResult, ScoredRecord};
use analyst_core::{Error, Result};
use analyst_embed::cosine_similarity;

struct Record {
    id: String,
    document: String,
    metadata: ChunkMetadata,
    embedding: Vec<f32>,
}

/// In-process brute-force store with the same contract as the LanceDB one.
pub struct MemoryVectorStore {
    name: String,
    records: RwLock<Vec<Record>>,
}

impl MemoryVectorStore {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), records: RwLock::new(Vec::new()) }
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn add_documents(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<()> {
        if chunks.len() != embeddings.len() {
            return Err(Error::Validation(format!(
                "Number of chunks ({}) must match number of embeddings ({})",
                chunks.len(),
                embeddings.len()
            )));
        }
        let mut records = self.records.write().await;
        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            let id = if chunk.chunk_id.is_empty() { Uuid::new_v4().to_string() } else { chunk.chunk_id.clone() };
            let record = Record { id, document: chunk.text.clone(), metadata: chunk.metadata(), embedding: embedding.clone() };
            match records.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record,
                None => records.push(record),
            }
        }
        Ok(())
    }

    async fn query(&self, embedding: &[f32], top_k: usize, filter: Option<&MetadataFilter>) -> Result<QueryResult> {
        let records = self.records.read().await;
        let mut scored: Vec<ScoredRecord> = records
            .iter()
            .filter(|r| filter.is_none_or(|f| f.matches(&r.metadata)))
            .map(|r| ScoredRecord {
                id: r.id.clone(),
                document: r.document.clone(),
                metadata: r.metadata,
                distance: 1.0 - cosine_similarity(embedding, &r.embedding),
            })
            .collect();
        scored.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        scored.truncate(top_k);
        Ok(scored.into_iter().collect())
    }

    async fn collection_stats(&self) -> Result<CollectionStats> {
        Ok(CollectionStats {
            name: self.name.clone(),
            total_documents: self.records.read().await.len(),
            persist_directory: ":memory:".to_string(),
        })
    }

    async fn clear_collection(&self) -> Result<()> {
        self.records.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(i: usize, text: &str) -> Chunk {
        Chunk {
            text: text.to_string(),
            chunk_id: format!("chunk_{i}"),
            chunk_index: i,
            start_char: i * 10,
            end_char: i * 10 + text.len(),
            length: text.len(),
        }
    }

    #[tokio::test]
    async fn nearest_first_and_filtered() {
        let store = MemoryVectorStore::new("test");
        let chunks = vec![chunk(0, "a"), chunk(1, "b"), chunk(2, "c")];
        let embeddings = vec![vec![1.0, 0.0], vec![0.7, 0.7], vec![0.0, 1.0]];
        store.add_documents(&chunks, &embeddings).await.unwrap();

        let res = store.query(&[1.0, 0.0], 3, None).await.unwrap();
        assert_eq!(res.ids, vec!["chunk_0", "chunk_1", "chunk_2"]);
        assert!(res.distances[0].abs() < 1e-6);

        let only_two = MetadataFilter { chunk_index: Some(2), ..Default::default() };
        let res = store.query(&[1.0, 0.0], 3, Some(&only_two)).await.unwrap();
        assert_eq!(res.documents, vec!["c"]);
    }

    #[tokio::test]
    async fn upsert_replaces_by_id_and_generates_missing_ids() {
        let store = MemoryVectorStore::new("test");
        store.add_documents(&[chunk(0, "old")], &[vec![1.0, 0.0]]).await.unwrap();
        store.add_documents(&[chunk(0, "new")], &[vec![1.0, 0.0]]).await.unwrap();
        let mut anonymous = chunk(5, "anon");
        anonymous.chunk_id.clear();
        store.add_documents(&[anonymous], &[vec![0.0, 1.0]]).await.unwrap();

        assert_eq!(store.collection_stats().await.unwrap().total_documents, 2);
        let res = store.query(&[0.0, 1.0], 1, None).await.unwrap();
        assert_eq!(res.ids[0].len(), 36, "uuid v4 assigned");
        let res = store.query(&[1.0, 0.0], 1, None).await.unwrap();
        assert_eq!(res.documents, vec!["new"]);
    }

    #[tokio::test]
    async fn mismatched_lengths_are_rejected_without_writing() {
        let store = MemoryVectorStore::new("test");
        let err = store.add_documents(&[chunk(0, "a"), chunk(1, "b")], &[vec![1.0, 0.0]]).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(store.collection_stats().await.unwrap().total_documents, 0);
    }
}
