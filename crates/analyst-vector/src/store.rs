use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow_array::types::Float32Type;
use arrow_array::{Array, FixedSizeListArray, Float32Array, Int64Array, RecordBatch, RecordBatchIterator, StringArray};
use async_trait::async_trait;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType, Table};
use tracing::{debug, info};
use uuid::Uuid;

use analyst_core::traits::VectorStore;
use analyst_core::types::{Chunk, ChunkMetadata, CollectionStats, MetadataFilter, QueryResult, ScoredRecord};
use analyst_core::{Error, Result};
use analyst_embed::check_dims;

use crate::schema::build_chunk_schema;
use crate::table::{ensure_table, open_db, store_err};

/// Chunk collection persisted as a LanceDB table, searched by cosine distance.
pub struct LanceVectorStore {
    db: Connection,
    collection: String,
    persist_directory: PathBuf,
    dim: usize,
}

impl LanceVectorStore {
    pub async fn open(persist_directory: &Path, collection: &str, dim: usize) -> Result<Self> {
        std::fs::create_dir_all(persist_directory)?;
        let db = open_db(&persist_directory.to_string_lossy()).await?;
        if ensure_table(&db, collection, build_chunk_schema(dim)).await? {
            info!(collection, path = %persist_directory.display(), "created vector collection");
        }
        Ok(Self {
            db,
            collection: collection.to_string(),
            persist_directory: persist_directory.to_path_buf(),
            dim,
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    async fn table(&self) -> Result<Table> {
        self.db
            .open_table(&self.collection)
            .execute()
            .await
            .map_err(store_err("Failed to open collection"))
    }

    fn to_record_batch(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<RecordBatch> {
        let mut ids = Vec::with_capacity(chunks.len());
        let mut documents = Vec::with_capacity(chunks.len());
        let (mut chunk_index, mut start_char, mut end_char, mut length) = (Vec::new(), Vec::new(), Vec::new(), Vec::new());
        for chunk in chunks {
            ids.push(if chunk.chunk_id.is_empty() { Uuid::new_v4().to_string() } else { chunk.chunk_id.clone() });
            documents.push(chunk.text.clone());
            chunk_index.push(to_i64(chunk.chunk_index)?);
            start_char.push(to_i64(chunk.start_char)?);
            end_char.push(to_i64(chunk.end_char)?);
            length.push(to_i64(chunk.length)?);
        }
        let vectors = embeddings.iter().map(|v| Some(v.iter().copied().map(Some).collect::<Vec<_>>()));
        RecordBatch::try_new(
            build_chunk_schema(self.dim),
            vec![
                Arc::new(StringArray::from(ids)),
                Arc::new(StringArray::from(documents)),
                Arc::new(Int64Array::from(chunk_index)),
                Arc::new(Int64Array::from(start_char)),
                Arc::new(Int64Array::from(end_char)),
                Arc::new(Int64Array::from(length)),
                Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(vectors, self.dim as i32)),
            ],
        )
        .map_err(store_err("Failed to build record batch"))
    }
}

#[async_trait]
impl VectorStore for LanceVectorStore {
    async fn add_documents(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<()> {
        if chunks.len() != embeddings.len() {
            return Err(Error::Validation(format!(
                "Number of chunks ({}) must match number of embeddings ({})",
                chunks.len(),
                embeddings.len()
            )));
        }
        if chunks.is_empty() {
            return Ok(());
        }
        check_dims(embeddings, self.dim)?;

        let batch = self.to_record_batch(chunks, embeddings)?;
        let schema = batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
        let table = self.table().await?;
        // Upsert keyed by chunk id
        let mut mi = table.merge_insert(&["id"]);
        mi.when_matched_update_all(None).when_not_matched_insert_all();
        mi.execute(reader).await.map_err(store_err("Failed to upsert chunks"))?;
        info!(collection = %self.collection, count = chunks.len(), "added documents to vector store");
        Ok(())
    }

    async fn query(&self, embedding: &[f32], top_k: usize, filter: Option<&MetadataFilter>) -> Result<QueryResult> {
        let table = self.table().await?;
        let total = table.count_rows(None).await.map_err(store_err("Failed to count rows"))?;
        if total == 0 || top_k == 0 {
            return Ok(QueryResult::default());
        }
        if embedding.len() != self.dim {
            return Err(Error::Validation(format!(
                "query embedding has dimension {} (expected {})",
                embedding.len(),
                self.dim
            )));
        }

        let mut query = table
            .vector_search(embedding.to_vec())
            .map_err(store_err("Failed to build vector query"))?
            .distance_type(DistanceType::Cosine)
            .limit(top_k);
        if let Some(f) = filter.filter(|f| !f.is_empty()) {
            query = query.only_if(render_filter(f));
        }

        let mut stream = query.execute().await.map_err(store_err("Vector search failed"))?;
        let mut records = Vec::new();
        while let Some(batch) = futures::TryStreamExt::try_next(&mut stream)
            .await
            .map_err(store_err("Failed to read search results"))?
        {
            records.extend(batch_to_records(&batch)?);
        }
        records.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        records.truncate(top_k);
        debug!(collection = %self.collection, hits = records.len(), top_k, "vector query");
        Ok(records.into_iter().collect())
    }

    async fn collection_stats(&self) -> Result<CollectionStats> {
        let table = self.table().await?;
        let total = table.count_rows(None).await.map_err(store_err("Failed to count rows"))?;
        Ok(CollectionStats {
            name: self.collection.clone(),
            total_documents: total,
            persist_directory: self.persist_directory.display().to_string(),
        })
    }

    async fn clear_collection(&self) -> Result<()> {
        let table = self.table().await?;
        table.delete("id IS NOT NULL").await.map_err(store_err("Failed to clear collection"))?;
        info!(collection = %self.collection, "cleared vector collection");
        Ok(())
    }
}

fn to_i64(v: usize) -> Result<i64> {
    i64::try_from(v).map_err(|_| Error::Validation(format!("offset {v} does not fit in i64")))
}

fn render_filter(filter: &MetadataFilter) -> String {
    filter
        .clauses()
        .into_iter()
        .map(|(col, v)| format!("{col} = {v}"))
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| Error::Store(format!("column '{name}' missing from search results")))
}

fn int_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int64Array> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<Int64Array>())
        .ok_or_else(|| Error::Store(format!("column '{name}' missing from search results")))
}

fn batch_to_records(batch: &RecordBatch) -> Result<Vec<ScoredRecord>> {
    let ids = string_column(batch, "id")?;
    let documents = string_column(batch, "document")?;
    let chunk_index = int_column(batch, "chunk_index")?;
    let start_char = int_column(batch, "start_char")?;
    let end_char = int_column(batch, "end_char")?;
    let length = int_column(batch, "length")?;
    let distances = batch
        .column_by_name("_distance")
        .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
        .ok_or_else(|| Error::Store("column '_distance' missing from search results".into()))?;

    let as_usize = |v: i64| usize::try_from(v).unwrap_or_default();
    Ok((0..batch.num_rows())
        .map(|i| ScoredRecord {
            id: ids.value(i).to_string(),
            document: documents.value(i).to_string(),
            metadata: ChunkMetadata {
                chunk_index: as_usize(chunk_index.value(i)),
                start_char: as_usize(start_char.value(i)),
                end_char: as_usize(end_char.value(i)),
                length: as_usize(length.value(i)),
            },
            distance: distances.value(i),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_renders_as_sql_conjunction() {
        let f = MetadataFilter { chunk_index: Some(3), length: Some(120), ..Default::default() };
        assert_eq!(render_filter(&f), "chunk_index = 3 AND length = 120");
    }
}
