use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use analyst_core::chunker::{ChunkStatistics, Chunker};
use analyst_core::traits::VectorStore;
use analyst_core::Result;
use analyst_embed::{Embedder, EMBED_BATCH_LIMIT};

/// Outcome of one indexing run.
#[derive(Debug, Clone)]
pub struct IndexReport {
    pub chunks: usize,
    pub statistics: ChunkStatistics,
}

/// Chunk `text`, embed every chunk as a document and upsert the result into `store`.
pub async fn index_document(
    text: &str,
    chunker: &Chunker,
    embedder: &Embedder,
    store: &dyn VectorStore,
) -> Result<IndexReport> {
    let chunks = chunker.chunk(text);
    let statistics = chunker.statistics(&chunks);
    if chunks.is_empty() {
        warn!("document produced no chunks; nothing to index");
        return Ok(IndexReport { chunks: 0, statistics });
    }

    info!(chunks = chunks.len(), model = embedder.model_id(), "embedding chunks");
    let pb = ProgressBar::new(chunks.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    let mut embeddings = Vec::with_capacity(chunks.len());
    for group in chunks.chunks(EMBED_BATCH_LIMIT) {
        let texts: Vec<String> = group.iter().map(|c| c.text.clone()).collect();
        embeddings.extend(embedder.embed_batch(&texts).await?);
        pb.inc(group.len() as u64);
    }
    pb.finish_and_clear();

    store.add_documents(&chunks, &embeddings).await?;
    info!(chunks = chunks.len(), avg_chunk_size = statistics.avg_chunk_size, "indexed document");
    Ok(IndexReport { chunks: chunks.len(), statistics })
}

/// Index only when the store is empty. Returns `None` when indexing was skipped.
pub async fn index_if_empty(
    text: &str,
    chunker: &Chunker,
    embedder: &Embedder,
    store: &dyn VectorStore,
) -> Result<Option<IndexReport>> {
    let stats = store.collection_stats().await?;
    if stats.total_documents > 0 {
        info!(collection = %stats.name, total = stats.total_documents, "vector store already populated, skipping indexing");
        return Ok(None);
    }
    index_document(text, chunker, embedder, store).await.map(Some)
}
