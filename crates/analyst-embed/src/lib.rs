//! Embedding providers behind the shared `Embedder` handle: the Gemini REST
//! client used by the generation side too, and a deterministic offline fake.

#![deny(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use analyst_core::config::GeminiSettings;
use analyst_core::traits::EmbedProvider;
use analyst_core::types::EmbedIntent;
use analyst_core::{Error, Result};

pub mod gemini;

pub use gemini::{GeminiClient, GeminiEmbedder};

/// Output dimensionality of `text-embedding-004`.
pub const EMBEDDING_DIM: usize = 768;

/// Upper bound on texts embedded per group; keeps bursts under the service rate limit.
pub const EMBED_BATCH_LIMIT: usize = 100;

/// Document/query embedding facade over an [`EmbedProvider`].
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn EmbedProvider>,
}

impl Embedder {
    pub fn new(provider: Arc<dyn EmbedProvider>) -> Self {
        Self { provider }
    }

    pub fn model_id(&self) -> &str {
        self.provider.model_id()
    }

    pub fn dim(&self) -> usize {
        self.provider.dim()
    }

    pub async fn embed_document(&self, text: &str) -> Result<Vec<f32>> {
        self.provider.embed(text, EmbedIntent::Document).await
    }

    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.provider.embed(text, EmbedIntent::Query).await
    }

    /// Embed texts as documents, one provider call per text, in groups of at most
    /// [`EMBED_BATCH_LIMIT`]. Output order matches input order; the first failure aborts.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for (group_idx, group) in texts.chunks(EMBED_BATCH_LIMIT).enumerate() {
            debug!(group = group_idx, size = group.len(), "embedding group");
            for text in group {
                out.push(self.embed_document(text).await?);
            }
        }
        Ok(out)
    }
}

/// Deterministic hashing embedder for offline runs and tests.
pub struct FakeEmbedder {
    dim: usize,
}

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher};
        use twox_hash::XxHash64;
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

#[async_trait]
impl EmbedProvider for FakeEmbedder {
    fn model_id(&self) -> &str {
        "fake:xxhash64"
    }

    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed(&self, text: &str, _intent: EmbedIntent) -> Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }
}

/// True when `APP_USE_FAKE_EMBEDDINGS` is `1` or `true`.
pub fn fake_embeddings_requested() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Gemini embedder, or the fake one when `APP_USE_FAKE_EMBEDDINGS` is set.
pub fn get_default_embedder(settings: &GeminiSettings) -> Result<Embedder> {
    if fake_embeddings_requested() {
        info!("using FakeEmbedder");
        return Ok(Embedder::new(Arc::new(FakeEmbedder::new(EMBEDDING_DIM))));
    }
    let gemini = GeminiEmbedder::new(settings)?;
    info!(model = gemini.model_id(), "using Gemini embeddings");
    Ok(Embedder::new(Arc::new(gemini)))
}

/// Cosine similarity in `[-1, 1]`; `0.0` when either vector has zero magnitude
/// or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut na, mut nb) = (0f64, 0f64, 0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    (dot / (na.sqrt() * nb.sqrt())).clamp(-1.0, 1.0) as f32
}

/// Validate that every vector has the expected dimensionality.
pub fn check_dims(embeddings: &[Vec<f32>], dim: usize) -> Result<()> {
    match embeddings.iter().position(|e| e.len() != dim) {
        Some(i) => Err(Error::Validation(format!(
            "embedding {i} has dimension {} (expected {dim})",
            embeddings[i].len()
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_vector_with_itself_is_one() {
        let v = [0.3f32, -1.2, 4.5, 0.0, 2.2];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_with_zero_vector_is_zero() {
        let zero = [0f32; 4];
        let v = [1f32, 2.0, 3.0, 4.0];
        assert_eq!(cosine_similarity(&zero, &v), 0.0);
        assert_eq!(cosine_similarity(&v, &zero), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
    }

    #[test]
    fn cosine_of_opposite_and_orthogonal_vectors() {
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 3.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn check_dims_reports_offending_index() {
        let ok = vec![vec![0.0; 3], vec![1.0; 3]];
        assert!(check_dims(&ok, 3).is_ok());
        let bad = vec![vec![0.0; 3], vec![1.0; 2]];
        let err = check_dims(&bad, 3).unwrap_err();
        assert!(err.to_string().contains("embedding 1"));
    }
}
