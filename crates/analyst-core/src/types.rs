//! Domain types shared by the chunker, the vector stores and the agents.

use serde::{Deserialize, Serialize};

pub type ChunkId = String;

/// A contiguous, offset-tagged substring of the source document.
///
/// - `chunk_id`: `chunk_{index}` for chunker output; may be empty for
///   externally built chunks, in which case the store assigns a UUID
/// - `chunk_index`: 0-based position in document order
/// - `start_char`/`end_char`: character offsets into the document,
///   `end_char - start_char == length`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub text: String,
    pub chunk_id: ChunkId,
    pub chunk_index: usize,
    pub start_char: usize,
    pub end_char: usize,
    pub length: usize,
}

impl Chunk {
    pub fn metadata(&self) -> ChunkMetadata {
        ChunkMetadata {
            chunk_index: self.chunk_index,
            start_char: self.start_char,
            end_char: self.end_char,
            length: self.length,
        }
    }
}

/// Offset metadata stored next to each indexed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkMetadata {
    pub chunk_index: usize,
    pub start_char: usize,
    pub end_char: usize,
    pub length: usize,
}

/// Equality filter over the integer metadata fields.
///
/// Every field that is set must match; an empty filter matches everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataFilter {
    pub chunk_index: Option<usize>,
    pub start_char: Option<usize>,
    pub end_char: Option<usize>,
    pub length: Option<usize>,
}

impl MetadataFilter {
    pub fn is_empty(&self) -> bool {
        self.clauses().is_empty()
    }

    pub fn matches(&self, meta: &ChunkMetadata) -> bool {
        self.chunk_index.is_none_or(|v| v == meta.chunk_index)
            && self.start_char.is_none_or(|v| v == meta.start_char)
            && self.end_char.is_none_or(|v| v == meta.end_char)
            && self.length.is_none_or(|v| v == meta.length)
    }

    /// `(column, value)` pairs for every field that is set.
    pub fn clauses(&self) -> Vec<(&'static str, usize)> {
        [
            ("chunk_index", self.chunk_index),
            ("start_char", self.start_char),
            ("end_char", self.end_char),
            ("length", self.length),
        ]
        .into_iter()
        .filter_map(|(col, v)| v.map(|v| (col, v)))
        .collect()
    }
}

/// Parallel sequences returned by a nearest-neighbour query, most similar first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub documents: Vec<String>,
    pub metadatas: Vec<ChunkMetadata>,
    pub distances: Vec<f32>,
    pub ids: Vec<ChunkId>,
}

impl QueryResult {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub(crate) fn push(&mut self, id: ChunkId, document: String, metadata: ChunkMetadata, distance: f32) {
        self.ids.push(id);
        self.documents.push(document);
        self.metadatas.push(metadata);
        self.distances.push(distance);
    }
}

/// A single scored record; stores collect these before building a `QueryResult`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub id: ChunkId,
    pub document: String,
    pub metadata: ChunkMetadata,
    pub distance: f32,
}

impl FromIterator<ScoredRecord> for QueryResult {
    fn from_iter<I: IntoIterator<Item = ScoredRecord>>(iter: I) -> Self {
        let mut out = QueryResult::default();
        for r in iter {
            out.push(r.id, r.document, r.metadata, r.distance);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStats {
    pub name: String,
    pub total_documents: usize,
    pub persist_directory: String,
}

/// Retrieval intent passed to the embedding service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmbedIntent {
    Document,
    Query,
}

impl EmbedIntent {
    pub fn task_type(self) -> &'static str {
        match self {
            Self::Document => "RETRIEVAL_DOCUMENT",
            Self::Query => "RETRIEVAL_QUERY",
        }
    }
}

/// Sampling parameters for a single generation call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl GenerationParams {
    pub fn new(temperature: f32, max_output_tokens: u32) -> Self {
        Self { temperature, max_output_tokens }
    }
}
