use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use analyst_core::traits::TextGenerator;
use analyst_core::types::{ChunkMetadata, GenerationParams};
use analyst_core::Result;

/// Phrases that mark an answer as a non-answer.
pub const UNCERTAINTY_PHRASES: [&str; 6] = [
    "i don't have",
    "insufficient information",
    "not mentioned",
    "unclear",
    "cannot determine",
    "not specified",
];

pub const QA_MAX_OUTPUT_TOKENS: u32 = 512;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QaAnswer {
    pub answer: String,
    pub sources: Vec<String>,
    pub source_metadata: Vec<ChunkMetadata>,
    pub confidence: f32,
}

impl QaAnswer {
    /// Explicit answer for a retrieval that found nothing.
    pub fn no_information() -> Self {
        Self {
            answer: "No relevant information found".to_string(),
            sources: Vec::new(),
            source_metadata: Vec::new(),
            confidence: 0.0,
        }
    }
}

/// Grounded question answering over retrieved chunks.
pub struct QaAgent {
    generator: Arc<dyn TextGenerator>,
    temperature: f32,
}

impl QaAgent {
    pub fn new(generator: Arc<dyn TextGenerator>, temperature: f32) -> Self {
        Self { generator, temperature }
    }

    pub async fn answer(&self, question: &str, context_chunks: &[String], metadata: Option<&[ChunkMetadata]>) -> Result<QaAnswer> {
        let prompt = build_prompt(question, context_chunks);
        let answer = self
            .generator
            .generate(&prompt, GenerationParams::new(self.temperature, QA_MAX_OUTPUT_TOKENS))
            .await?;
        let confidence = estimate_confidence(&answer);
        debug!(sources = context_chunks.len(), confidence, "answered question");
        Ok(QaAnswer {
            answer,
            sources: context_chunks.to_vec(),
            source_metadata: metadata.map(<[ChunkMetadata]>::to_vec).unwrap_or_default(),
            confidence,
        })
    }
}

/// `[Source N]` blocks, 1-based, separated by blank lines.
pub fn build_context(chunks: &[String]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("[Source {}]\n{chunk}\n", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_prompt(question: &str, chunks: &[String]) -> String {
    let context = build_context(chunks);
    format!(
        "You are a helpful AI assistant answering questions about a market research document.

Answer the question based ONLY on the provided context below.
If the information is not in the context, say \"I don't have sufficient information to answer this question.\"
Cite sources in your answer using [Source N] notation.
Be concise but comprehensive.

Context:
{context}

Question: {question}

Answer:"
    )
}

/// Heuristic confidence for an answer. Uncertainty phrases win over citations.
pub fn estimate_confidence(answer: &str) -> f32 {
    let lower = answer.to_lowercase();
    if UNCERTAINTY_PHRASES.iter().any(|p| lower.contains(p)) {
        return 0.0;
    }
    let len = answer.chars().count();
    if lower.contains("[source") && len > 50 {
        0.85
    } else if len > 30 {
        0.70
    } else {
        0.50
    }
}
