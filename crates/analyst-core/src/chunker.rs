//! Recursive character chunker.
//!
//! Text is split on the highest-priority separator it contains (paragraph,
//! line, sentence, clause, word, character). Pieces shorter than `chunk_size`
//! are merged greedily; longer pieces are split again with the remaining
//! separators. Each emitted chunk keeps up to `overlap` characters of the
//! previous one. Lengths and offsets are counted in characters, not bytes.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ChunkingSettings;
use crate::error::{Error, Result};
use crate::types::Chunk;

const SEPARATORS: [&str; 6] = ["\n\n", "\n", ". ", ", ", " ", ""];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkStatistics {
    pub total_chunks: usize,
    pub avg_chunk_size: f64,
    pub min_chunk_size: usize,
    pub max_chunk_size: usize,
    pub total_characters: usize,
    pub overlap_ratio: f64,
}

impl Chunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 || chunk_size <= overlap {
            return Err(Error::Validation(format!(
                "chunk_size ({chunk_size}) must be greater than overlap ({overlap})"
            )));
        }
        Ok(Self { chunk_size, overlap })
    }

    pub fn from_settings(settings: &ChunkingSettings) -> Result<Self> {
        Self::new(settings.chunk_size, settings.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        let mut pieces = Vec::new();
        self.split_text(text, &SEPARATORS, &mut pieces);

        let mut chunks = Vec::with_capacity(pieces.len());
        let mut cursor = 0usize;
        for (idx, piece) in pieces.into_iter().enumerate() {
            let length = char_len(&piece);
            // Search forward from the cursor first, then from the start of the text (which can land on an
            // earlier repeat), and fall back to the cursor itself.
            let start = find_from(text, &piece, cursor)
                .or_else(|| find_from(text, &piece, 0))
                .unwrap_or(cursor);
            cursor = (start + length).saturating_sub(self.overlap);
            chunks.push(Chunk {
                chunk_id: format!("chunk_{idx}"),
                chunk_index: idx,
                start_char: start,
                end_char: start + length,
                length,
                text: piece,
            });
        }
        debug!(chunks = chunks.len(), chunk_size = self.chunk_size, overlap = self.overlap, "chunked document");
        chunks
    }

    pub fn statistics(&self, chunks: &[Chunk]) -> ChunkStatistics {
        let overlap_ratio = self.overlap as f64 / self.chunk_size as f64;
        if chunks.is_empty() {
            return ChunkStatistics {
                total_chunks: 0,
                avg_chunk_size: 0.0,
                min_chunk_size: 0,
                max_chunk_size: 0,
                total_characters: 0,
                overlap_ratio,
            };
        }
        let total_characters: usize = chunks.iter().map(|c| c.length).sum();
        ChunkStatistics {
            total_chunks: chunks.len(),
            avg_chunk_size: total_characters as f64 / chunks.len() as f64,
            min_chunk_size: chunks.iter().map(|c| c.length).min().unwrap_or(0),
            max_chunk_size: chunks.iter().map(|c| c.length).max().unwrap_or(0),
            total_characters,
            overlap_ratio,
        }
    }

    fn split_text(&self, text: &str, separators: &[&str], out: &mut Vec<String>) {
        let (separator, remaining) = pick_separator(text, separators);
        let mut good: Vec<&str> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.chunk_size {
                good.push(piece);
                continue;
            }
            if !good.is_empty() {
                self.merge_pieces(&good, out);
                good.clear();
            }
            if remaining.is_empty() {
                out.push(piece.to_string());
            } else {
                self.split_text(piece, remaining, out);
            }
        }
        if !good.is_empty() {
            self.merge_pieces(&good, out);
        }
    }

    fn merge_pieces(&self, pieces: &[&str], out: &mut Vec<String>) {
        let mut window: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0usize;
        for &piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size {
                if total > self.chunk_size {
                    warn!(total, chunk_size = self.chunk_size, "created a chunk longer than chunk_size");
                }
                if !window.is_empty() {
                    push_joined(&window, out);
                    while total > self.overlap || (total + len > self.chunk_size && total > 0) {
                        let Some((_, dropped)) = window.pop_front() else { break };
                        total -= dropped;
                    }
                }
            }
            window.push_back((piece, len));
            total += len;
        }
        push_joined(&window, out);
    }
}

fn push_joined(window: &VecDeque<(&str, usize)>, out: &mut Vec<String>) {
    let joined: String = window.iter().map(|(p, _)| *p).collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

fn pick_separator<'s>(text: &str, separators: &'s [&'s str]) -> (&'s str, &'s [&'s str]) {
    for (i, sep) in separators.iter().enumerate() {
        if sep.is_empty() {
            return ("", &[]);
        }
        if text.contains(sep) {
            return (sep, &separators[i + 1..]);
        }
    }
    ("", &[])
}

/// Split on `sep`, attaching each separator to the start of the following piece.
fn split_keeping_separator<'a>(text: &'a str, sep: &str) -> Vec<&'a str> {
    if sep.is_empty() {
        return text.char_indices().map(|(i, c)| &text[i..i + c.len_utf8()]).collect();
    }
    let mut pieces = Vec::new();
    let mut last = 0;
    for (idx, _) in text.match_indices(sep) {
        if idx > last {
            pieces.push(&text[last..idx]);
        }
        last = idx;
    }
    if last < text.len() {
        pieces.push(&text[last..]);
    }
    pieces
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Character index of `needle` in `haystack`, searching from character `from`.
fn find_from(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let from_byte = haystack
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(haystack.len()))
        .nth(from)?;
    let found = haystack[from_byte..].find(needle)?;
    Some(from + char_len(&haystack[from_byte..from_byte + found]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slice_chars(s: &str, start: usize, end: usize) -> String {
        s.chars().skip(start).take(end - start).collect()
    }

    fn long_document(words: usize) -> String {
        let vocab = ["market", "share", "growth", "revenue", "product", "platform", "customer", "segment"];
        (0..words).map(|i| format!("{}{}", vocab[i % vocab.len()], i % 13)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn rejects_overlap_not_smaller_than_size() {
        assert!(matches!(Chunker::new(200, 200), Err(Error::Validation(_))));
        assert!(matches!(Chunker::new(100, 150), Err(Error::Validation(_))));
        assert!(matches!(Chunker::new(0, 0), Err(Error::Validation(_))));
        assert!(Chunker::new(10, 0).is_ok());
    }

    #[test]
    fn empty_and_blank_documents_yield_nothing() {
        let chunker = Chunker::new(100, 20).unwrap();
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk("   \n\n  \n").is_empty());
    }

    #[test]
    fn short_document_is_one_chunk() {
        let chunker = Chunker::new(1000, 200).unwrap();
        let chunks = chunker.chunk("Innovate Inc. holds 12% of the market.");
        assert_eq!(chunks.len(), 1);
        let c = &chunks[0];
        assert_eq!(c.chunk_id, "chunk_0");
        assert_eq!(c.chunk_index, 0);
        assert_eq!(c.start_char, 0);
        assert_eq!(c.end_char, c.length);
        assert_eq!(c.length, 38);
    }

    #[test]
    fn offsets_count_characters_not_bytes() {
        let chunker = Chunker::new(1000, 200).unwrap();
        let chunks = chunker.chunk("naïve café");
        assert_eq!(chunks[0].length, 10);
        assert_eq!(chunks[0].end_char, 10);
    }

    #[test]
    fn paragraphs_are_preferred_split_points() {
        let p1 = "First paragraph about market size.";
        let p2 = "Second paragraph about competitors.";
        let text = format!("{p1}\n\n{p2}");
        let chunker = Chunker::new(50, 10).unwrap();
        let chunks = chunker.chunk(&text);
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec![p1, p2]);
        assert_eq!(chunks[1].start_char, p1.chars().count() + 2);
    }

    #[test]
    fn unsplittable_text_falls_back_to_characters() {
        let chunker = Chunker::new(5, 1).unwrap();
        let chunks = chunker.chunk("abcdefghij");
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["abcde", "efghi", "ij"]);
        let starts: Vec<usize> = chunks.iter().map(|c| c.start_char).collect();
        assert_eq!(starts, vec![0, 4, 8]);
    }

    #[test]
    fn offsets_and_indices_hold_for_long_documents() {
        let doc = long_document(600);
        let chunker = Chunker::new(200, 40).unwrap();
        let chunks = chunker.chunk(&doc);
        assert!(chunks.len() > 5);

        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.chunk_index, i);
            assert_eq!(c.chunk_id, format!("chunk_{i}"));
            assert_eq!(c.end_char - c.start_char, c.length);
            assert_eq!(c.length, c.text.chars().count());
            assert!(c.length <= 200, "chunk {i} is {} chars", c.length);
            assert_eq!(slice_chars(&doc, c.start_char, c.end_char), c.text);
        }
        for pair in chunks.windows(2) {
            assert!(pair[1].start_char >= pair[0].start_char);
            assert!(pair[1].start_char <= pair[0].end_char, "gap between chunks");
        }
        assert_eq!(chunks[0].start_char, 0);
        assert_eq!(chunks.last().unwrap().end_char, doc.chars().count());
    }

    #[test]
    fn adjacent_chunks_share_a_token() {
        let doc = long_document(400);
        let chunker = Chunker::new(150, 30).unwrap();
        let chunks = chunker.chunk(&doc);
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let tail: Vec<&str> = pair[0].text.split_whitespace().collect();
            let head: Vec<&str> = pair[1].text.split_whitespace().collect();
            assert!(tail.iter().any(|t| head.contains(t)), "no shared token between {} and {}", pair[0].chunk_id, pair[1].chunk_id);
        }
    }

    #[test]
    fn statistics_summarise_chunks() {
        let chunker = Chunker::new(5, 1).unwrap();
        let chunks = chunker.chunk("abcdefghij");
        let stats = chunker.statistics(&chunks);
        assert_eq!(stats.total_chunks, 3);
        assert_eq!(stats.min_chunk_size, 2);
        assert_eq!(stats.max_chunk_size, 5);
        assert_eq!(stats.total_characters, 12);
        assert!((stats.avg_chunk_size - 4.0).abs() < 1e-9);
        assert!((stats.overlap_ratio - 0.2).abs() < 1e-9);

        let empty = chunker.statistics(&[]);
        assert_eq!(empty.total_chunks, 0);
        assert_eq!(empty.max_chunk_size, 0);
    }
}
