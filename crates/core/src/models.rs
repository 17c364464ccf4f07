use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One bounded window of a document's extracted text.
///
/// Chunks are immutable once created: ingestion writes them, retrieval only
/// reads them back. `page` is the page that contains the window's first
/// character, and is `None` when extraction produced no page structure
/// (the whole-document LLM fallback).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub index: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

/// A chunk paired with its per-query lexical score. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentFingerprint {
    pub document_id: String,
    pub title: String,
    pub source_path: String,
    pub checksum: String,
    pub ingested_at: DateTime<Utc>,
}

/// Tunables shared by ingestion and question answering.
///
/// The defaults are the recall stack's canonical parameters: 1200-char
/// windows with a 200-char overlap, and 6 context chunks per question.
#[derive(Debug, Clone, Copy)]
pub struct RecallOptions {
    pub chunk_max_chars: usize,
    pub chunk_overlap_chars: usize,
    pub top_k: usize,
}

impl Default for RecallOptions {
    fn default() -> Self {
        Self {
            chunk_max_chars: 1_200,
            chunk_overlap_chars: 200,
            top_k: 6,
        }
    }
}
