//! Data types that flow through indexing and answering.
//!
//! Search results and references are fixed-field records rather than
//! free-form metadata maps, so every consumer sees the same shape.

use serde::{Deserialize, Serialize};

/// A source document handed to the index builder.
///
/// Deserializes directly from one line of the newline-delimited JSON
/// corpus: `{"path": "...", "title": "...", "text": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier of the document (usually a URL path).
    pub path: String,
    pub title: String,
    pub text: String,
}

/// One embedded window of a document. Owned by the
/// [`EmbeddingIndex`](crate::index::EmbeddingIndex).
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Insertion order within the index, starting at 0.
    pub position: usize,
    /// `path` of the parent document.
    pub source: String,
    /// `title` of the parent document.
    pub title: String,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// A ranked chunk returned from a similarity search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub chunk_text: String,
    /// Cosine similarity to the query, higher is better.
    pub score: f32,
    pub source_path: String,
    pub source_title: String,
}

/// A distinct source document cited by an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub path: String,
    pub title: String,
}

/// The final response to a question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    #[serde(rename = "answer")]
    pub text: String,
    pub references: Vec<Reference>,
}

/// Unit in which chunk windows are measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkUnit {
    /// Unicode scalar values.
    Chars,
    /// Whitespace-delimited words.
    #[default]
    Words,
}

impl ChunkUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkUnit::Chars => "chars",
            ChunkUnit::Words => "words",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "chars" => Some(ChunkUnit::Chars),
            "words" => Some(ChunkUnit::Words),
            _ => None,
        }
    }
}

/// Sliding-window chunking parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Window length `W`, in `unit`s.
    pub window_size: usize,
    /// Units shared by consecutive windows, `0 <= overlap < window_size`.
    pub overlap: usize,
    #[serde(default)]
    pub unit: ChunkUnit,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            window_size: 256,
            overlap: 32,
            unit: ChunkUnit::Words,
        }
    }
}

/// Build-time facts recorded alongside the chunks of an index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexManifest {
    /// Identifier of the embedding model every chunk was embedded with.
    pub embedding_model: String,
    /// Dimensionality shared by every stored vector.
    pub dims: usize,
    pub chunking: ChunkingConfig,
    /// RFC 3339 timestamp of the build.
    pub built_at: String,
}
