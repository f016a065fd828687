//! Error taxonomy shared by every core component.
//!
//! Failures below the [`Orchestrator`](crate::answer::Orchestrator) are
//! propagated upward unchanged; nothing in the core downgrades an error into
//! a partial or fabricated answer.

use thiserror::Error;

/// Errors produced by the retrieval-and-synthesis pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Bad chunking parameters, duplicate document paths, or a malformed
    /// prompt template. Raised before any work begins.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The embedding collaborator could not embed a text, or returned
    /// vectors of the wrong count or shape.
    #[error("embedding failed: {0}")]
    EmbeddingFailure(String),

    /// The embedder used for a query or append does not match the one the
    /// index was built with.
    #[error("embedding space mismatch: index expects {expected}, got {found}")]
    EmbeddingSpaceMismatch { expected: String, found: String },

    /// Nearest-neighbor scoring was asked to run against zero chunks.
    #[error("index holds no chunks")]
    EmptyIndex,

    /// The question was empty or whitespace only.
    #[error("query must not be empty")]
    EmptyQuery,

    /// The language-model completion call failed.
    #[error("completion failed: {0}")]
    CompletionFailure(String),

    /// The persistence collaborator could not load or save an index.
    #[error("storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Stable machine-readable code, used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidConfiguration(_) => "invalid_configuration",
            Error::EmbeddingFailure(_) => "embedding_failure",
            Error::EmbeddingSpaceMismatch { .. } => "embedding_space_mismatch",
            Error::EmptyIndex => "empty_index",
            Error::EmptyQuery => "empty_query",
            Error::CompletionFailure(_) => "completion_failure",
            Error::Storage(_) => "storage",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
