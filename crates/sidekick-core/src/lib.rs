//! # Sidekick Core
//!
//! Runtime-free retrieval-and-synthesis logic for Sidekick: document
//! chunking, the embedding index and its nearest-neighbor search, prompt
//! assembly, reference extraction, and the answer orchestrator.
//!
//! This crate contains no tokio, sqlx, HTTP, or filesystem I/O. Every
//! external capability (embedding model, completion model, index storage)
//! is reached through a trait that the application implements and passes
//! in explicitly.
//!
//! ```text
//!  query ─▶ Retriever ─▶ PromptTemplate ─▶ Completer ─▶ extract_references ─▶ Answer
//!              │
//!              ▼
//!        EmbeddingIndex ◀── build(documents) ◀── chunk_text
//! ```

pub mod answer;
pub mod chunk;
pub mod completion;
pub mod embedding;
pub mod error;
pub mod index;
pub mod models;
pub mod prompt;
pub mod references;
pub mod retrieve;
pub mod store;

pub use error::{Error, Result};
