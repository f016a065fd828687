//! # Sidekick
//!
//! A retrieval-augmented question answering assistant over a local
//! document index.
//!
//! Documents (newline-delimited JSON, one `{path, title, text}` object per
//! line) are split into overlapping windows, embedded, and stored in a
//! single SQLite index file. Questions are answered by retrieving the
//! nearest chunks, assembling them into a fixed prompt, and asking a
//! completion model. Every answer carries the documents it was grounded on.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌──────────┐
//! │   JSONL    │──▶│ Chunk+Embed  │──▶│  SQLite   │
//! │ documents  │   │ (core index) │   │  index    │
//! └────────────┘   └──────────────┘   └────┬─────┘
//!                                          │
//!                      ┌───────────────────┤
//!                      ▼                   ▼
//!                 ┌──────────┐       ┌──────────┐
//!                 │   CLI    │       │   HTTP   │
//!                 │(sidekick)│       │  (axum)  │
//!                 └──────────┘       └──────────┘
//! ```
//!
//! The pipeline itself lives in the runtime-free `sidekick-core` crate;
//! this crate supplies configuration, providers, persistence and the
//! outer surfaces.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`embedding`] | Embedding providers (hash, OpenAI, Ollama, local) |
//! | [`completion`] | Completion providers (OpenAI, Ollama) |
//! | [`http`] | Retrying JSON POST shared by providers |
//! | [`db`] | SQLite connections |
//! | [`migrate`] | Index file schema |
//! | [`sqlite_store`] | SQLite [`IndexStore`](sidekick_core::store::IndexStore) |
//! | [`ingest`] | `build` and `append` commands |
//! | [`search`] | `search` command and index loading |
//! | [`ask`] | `ask` command and orchestrator assembly |
//! | [`stats`] | `info` command |
//! | [`server`] | HTTP endpoint |

pub mod ask;
pub mod completion;
pub mod config;
pub mod db;
pub mod embedding;
pub mod http;
pub mod ingest;
pub mod migrate;
pub mod search;
pub mod server;
pub mod sqlite_store;
pub mod stats;
