//! Persistence abstraction for embedding indexes.
//!
//! The [`IndexStore`] trait loads and saves a whole [`EmbeddingIndex`] by
//! path. The storage format is opaque to the core; implementations only
//! have to round-trip the manifest and the ordered chunks.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.
//! Concurrent saves to the same path are not coordinated here; callers
//! serialize builds that target one store.

pub mod memory;

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::index::EmbeddingIndex;

/// Abstract storage backend for embedding indexes.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`save`](IndexStore::save) | Persist an index, replacing whatever was at `path` |
/// | [`load`](IndexStore::load) | Read a previously saved index |
/// | [`exists`](IndexStore::exists) | Check whether an index is stored at `path` |
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Persist `index` at `path`.
    ///
    /// Either the complete index is stored or the previous contents of
    /// `path` are left untouched.
    async fn save(&self, path: &Path, index: &EmbeddingIndex) -> Result<()>;

    /// Load the index stored at `path`.
    async fn load(&self, path: &Path) -> Result<EmbeddingIndex>;

    /// Whether an index is stored at `path`.
    async fn exists(&self, path: &Path) -> Result<bool>;
}
