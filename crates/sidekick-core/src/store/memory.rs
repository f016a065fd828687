//! In-memory [`IndexStore`] implementation for testing.
//!
//! Keeps cloned indexes in a `HashMap` behind `std::sync::RwLock`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::index::EmbeddingIndex;

use super::IndexStore;

/// In-memory index store.
pub struct InMemoryStore {
    indexes: RwLock<HashMap<PathBuf, EmbeddingIndex>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            indexes: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> Error {
    Error::Storage("in-memory store lock poisoned".to_string())
}

#[async_trait]
impl IndexStore for InMemoryStore {
    async fn save(&self, path: &Path, index: &EmbeddingIndex) -> Result<()> {
        let mut indexes = self.indexes.write().map_err(|_| poisoned())?;
        indexes.insert(path.to_path_buf(), index.clone());
        Ok(())
    }

    async fn load(&self, path: &Path) -> Result<EmbeddingIndex> {
        let indexes = self.indexes.read().map_err(|_| poisoned())?;
        indexes
            .get(path)
            .cloned()
            .ok_or_else(|| Error::Storage(format!("no index stored at {}", path.display())))
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let indexes = self.indexes.read().map_err(|_| poisoned())?;
        Ok(indexes.contains_key(path))
    }
}
