//! SQLite-backed [`IndexStore`].
//!
//! Each index is one SQLite file (schema in [`crate::migrate`]). Saving
//! writes a sibling temporary file inside a single transaction and renames
//! it over the target only after the commit, so readers see either the old
//! index or the complete new one. Loading opens the file read-only and
//! checks every vector BLOB against the recorded dimensionality.

use async_trait::async_trait;
use sqlx::Row;
use std::fmt::Display;
use std::path::{Path, PathBuf};

use sidekick_core::embedding::{blob_to_vec, vec_to_blob};
use sidekick_core::index::EmbeddingIndex;
use sidekick_core::models::{Chunk, ChunkUnit, ChunkingConfig, IndexManifest};
use sidekick_core::store::IndexStore;
use sidekick_core::{Error, Result};

use crate::db;
use crate::migrate;

/// Stores indexes as standalone SQLite files.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteIndexStore;

impl SqliteIndexStore {
    pub fn new() -> Self {
        Self
    }
}

fn storage(e: impl Display) -> Error {
    Error::Storage(e.to_string())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".tmp-{}", std::process::id()));
    path.with_file_name(name)
}

async fn write_index(path: &Path, index: &EmbeddingIndex) -> anyhow::Result<()> {
    let pool = db::connect(path).await?;
    migrate::run_migrations(&pool).await?;

    let manifest = index.manifest();
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO manifest (id, embedding_model, dims, window_size, overlap, unit, built_at)
         VALUES (1, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&manifest.embedding_model)
    .bind(manifest.dims as i64)
    .bind(manifest.chunking.window_size as i64)
    .bind(manifest.chunking.overlap as i64)
    .bind(manifest.chunking.unit.as_str())
    .bind(&manifest.built_at)
    .execute(&mut *tx)
    .await?;

    for chunk in index.chunks() {
        sqlx::query(
            "INSERT INTO chunks (position, source, title, text, embedding) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(chunk.position as i64)
        .bind(&chunk.source)
        .bind(&chunk.title)
        .bind(&chunk.text)
        .bind(vec_to_blob(&chunk.embedding))
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    pool.close().await;
    Ok(())
}

async fn read_index(path: &Path) -> anyhow::Result<EmbeddingIndex> {
    let pool = db::connect_read_only(path).await?;

    let row = sqlx::query(
        "SELECT embedding_model, dims, window_size, overlap, unit, built_at FROM manifest WHERE id = 1",
    )
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| anyhow::anyhow!("index file has no manifest"))?;

    let unit_str: String = row.try_get("unit")?;
    let unit = ChunkUnit::parse(&unit_str)
        .ok_or_else(|| anyhow::anyhow!("unknown chunk unit '{}' in manifest", unit_str))?;
    let dims = usize::try_from(row.try_get::<i64, _>("dims")?)?;
    let manifest = IndexManifest {
        embedding_model: row.try_get("embedding_model")?,
        dims,
        chunking: ChunkingConfig {
            window_size: usize::try_from(row.try_get::<i64, _>("window_size")?)?,
            overlap: usize::try_from(row.try_get::<i64, _>("overlap")?)?,
            unit,
        },
        built_at: row.try_get("built_at")?,
    };

    let rows = sqlx::query(
        "SELECT position, source, title, text, embedding FROM chunks ORDER BY position ASC",
    )
    .fetch_all(&pool)
    .await?;

    let mut chunks = Vec::with_capacity(rows.len());
    for row in rows {
        let position = usize::try_from(row.try_get::<i64, _>("position")?)?;
        let blob: Vec<u8> = row.try_get("embedding")?;
        if blob.len() != dims * 4 {
            anyhow::bail!(
                "chunk {} embedding is {} bytes, expected {}",
                position,
                blob.len(),
                dims * 4
            );
        }
        chunks.push(Chunk {
            position,
            source: row.try_get("source")?,
            title: row.try_get("title")?,
            text: row.try_get("text")?,
            embedding: blob_to_vec(&blob),
        });
    }

    pool.close().await;
    Ok(EmbeddingIndex::from_parts(manifest, chunks)?)
}

#[async_trait]
impl IndexStore for SqliteIndexStore {
    async fn save(&self, path: &Path, index: &EmbeddingIndex) -> Result<()> {
        let tmp = temp_path(path);
        if tokio::fs::try_exists(&tmp).await.map_err(storage)? {
            tokio::fs::remove_file(&tmp).await.map_err(storage)?;
        }

        if let Err(e) = write_index(&tmp, index).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(Error::Storage(format!(
                "failed to write index {}: {:#}",
                path.display(),
                e
            )));
        }

        if let Err(e) = tokio::fs::rename(&tmp, path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(storage(e));
        }

        tracing::debug!(path = %path.display(), chunks = index.len(), "saved index");
        Ok(())
    }

    async fn load(&self, path: &Path) -> Result<EmbeddingIndex> {
        if !self.exists(path).await? {
            return Err(Error::Storage(format!("no index at {}", path.display())));
        }
        read_index(path).await.map_err(|e| {
            Error::Storage(format!("failed to load index {}: {:#}", path.display(), e))
        })
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        Ok(tokio::fs::metadata(path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sidekick_core::embedding::HashingEmbedder;
    use sidekick_core::models::Document;
    use tempfile::TempDir;

    fn docs() -> Vec<Document> {
        vec![
            Document {
                path: "a.md".to_string(),
                title: "A".to_string(),
                text: "The sky is blue. ".repeat(50),
            },
            Document {
                path: "b.md".to_string(),
                title: "B".to_string(),
                text: "Grass is green.".to_string(),
            },
        ]
    }

    async fn build() -> EmbeddingIndex {
        let chunking = ChunkingConfig {
            window_size: 64,
            overlap: 8,
            unit: ChunkUnit::Chars,
        };
        EmbeddingIndex::build(&docs(), chunking, &HashingEmbedder::new(32), 16)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/index.sqlite");
        let index = build().await;

        let store = SqliteIndexStore::new();
        store.save(&path, &index).await.unwrap();
        assert!(store.exists(&path).await.unwrap());
        assert!(!temp_path(&path).exists());

        let loaded = store.load(&path).await.unwrap();
        assert_eq!(loaded, index);
    }

    #[tokio::test]
    async fn test_save_replaces_existing_index() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("index.sqlite");
        let store = SqliteIndexStore::new();

        store.save(&path, &build().await).await.unwrap();
        let e = HashingEmbedder::new(32);
        let empty = EmbeddingIndex::build(&[], ChunkingConfig::default(), &e, 8)
            .await
            .unwrap();
        store.save(&path, &empty).await.unwrap();

        assert!(store.load(&path).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let tmp = TempDir::new().unwrap();
        let err = SqliteIndexStore::new()
            .load(&tmp.path().join("missing.sqlite"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }

    #[tokio::test]
    async fn test_load_rejects_truncated_vector() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("index.sqlite");
        SqliteIndexStore::new()
            .save(&path, &build().await)
            .await
            .unwrap();

        let pool = db::connect(&path).await.unwrap();
        sqlx::query("UPDATE chunks SET embedding = x'00000000' WHERE position = 0")
            .execute(&pool)
            .await
            .unwrap();
        pool.close().await;

        let err = SqliteIndexStore::new().load(&path).await.unwrap_err();
        assert!(err.to_string().contains("bytes"));
    }

    #[tokio::test]
    async fn test_load_rejects_non_index_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("index.sqlite");
        std::fs::write(&path, "not a database").unwrap();
        assert!(SqliteIndexStore::new().load(&path).await.is_err());
    }
}
