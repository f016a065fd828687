//! The embedding index: chunk text, source metadata and vectors, searched by
//! brute-force cosine similarity.
//!
//! # Invariants
//!
//! - Every chunk shares the dimensionality and chunking configuration
//!   recorded in the [`IndexManifest`].
//! - Document paths are unique within an index.
//! - Search is read-only: any number of searches may run concurrently
//!   against a shared `&EmbeddingIndex`.
//! - Building and appending are all-or-nothing: on error the index is
//!   returned unchanged (or not at all).
//!
//! # Ranking
//!
//! Results are ordered by descending cosine similarity. Equal scores keep
//! chunk insertion order (stable sort), so rankings are reproducible.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::chunk::{chunk_text, validate};
use crate::embedding::{cosine_similarity, embed_one, Embedder};
use crate::error::{Error, Result};
use crate::models::{Chunk, ChunkingConfig, Document, IndexManifest, SearchResult};

/// Default number of chunk texts sent to the embedder per call.
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// An ordered collection of embedded chunks plus the settings that built it.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingIndex {
    manifest: IndexManifest,
    chunks: Vec<Chunk>,
}

impl EmbeddingIndex {
    /// Create an index holding no chunks.
    pub fn empty(embedder: &dyn Embedder, chunking: ChunkingConfig) -> Result<Self> {
        validate(&chunking)?;
        Ok(Self {
            manifest: IndexManifest {
                embedding_model: embedder.model_id().to_string(),
                dims: embedder.dims(),
                chunking,
                built_at: chrono::Utc::now().to_rfc3339(),
            },
            chunks: Vec::new(),
        })
    }

    /// Chunk and embed every document into a new index.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConfiguration`] for bad chunking parameters, empty
    ///   or duplicate document paths (checked before any embedding).
    /// - [`Error::EmbeddingFailure`] if the embedder fails or returns the
    ///   wrong number or size of vectors. No partial index is returned.
    pub async fn build(
        documents: &[Document],
        chunking: ChunkingConfig,
        embedder: &dyn Embedder,
        batch_size: usize,
    ) -> Result<Self> {
        let mut index = Self::empty(embedder, chunking)?;
        index.append(documents, embedder, batch_size).await?;
        info!(
            documents = documents.len(),
            chunks = index.len(),
            model = %index.manifest.embedding_model,
            "built embedding index"
        );
        Ok(index)
    }

    /// Rebuild an index from persisted parts, checking dimensionality.
    pub fn from_parts(manifest: IndexManifest, chunks: Vec<Chunk>) -> Result<Self> {
        validate(&manifest.chunking)?;
        for (i, chunk) in chunks.iter().enumerate() {
            if chunk.embedding.len() != manifest.dims {
                return Err(Error::Storage(format!(
                    "chunk {} has {} dimensions, index records {}",
                    i,
                    chunk.embedding.len(),
                    manifest.dims
                )));
            }
            if chunk.position != i {
                return Err(Error::Storage(format!(
                    "chunk positions are not contiguous: expected {}, found {}",
                    i, chunk.position
                )));
            }
        }
        Ok(Self { manifest, chunks })
    }

    /// Add documents to an existing index using its recorded chunking.
    ///
    /// Paths already present are rejected. On any error the index is left
    /// exactly as it was.
    pub async fn append(
        &mut self,
        documents: &[Document],
        embedder: &dyn Embedder,
        batch_size: usize,
    ) -> Result<()> {
        self.ensure_compatible(embedder)?;
        let batch_size = batch_size.max(1);

        {
            let mut seen: HashSet<&str> =
                self.chunks.iter().map(|c| c.source.as_str()).collect();
            for doc in documents {
                if doc.path.is_empty() {
                    return Err(Error::InvalidConfiguration(format!(
                        "document titled '{}' has an empty path",
                        doc.title
                    )));
                }
                if !seen.insert(doc.path.as_str()) {
                    return Err(Error::InvalidConfiguration(format!(
                        "duplicate document path: {}",
                        doc.path
                    )));
                }
            }
        }

        let mut staged: Vec<Chunk> = Vec::new();
        let mut position = self.chunks.len();

        for doc in documents {
            let texts = chunk_text(&doc.text, &self.manifest.chunking)?;
            debug!(path = %doc.path, chunks = texts.len(), "chunked document");

            for batch in texts.chunks(batch_size) {
                let vectors = embedder.embed(batch).await.map_err(|e| match e {
                    Error::EmbeddingFailure(msg) => {
                        Error::EmbeddingFailure(format!("{}: {}", doc.path, msg))
                    }
                    other => other,
                })?;
                if vectors.len() != batch.len() {
                    return Err(Error::EmbeddingFailure(format!(
                        "{}: embedder returned {} vectors for {} chunks",
                        doc.path,
                        vectors.len(),
                        batch.len()
                    )));
                }
                for (text, embedding) in batch.iter().zip(vectors) {
                    if embedding.len() != self.manifest.dims {
                        return Err(Error::EmbeddingFailure(format!(
                            "{}: expected {} dimensions, got {}",
                            doc.path,
                            self.manifest.dims,
                            embedding.len()
                        )));
                    }
                    staged.push(Chunk {
                        position,
                        source: doc.path.clone(),
                        title: doc.title.clone(),
                        text: text.clone(),
                        embedding,
                    });
                    position += 1;
                }
            }
        }

        self.chunks.extend(staged);
        Ok(())
    }

    /// Embed `query` and return the `top_n` most similar chunks.
    ///
    /// An index with no chunks yields an empty result without calling the
    /// embedder. Fewer than `top_n` chunks yields all of them, ranked.
    pub async fn search(
        &self,
        embedder: &dyn Embedder,
        query: &str,
        top_n: usize,
    ) -> Result<Vec<SearchResult>> {
        if self.chunks.is_empty() {
            debug!("search against empty index");
            return Ok(Vec::new());
        }
        self.ensure_compatible(embedder)?;
        let query_vec = embed_one(embedder, query).await?;
        match self.nearest(&query_vec, top_n) {
            Err(Error::EmptyIndex) => Ok(Vec::new()),
            other => other,
        }
    }

    /// Rank stored chunks against a precomputed query vector.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyIndex`] when the index holds no chunks, and
    /// [`Error::EmbeddingSpaceMismatch`] when `query_vec` has the wrong
    /// dimensionality.
    pub fn nearest(&self, query_vec: &[f32], top_n: usize) -> Result<Vec<SearchResult>> {
        if self.chunks.is_empty() {
            return Err(Error::EmptyIndex);
        }
        if query_vec.len() != self.manifest.dims {
            return Err(Error::EmbeddingSpaceMismatch {
                expected: format!("{} dimensions", self.manifest.dims),
                found: format!("{} dimensions", query_vec.len()),
            });
        }

        let mut scored: Vec<(f32, &Chunk)> = self
            .chunks
            .iter()
            .map(|c| (cosine_similarity(query_vec, &c.embedding), c))
            .collect();

        // sort_by is stable: equal scores keep insertion order.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_n);

        Ok(scored
            .into_iter()
            .map(|(score, c)| SearchResult {
                chunk_text: c.text.clone(),
                score,
                source_path: c.source.clone(),
                source_title: c.title.clone(),
            })
            .collect())
    }

    /// Reject an embedder whose model or dimensionality differs from the
    /// one this index was built with.
    pub fn ensure_compatible(&self, embedder: &dyn Embedder) -> Result<()> {
        if embedder.model_id() != self.manifest.embedding_model
            || embedder.dims() != self.manifest.dims
        {
            return Err(Error::EmbeddingSpaceMismatch {
                expected: format!(
                    "{}/{}",
                    self.manifest.embedding_model, self.manifest.dims
                ),
                found: format!("{}/{}", embedder.model_id(), embedder.dims()),
            });
        }
        Ok(())
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Number of distinct source documents.
    pub fn document_count(&self) -> usize {
        self.chunks
            .iter()
            .map(|c| c.source.as_str())
            .collect::<HashSet<_>>()
            .len()
    }
}
