//! Top-N retrieval over a shared index.

use std::sync::Arc;

use crate::embedding::Embedder;
use crate::error::Result;
use crate::index::EmbeddingIndex;
use crate::models::SearchResult;

/// Number of chunks retrieved per question unless configured otherwise.
pub const DEFAULT_TOP_N: usize = 5;

/// Embeds a query and returns the `top_n` most similar chunks.
///
/// Holds no per-query state: every call re-embeds its query, so a
/// `Retriever` can be shared across concurrent requests.
#[derive(Clone)]
pub struct Retriever {
    index: Arc<EmbeddingIndex>,
    embedder: Arc<dyn Embedder>,
    top_n: usize,
}

impl Retriever {
    pub fn new(index: Arc<EmbeddingIndex>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            index,
            embedder,
            top_n: DEFAULT_TOP_N,
        }
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    pub fn index(&self) -> &EmbeddingIndex {
        &self.index
    }

    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.index
            .search(self.embedder.as_ref(), query, self.top_n)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;
    use crate::models::{ChunkingConfig, Document};

    async fn retriever_over(n_docs: usize) -> Retriever {
        let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::new(64));
        let docs: Vec<Document> = (0..n_docs)
            .map(|i| Document {
                path: format!("doc{}.md", i),
                title: format!("Doc {}", i),
                text: format!("document number {}", i),
            })
            .collect();
        let index = EmbeddingIndex::build(&docs, ChunkingConfig::default(), embedder.as_ref(), 16)
            .await
            .unwrap();
        Retriever::new(Arc::new(index), embedder)
    }

    #[tokio::test]
    async fn test_default_top_n_is_five() {
        let r = retriever_over(8).await;
        assert_eq!(r.top_n(), 5);
        assert_eq!(r.retrieve("document").await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_with_top_n_overrides() {
        let r = retriever_over(8).await.with_top_n(2);
        assert_eq!(r.retrieve("document").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_retrievals_agree() {
        let r = retriever_over(6).await;
        let (a, b) = tokio::join!(r.retrieve("number 3"), r.retrieve("number 3"));
        assert_eq!(a.unwrap(), b.unwrap());
    }
}
