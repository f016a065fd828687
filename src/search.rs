//! Index loading and the `search` command.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use sidekick_core::retrieve::Retriever;
use sidekick_core::store::IndexStore;

use crate::config::Config;
use crate::embedding::create_embedder;
use crate::sqlite_store::SqliteIndexStore;

/// Load the index at `index_path` and pair it with the configured embedder.
///
/// Fails if the index was built in a different embedding space.
pub async fn open_retriever(config: &Config, index_path: &Path) -> Result<Retriever> {
    let index = SqliteIndexStore::new()
        .load(index_path)
        .await
        .with_context(|| format!("Failed to open index {}", index_path.display()))?;
    let embedder = create_embedder(&config.embedding)?;
    index.ensure_compatible(embedder.as_ref())?;
    tracing::debug!(
        path = %index_path.display(),
        chunks = index.len(),
        "loaded index"
    );
    Ok(Retriever::new(Arc::new(index), embedder).with_top_n(config.retrieval.top_n))
}

/// Print the nearest chunks for `query`.
pub async fn run_search(
    config: &Config,
    index_path: &Path,
    query: &str,
    limit: Option<usize>,
) -> Result<()> {
    if query.trim().is_empty() {
        anyhow::bail!(sidekick_core::Error::EmptyQuery);
    }
    let mut retriever = open_retriever(config, index_path).await?;
    if let Some(n) = limit {
        retriever = retriever.with_top_n(n);
    }

    let results = retriever.retrieve(query).await?;
    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        println!(
            "{}. [{:.3}] {} / {}",
            i + 1,
            result.score,
            result.source_path,
            result.source_title
        );
        println!(
            "    excerpt: \"{}\"",
            excerpt(&result.chunk_text, 200).replace('\n', " ").trim()
        );
        println!();
    }
    Ok(())
}

fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}
