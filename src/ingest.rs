//! Index building from newline-delimited JSON documents.
//!
//! Each non-blank line of the input is one `{"path", "title", "text"}`
//! object, the format produced by the documentation crawler. `build`
//! writes a fresh index; `append` adds documents to an existing one using
//! the chunking recorded in that index.

use anyhow::{Context, Result};
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::info;

use sidekick_core::index::EmbeddingIndex;
use sidekick_core::models::Document;
use sidekick_core::store::IndexStore;

use crate::config::Config;
use crate::embedding::create_embedder;
use crate::sqlite_store::SqliteIndexStore;

/// Parse documents from a JSONL file, skipping blank lines.
pub fn read_documents(path: &Path) -> Result<Vec<Document>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open documents file: {}", path.display()))?;
    parse_documents(BufReader::new(file))
        .with_context(|| format!("Failed to read documents from {}", path.display()))
}

fn parse_documents(reader: impl BufRead) -> Result<Vec<Document>> {
    let mut documents = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: Document = serde_json::from_str(&line)
            .with_context(|| format!("line {}: invalid document", i + 1))?;
        documents.push(doc);
    }
    Ok(documents)
}

/// Build a new index from `documents` and save it to `output`.
///
/// The previous index at `output`, if any, is replaced only once the new
/// one has been fully built and written.
pub async fn run_build(config: &Config, documents: &Path, output: &Path) -> Result<()> {
    let docs = read_documents(documents)?;
    let embedder = create_embedder(&config.embedding)?;
    info!(
        documents = docs.len(),
        model = embedder.model_id(),
        "building index"
    );

    let index = EmbeddingIndex::build(
        &docs,
        config.chunking.to_core(),
        embedder.as_ref(),
        config.embedding.batch_size,
    )
    .await?;

    SqliteIndexStore::new().save(output, &index).await?;

    println!(
        "Built index: {} documents, {} chunks → {}",
        index.document_count(),
        index.len(),
        output.display()
    );
    Ok(())
}

/// Append `documents` to the index at `index_path`.
pub async fn run_append(config: &Config, documents: &Path, index_path: &Path) -> Result<()> {
    let docs = read_documents(documents)?;
    let store = SqliteIndexStore::new();
    let mut index = store.load(index_path).await?;
    let embedder = create_embedder(&config.embedding)?;
    let before = index.len();

    index
        .append(&docs, embedder.as_ref(), config.embedding.batch_size)
        .await?;
    store.save(index_path, &index).await?;

    info!(
        documents = docs.len(),
        chunks = index.len() - before,
        "appended to index"
    );
    println!(
        "Appended {} documents ({} chunks) → {} (total {} chunks)",
        docs.len(),
        index.len() - before,
        index_path.display(),
        index.len()
    );
    Ok(())
}
