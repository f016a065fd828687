//! Index statistics.
//!
//! Summarizes what an index holds: the embedding space it was built in,
//! its chunking parameters, and document and chunk counts. Used by
//! `sidekick info` to confirm a build worked before serving it.

use anyhow::{Context, Result};
use std::path::Path;

use sidekick_core::index::EmbeddingIndex;
use sidekick_core::store::IndexStore;

use crate::sqlite_store::SqliteIndexStore;

/// Per-document chunk count, in first-indexed order.
struct DocumentStats<'a> {
    path: &'a str,
    title: &'a str,
    chunk_count: usize,
}

fn document_stats(index: &EmbeddingIndex) -> Vec<DocumentStats<'_>> {
    let mut stats: Vec<DocumentStats<'_>> = Vec::new();
    for chunk in index.chunks() {
        match stats.last_mut() {
            Some(last) if last.path == chunk.source => last.chunk_count += 1,
            _ => stats.push(DocumentStats {
                path: &chunk.source,
                title: &chunk.title,
                chunk_count: 1,
            }),
        }
    }
    stats
}

/// Load the index at `index_path` and print a summary.
pub async fn run_info(index_path: &Path) -> Result<()> {
    let index = SqliteIndexStore::new()
        .load(index_path)
        .await
        .with_context(|| format!("Failed to open index {}", index_path.display()))?;
    let manifest = index.manifest();
    let size = std::fs::metadata(index_path).map(|m| m.len()).unwrap_or(0);

    println!("Sidekick — Index Info");
    println!("=====================");
    println!();
    println!("  Index:       {}", index_path.display());
    println!("  Size:        {}", format_bytes(size));
    println!("  Built:       {}", format_built_at(&manifest.built_at));
    println!();
    println!("  Model:       {}", manifest.embedding_model);
    println!("  Dimensions:  {}", manifest.dims);
    println!(
        "  Chunking:    window {} / overlap {} ({})",
        manifest.chunking.window_size,
        manifest.chunking.overlap,
        manifest.chunking.unit.as_str()
    );
    println!();
    println!("  Documents:   {}", index.document_count());
    println!("  Chunks:      {}", index.len());

    let docs = document_stats(&index);
    if !docs.is_empty() {
        println!();
        println!("  By document:");
        println!("  {:<40} {:>8}   {}", "PATH", "CHUNKS", "TITLE");
        println!("  {}", "-".repeat(76));
        for d in &docs {
            println!("  {:<40} {:>8}   {}", d.path, d.chunk_count, d.title);
        }
    }

    println!();
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Render an RFC 3339 build time as `YYYY-MM-DD HH:MM UTC`, or verbatim if
/// it does not parse.
fn format_built_at(built_at: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(built_at)
        .map(|dt| {
            dt.with_timezone(&chrono::Utc)
                .format("%Y-%m-%d %H:%M UTC")
                .to_string()
        })
        .unwrap_or_else(|_| built_at.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sidekick_core::embedding::HashingEmbedder;
    use sidekick_core::models::{ChunkUnit, ChunkingConfig, Document};

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_format_built_at() {
        assert_eq!(
            format_built_at("2024-05-01T12:30:00+02:00"),
            "2024-05-01 10:30 UTC"
        );
        assert_eq!(format_built_at("yesterday"), "yesterday");
    }

    #[tokio::test]
    async fn test_document_stats_groups_consecutive_chunks() {
        let docs = vec![
            Document {
                path: "a.md".to_string(),
                title: "A".to_string(),
                text: "x".repeat(30),
            },
            Document {
                path: "b.md".to_string(),
                title: "B".to_string(),
                text: "y".repeat(5),
            },
        ];
        let chunking = ChunkingConfig {
            window_size: 10,
            overlap: 0,
            unit: ChunkUnit::Chars,
        };
        let index = EmbeddingIndex::build(&docs, chunking, &HashingEmbedder::new(16), 8)
            .await
            .unwrap();

        let stats = document_stats(&index);
        assert_eq!(stats.len(), 2);
        assert_eq!((stats[0].path, stats[0].chunk_count), ("a.md", 3));
        assert_eq!((stats[1].title, stats[1].chunk_count), ("B", 1));
    }
}
