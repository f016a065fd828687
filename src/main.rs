//! # Sidekick CLI (`sidekick`)
//!
//! Builds embedding indexes from JSONL documents, answers questions from
//! them, and serves the HTTP query endpoint.
//!
//! ## Usage
//!
//! ```bash
//! sidekick --config ./config/sidekick.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `sidekick build --documents docs.jsonl` | Build a new index |
//! | `sidekick append --documents more.jsonl` | Add documents to an existing index |
//! | `sidekick ask "<question>"` | Answer a question with references |
//! | `sidekick search "<query>"` | Show the nearest chunks with scores |
//! | `sidekick info` | Summarize an index |
//! | `sidekick serve` | Start the HTTP server |
//!
//! Logs go to stderr (`RUST_LOG`, default `info`); command output goes to
//! stdout.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use sidekick::{ask, config, ingest, search, server, stats};

const DEFAULT_CONFIG: &str = "./config/sidekick.toml";

/// Sidekick: question answering over your documentation.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. When the default file is absent, built-in defaults are used.
#[derive(Parser)]
#[command(
    name = "sidekick",
    about = "Sidekick — retrieval-augmented question answering over a local document index",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Build a new index from a JSONL documents file.
    ///
    /// Any existing index at the output path is replaced only after the
    /// new one is complete.
    Build {
        /// Newline-delimited JSON with one {path, title, text} per line.
        #[arg(long)]
        documents: PathBuf,

        /// Output index file (defaults to [index].path).
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Add documents to an existing index.
    Append {
        #[arg(long)]
        documents: PathBuf,

        #[arg(long)]
        index: Option<PathBuf>,
    },

    /// Answer a question and list the documents it drew on.
    Ask {
        query: String,

        #[arg(long)]
        index: Option<PathBuf>,
    },

    /// Show the chunks nearest to a query.
    Search {
        query: String,

        #[arg(long)]
        index: Option<PathBuf>,

        /// Number of results (defaults to [retrieval].top_n).
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print the embedding model, chunking and counts of an index.
    Info {
        #[arg(long)]
        index: Option<PathBuf>,
    },

    /// Start the HTTP query server.
    Serve {
        #[arg(long)]
        index: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load(path: &Path) -> anyhow::Result<config::Config> {
    if path == Path::new(DEFAULT_CONFIG) {
        config::load_or_default(path)
    } else {
        config::load_config(path)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let cfg = load(&cli.config)?;
    let index_path = |over: Option<PathBuf>| over.unwrap_or_else(|| cfg.index.path.clone());

    match cli.command {
        Commands::Build { documents, output } => {
            ingest::run_build(&cfg, &documents, &index_path(output)).await?;
        }
        Commands::Append { documents, index } => {
            ingest::run_append(&cfg, &documents, &index_path(index)).await?;
        }
        Commands::Ask { query, index } => {
            ask::run_ask(&cfg, &index_path(index), &query).await?;
        }
        Commands::Search {
            query,
            index,
            limit,
        } => {
            search::run_search(&cfg, &index_path(index), &query, limit).await?;
        }
        Commands::Info { index } => {
            stats::run_info(&index_path(index)).await?;
        }
        Commands::Serve { index } => {
            server::run_server(&cfg, &index_path(index)).await?;
        }
    }

    Ok(())
}
