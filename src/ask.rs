//! The `ask` command and orchestrator assembly shared with the server.

use anyhow::{Context, Result};
use std::path::Path;

use sidekick_core::answer::Orchestrator;
use sidekick_core::prompt::PromptTemplate;

use crate::completion::create_completer;
use crate::config::Config;
use crate::search::open_retriever;

/// Load the configured prompt template, or the built-in one.
pub fn load_template(config: &Config) -> Result<PromptTemplate> {
    match &config.completion.template_path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read prompt template: {}", path.display()))?;
            Ok(PromptTemplate::new(text)?)
        }
        None => Ok(PromptTemplate::default()),
    }
}

/// Wire the index, providers and template into an [`Orchestrator`].
pub async fn build_orchestrator(config: &Config, index_path: &Path) -> Result<Orchestrator> {
    let template = load_template(config)?;
    let retriever = open_retriever(config, index_path).await?;
    let completer = create_completer(&config.completion)?;
    Ok(Orchestrator::new(retriever, completer)
        .with_template(template)
        .with_params(config.completion.params()))
}

/// Answer `query` and print the answer followed by its references.
pub async fn run_ask(config: &Config, index_path: &Path, query: &str) -> Result<()> {
    let orchestrator = build_orchestrator(config, index_path).await?;
    let answer = orchestrator.answer(query).await?;

    println!("Answer: {}", answer.text);
    if !answer.references.is_empty() {
        println!();
        println!("References:");
        for reference in &answer.references {
            println!("  - {} ({})", reference.title, reference.path);
        }
    }
    Ok(())
}
