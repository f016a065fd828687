//! Question answering: retrieve, assemble a prompt, complete, attribute.
//!
//! The [`Orchestrator`] moves each question through
//! `Received → Retrieved → ContextBuilt → Completed → Done`. Any failure
//! ends the run immediately and is returned unchanged; no partial or
//! fallback answer is produced and nothing is retried here.
//!
//! References are taken from the same search results that built the
//! prompt, never from the model's output.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::completion::{Completer, CompletionParams};
use crate::error::{Error, Result};
use crate::models::Answer;
use crate::prompt::PromptTemplate;
use crate::references::extract_references;
use crate::retrieve::Retriever;

/// Progress of a single question through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerStage {
    Received,
    Retrieved,
    ContextBuilt,
    Completed,
    Done,
}

impl fmt::Display for AnswerStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AnswerStage::Received => "received",
            AnswerStage::Retrieved => "retrieved",
            AnswerStage::ContextBuilt => "context_built",
            AnswerStage::Completed => "completed",
            AnswerStage::Done => "done",
        };
        f.write_str(s)
    }
}

/// Composes retrieval, prompt assembly, completion and reference
/// extraction into one query-to-answer operation.
#[derive(Clone)]
pub struct Orchestrator {
    retriever: Retriever,
    completer: Arc<dyn Completer>,
    template: PromptTemplate,
    params: CompletionParams,
}

impl Orchestrator {
    pub fn new(retriever: Retriever, completer: Arc<dyn Completer>) -> Self {
        Self {
            retriever,
            completer,
            template: PromptTemplate::default(),
            params: CompletionParams::default(),
        }
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn with_params(mut self, params: CompletionParams) -> Self {
        self.params = params;
        self
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Answer `query` from the indexed documents.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyQuery`] for a blank question (no collaborator is
    /// called), otherwise whatever retrieval or completion reported.
    pub async fn answer(&self, query: &str) -> Result<Answer> {
        let mut stage = AnswerStage::Received;
        debug!(%stage, "answering question");
        if query.trim().is_empty() {
            return Err(Error::EmptyQuery);
        }

        let results = self.retriever.retrieve(query).await?;
        stage = AnswerStage::Retrieved;
        debug!(%stage, results = results.len());

        let prompt = self.template.render(&results, query);
        stage = AnswerStage::ContextBuilt;
        debug!(%stage, prompt_chars = prompt.len());

        let completion = self.completer.complete(&prompt, &self.params).await?;
        stage = AnswerStage::Completed;
        debug!(%stage, model = self.completer.model_name());

        let answer = Answer {
            text: completion.text,
            references: extract_references(&results),
        };
        stage = AnswerStage::Done;
        debug!(%stage, references = answer.references.len());

        Ok(answer)
    }
}
