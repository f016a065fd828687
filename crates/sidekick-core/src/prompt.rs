//! Prompt assembly: retrieved chunks plus the question, framed by a fixed
//! instruction template.
//!
//! Each result is rendered as a `Document {title}:` block, blocks are
//! joined with a single newline in ranking order, and the joined context
//! and the raw question replace the `{context}` and `{question}` markers.
//!
//! Replacement is plain text substitution, `{context}` first. Chunk text is
//! not escaped: a chunk that itself contains `{question}` will have the
//! question spliced into it.

use crate::error::{Error, Result};
use crate::models::SearchResult;

/// Marker replaced with the rendered context blocks.
pub const CONTEXT_MARKER: &str = "{context}";
/// Marker replaced with the user's question.
pub const QUESTION_MARKER: &str = "{question}";

/// Persona, grounding instructions, an example of the expected shape, then
/// the live context and question.
pub const DEFAULT_TEMPLATE: &str = "\
Your name is Sidekick. You are a helpful assistant that answers my questions using only the documents I give you. I will provide a question together with the relevant context, and you will give a helpful and truthful answer based on that context.
Example format:
Document A:
<context from document A>
Document B:
<context from document B>
...
Document Z:
<context from document Z>
Question: <question>
Answer:
<your answer>
Let's try this now:
{context}
Question: {question}
Answer:
";

/// Render one search result as a labeled context block.
pub fn render_document(title: &str, text: &str) -> String {
    format!("Document {}:\n{}", title, text)
}

/// Render results in order, one block per result, newline-separated.
pub fn render_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| render_document(&r.source_title, &r.chunk_text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// An instruction template holding both substitution markers.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    /// Wrap a custom template.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfiguration`] if either marker is missing.
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        for marker in [CONTEXT_MARKER, QUESTION_MARKER] {
            if !text.contains(marker) {
                return Err(Error::InvalidConfiguration(format!(
                    "prompt template is missing the {} marker",
                    marker
                )));
            }
        }
        Ok(Self { text })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Substitute the rendered context and the question into the template.
    pub fn render(&self, results: &[SearchResult], question: &str) -> String {
        self.text
            .replace(CONTEXT_MARKER, &render_context(results))
            .replace(QUESTION_MARKER, question)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            text: DEFAULT_TEMPLATE.to_string(),
        }
    }
}
