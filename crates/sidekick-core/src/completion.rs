//! Completion collaborator trait.
//!
//! The language-model call is external to the core. Concrete clients
//! (OpenAI, Ollama) are implemented in the `sidekick` application crate.

use async_trait::async_trait;

use crate::error::Result;

/// Decoding configuration passed with every completion request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionParams {
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
}

impl Default for CompletionParams {
    /// Greedy decoding with a bounded answer length.
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: 500,
        }
    }
}

/// Text returned by a completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
}

/// Trait for completion providers.
///
/// Transient errors may be retried inside an implementation; callers of
/// [`complete`](Completer::complete) never retry.
#[async_trait]
pub trait Completer: Send + Sync {
    /// Returns the model identifier (e.g. `"gpt-3.5-turbo"`).
    fn model_name(&self) -> &str;

    /// Complete `prompt`. Failures are reported as
    /// [`Error::CompletionFailure`](crate::error::Error::CompletionFailure).
    async fn complete(&self, prompt: &str, params: &CompletionParams) -> Result<Completion>;
}
