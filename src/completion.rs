//! Concrete completion providers.
//!
//! Implements the core [`Completer`] trait for:
//! - **[`DisabledCompleter`]**: always fails; used when no model is configured.
//! - **[`OpenAICompleter`]**: `POST /v1/chat/completions` with a single user message.
//! - **[`OllamaCompleter`]**: `POST /api/generate` with streaming off.
//!
//! Transient HTTP failures are retried inside the provider with the shared
//! backoff policy in [`crate::http`]. Whatever is left surfaces as
//! [`Error::CompletionFailure`].

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;

use sidekick_core::completion::{Completer, Completion, CompletionParams};
use sidekick_core::Error;

use crate::config::CompletionConfig;
use crate::http;

const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_OLLAMA_MODEL: &str = "llama3";
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

fn failure(e: anyhow::Error) -> Error {
    Error::CompletionFailure(format!("{:#}", e))
}

// ============ Disabled Provider ============

/// A completer that refuses every request.
///
/// Lets `build`, `search` and `info` run without model credentials while
/// `ask` reports a clear error.
pub struct DisabledCompleter;

#[async_trait]
impl Completer for DisabledCompleter {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn complete(
        &self,
        _prompt: &str,
        _params: &CompletionParams,
    ) -> sidekick_core::Result<Completion> {
        Err(Error::CompletionFailure(
            "completion provider is disabled; set [completion].provider".to_string(),
        ))
    }
}

// ============ OpenAI Provider ============

/// Chat completion client for the OpenAI API.
///
/// Requires the `OPENAI_API_KEY` environment variable.
pub struct OpenAICompleter {
    client: reqwest::Client,
    api_key: String,
    model: String,
    max_retries: u32,
}

impl OpenAICompleter {
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;
        Ok(Self {
            client: http::client(config.timeout_secs)?,
            api_key,
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl Completer for OpenAICompleter {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        prompt: &str,
        params: &CompletionParams,
    ) -> sidekick_core::Result<Completion> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": params.temperature,
            "max_tokens": params.max_tokens,
        });
        let json = http::post_json(
            &self.client,
            "https://api.openai.com/v1/chat/completions",
            Some(&self.api_key),
            &body,
            self.max_retries,
            "OpenAI",
        )
        .await
        .map_err(failure)?;
        parse_openai_response(&json).map_err(failure)
    }
}

fn parse_openai_response(json: &serde_json::Value) -> Result<Completion> {
    let text = json
        .pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing choices[0].message.content"))?;
    Ok(Completion {
        text: text.trim().to_string(),
    })
}

// ============ Ollama Provider ============

/// Completion client for a local Ollama instance.
pub struct OllamaCompleter {
    client: reqwest::Client,
    url: String,
    model: String,
    max_retries: u32,
}

impl OllamaCompleter {
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        Ok(Self {
            client: http::client(config.timeout_secs)?,
            url: config
                .url
                .clone()
                .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl Completer for OllamaCompleter {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        prompt: &str,
        params: &CompletionParams,
    ) -> sidekick_core::Result<Completion> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": {
                "temperature": params.temperature,
                "num_predict": params.max_tokens,
            },
        });
        let json = http::post_json(
            &self.client,
            &format!("{}/api/generate", self.url.trim_end_matches('/')),
            None,
            &body,
            self.max_retries,
            "Ollama",
        )
        .await
        .map_err(failure)?;
        parse_ollama_response(&json).map_err(failure)
    }
}

fn parse_ollama_response(json: &serde_json::Value) -> Result<Completion> {
    let text = json
        .get("response")
        .and_then(|r| r.as_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid Ollama response: missing response"))?;
    Ok(Completion {
        text: text.trim().to_string(),
    })
}

/// Create the [`Completer`] named by `config.provider`.
pub fn create_completer(config: &CompletionConfig) -> Result<Arc<dyn Completer>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledCompleter)),
        "openai" => Ok(Arc::new(OpenAICompleter::new(config)?)),
        "ollama" => Ok(Arc::new(OllamaCompleter::new(config)?)),
        other => bail!("Unknown completion provider: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_completer_fails() {
        let completer = create_completer(&CompletionConfig::default()).unwrap();
        assert_eq!(completer.model_name(), "disabled");
        let err = completer
            .complete("prompt", &CompletionParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CompletionFailure(_)));
    }

    #[test]
    fn test_parse_openai_chat_response() {
        let json = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": " The sky is blue.\n"}}]
        });
        assert_eq!(parse_openai_response(&json).unwrap().text, "The sky is blue.");
    }

    #[test]
    fn test_parse_openai_response_without_choices() {
        assert!(parse_openai_response(&serde_json::json!({"choices": []})).is_err());
    }

    #[test]
    fn test_parse_ollama_response() {
        let json = serde_json::json!({"model": "llama3", "response": "Blue.", "done": true});
        assert_eq!(parse_ollama_response(&json).unwrap().text, "Blue.");
    }

    #[tokio::test]
    async fn test_unreachable_ollama_is_completion_failure() {
        let config = CompletionConfig {
            provider: "ollama".to_string(),
            url: Some("http://127.0.0.1:9".to_string()),
            max_retries: 0,
            timeout_secs: 1,
            ..CompletionConfig::default()
        };
        let completer = create_completer(&config).unwrap();
        let err = completer
            .complete("prompt", &CompletionParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CompletionFailure(_)));
    }
}
