//! AI client trait and shared helpers for completion backends.

pub mod ollama;
pub mod openai;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;

use crate::llm::error::LlmError;

/// Metadata about an AI client implementation.
#[derive(Clone, Debug)]
pub struct AiClientMetadata {
    /// Service provider name.
    pub provider: String,
    /// Model identifier.
    pub model: String,
}

/// Shape the backend is asked to constrain its answer to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Free text.
    #[default]
    Text,
    /// A single JSON object.
    JsonObject,
}

/// Per-request generation settings.
#[derive(Clone, Debug, Default)]
pub struct GenerationOptions {
    /// Requested response format.
    pub response_format: ResponseFormat,
}

impl GenerationOptions {
    /// Options for a JSON-object constrained answer.
    pub fn json_object() -> Self {
        Self {
            response_format: ResponseFormat::JsonObject,
        }
    }
}

/// Ordered system instructions followed by a single user message.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Prompt {
    /// System messages, sent in order before the user message.
    pub system: Vec<String>,
    /// The user message.
    pub user: String,
}

impl Prompt {
    /// Creates a prompt with the given user message and no system messages.
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            system: Vec::new(),
            user: user.into(),
        }
    }

    /// Appends a system message.
    #[must_use]
    pub fn with_system(mut self, instruction: impl Into<String>) -> Self {
        self.system.push(instruction.into());
        self
    }

    /// Flattens the prompt into one text block for backends without roles.
    pub fn combined(&self) -> String {
        let mut text = self.system.join("\n\n");
        if !text.is_empty() {
            text.push_str("\n\n");
        }
        text.push_str(&self.user);
        text
    }

    /// Total byte length of all messages.
    pub fn len(&self) -> usize {
        self.system.iter().map(String::len).sum::<usize>() + self.user.len()
    }

    /// Returns true when the prompt carries no text at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── Shared helpers for AI client implementations ────────────────────

/// Builds an HTTP client with the given request timeout.
pub(crate) fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// Maps a transport error, keeping timeouts distinguishable.
pub(crate) fn map_transport_error(error: &reqwest::Error, timeout: Duration) -> LlmError {
    if error.is_timeout() {
        LlmError::Timeout(timeout.as_secs())
    } else {
        LlmError::NetworkError(error.to_string())
    }
}

/// Checks an HTTP response for error status and returns a structured error
/// if non-success.
pub(crate) async fn check_error_response(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let error_text = response.text().await.unwrap_or_else(|e| {
        tracing::debug!("Failed to read error response body: {e}");
        String::new()
    });
    Err(LlmError::ApiRequestFailed(format!("HTTP {status}: {error_text}")).into())
}

/// Logs successful text extraction from a completion response.
pub(crate) fn log_response_success(provider: &str, result: &Result<String>) {
    if let Ok(text) = result {
        tracing::debug!(
            response_len = text.len(),
            "Successfully extracted text content from {} response",
            provider
        );
        tracing::debug!(response_content = %text, "{} response content", provider);
    }
}

/// Capability shared by every completion backend.
pub trait AiClient: Send + Sync {
    /// Sends the prompt and returns the raw text of the model's answer.
    fn generate<'a>(
        &'a self,
        prompt: &'a Prompt,
        options: &'a GenerationOptions,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

    /// Returns metadata about the AI client implementation.
    fn get_metadata(&self) -> AiClientMetadata;
}
