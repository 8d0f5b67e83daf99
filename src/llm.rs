//! LLM integration for commit message generation and patch splitting.

pub mod ai;
pub mod client;
pub mod error;
pub mod prompts;
pub mod provider;
pub mod schema;

#[cfg(test)]
pub(crate) mod test_utils;

pub use ai::ollama::OllamaAiClient;
pub use ai::openai::{ApiStyle, OpenAiAiClient};
pub use ai::{AiClient, AiClientMetadata, GenerationOptions, Prompt, ResponseFormat};
pub use client::{count_hunks, CommitClient, DEFAULT_GENERATION_TIMEOUT};
pub use error::LlmError;
pub use provider::create_ai_client;
