//! Backend selection from configuration.

use std::time::Duration;

use anyhow::Result;
use tracing::info;

use crate::config::{Provider, Settings};
use crate::llm::ai::ollama::OllamaAiClient;
use crate::llm::ai::openai::{ApiStyle, OpenAiAiClient, DEFAULT_AZURE_API_VERSION};
use crate::llm::ai::AiClient;

/// Builds the AI client for the configured provider.
///
/// `model_override` takes precedence over the configured model.
pub fn create_ai_client(
    settings: &Settings,
    model_override: Option<&str>,
    timeout: Duration,
) -> Result<Box<dyn AiClient>> {
    let model = model_override
        .map(str::to_string)
        .unwrap_or_else(|| settings.model());
    let provider = settings.provider();
    info!(%provider, %model, "Initializing AI client");

    let client: Box<dyn AiClient> = match provider {
        Provider::Azure => Box::new(OpenAiAiClient::new(
            ApiStyle::Azure {
                api_version: DEFAULT_AZURE_API_VERSION.to_string(),
            },
            settings.url.clone(),
            settings.key.clone(),
            model,
            timeout,
        )?),
        Provider::OpenAi => Box::new(OpenAiAiClient::new(
            ApiStyle::OpenAi,
            settings.url.clone(),
            settings.key.clone(),
            model,
            timeout,
        )?),
        Provider::Ollama => Box::new(OllamaAiClient::new(
            Some(settings.url.clone()).filter(|url| !url.is_empty()),
            model,
            timeout,
        )?),
    };
    Ok(client)
}
