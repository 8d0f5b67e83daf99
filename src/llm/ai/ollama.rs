//! Local completion client for an Ollama server.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use super::{
    build_http_client, check_error_response, log_response_success, map_transport_error, AiClient,
    AiClientMetadata, GenerationOptions, Prompt, ResponseFormat,
};
use crate::llm::error::LlmError;

/// Default Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

#[derive(Serialize, Debug)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
}

#[derive(Deserialize, Debug)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    done: bool,
}

/// Local completion client. Roles are flattened into a single prompt.
pub struct OllamaAiClient {
    client: Client,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl OllamaAiClient {
    /// Creates a client for the given server and model.
    pub fn new(base_url: Option<String>, model: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout)?,
            model,
            base_url: base_url.unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            timeout,
        })
    }

    fn get_api_url(&self) -> Result<Url, LlmError> {
        let raw = format!("{}/api/generate", self.base_url.trim_end_matches('/'));
        Url::parse(&raw).map_err(|e| LlmError::InvalidEndpoint {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })
    }
}

impl AiClient for OllamaAiClient {
    fn generate<'a>(
        &'a self,
        prompt: &'a Prompt,
        options: &'a GenerationOptions,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            let request = GenerateRequest {
                model: &self.model,
                prompt: prompt.combined(),
                stream: false,
                format: match options.response_format {
                    ResponseFormat::JsonObject => Some("json"),
                    ResponseFormat::Text => None,
                },
            };

            let api_url = self.get_api_url()?;
            info!(url = %api_url, model = %self.model, "Sending request to Ollama");

            let response = self
                .client
                .post(api_url)
                .json(&request)
                .send()
                .await
                .map_err(|e| map_transport_error(&e, self.timeout))?;
            let response = check_error_response(response).await?;

            let body: GenerateResponse = response
                .json()
                .await
                .map_err(|e| LlmError::InvalidResponseFormat(e.to_string()))?;
            debug!(done = body.done, "Received Ollama response");

            let result: Result<String> = body
                .response
                .filter(|text| !text.is_empty())
                .ok_or_else(|| {
                    LlmError::InvalidResponseFormat("Empty response from Ollama".to_string())
                        .into()
                });

            log_response_success("Ollama", &result);
            result
        })
    }

    fn get_metadata(&self) -> AiClientMetadata {
        AiClientMetadata {
            provider: "Ollama".to_string(),
            model: self.model.clone(),
        }
    }
}
