//! Hosted chat-completion client (Azure OpenAI and OpenAI-compatible APIs).

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

/// API version sent to Azure deployments. JSON-object output needs 2023-12 or later.
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-06-01";

/// Chat-completion request message.
#[derive(Serialize, Debug)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

/// `response_format` directive.
#[derive(Serialize, Debug)]
struct ResponseFormatDirective {
    #[serde(rename = "type")]
    format_type: &'static str,
}

/// Chat-completion request body.
#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormatDirective>,
    stream: bool,
}

/// Chat-completion response choice.
#[derive(Deserialize, Debug)]
struct Choice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

/// Chat-completion response message.
#[derive(Deserialize, Debug)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completion response.
#[derive(Deserialize, Debug)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    model: Option<String>,
}

/// How the endpoint is addressed and authenticated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiStyle {
    /// `{url}/openai/deployments/{deployment}/chat/completions?api-version=…`
    /// with an `api-key` header.
    Azure {
        /// Value of the `api-version` query parameter.
        api_version: String,
    },
    /// `{url}/v1/chat/completions` with a bearer token.
    OpenAi,
}

/// Hosted structured-completion client.
pub struct OpenAiAiClient {
    /// HTTP client for API requests.
    client: Client,
    /// Endpoint addressing style.
    style: ApiStyle,
    /// API key for authentication.
    api_key: String,
    /// Model identifier (Azure derives the deployment name from it).
    model: String,
    /// Base URL for the API.
    base_url: String,
    /// Request timeout, reported back on expiry.
    timeout: Duration,
}

impl OpenAiAiClient {
    /// Creates a new hosted client.
    pub fn new(
        style: ApiStyle,
        base_url: String,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout)?,
            style,
            api_key,
            model,
            base_url,
            timeout,
        })
    }

    /// Azure deployment name for the model: dots and colons are not allowed.
    fn deployment(&self) -> String {
        self.model.replace(['.', ':'], "")
    }

    /// Builds the full API URL.
    fn get_api_url(&self) -> Result<Url, LlmError> {
        let base = self.base_url.trim_end_matches('/');
        let raw = match self.style {
            ApiStyle::Azure { .. } => format!(
                "{base}/openai/deployments/{}/chat/completions",
                self.deployment()
            ),
            ApiStyle::OpenAi => format!("{base}/v1/chat/completions"),
        };

        let mut url = Url::parse(&raw).map_err(|e| LlmError::InvalidEndpoint {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        if let ApiStyle::Azure { api_version } = &self.style {
            url.query_pairs_mut().append_pair("api-version", api_version);
        }

        debug!(base_url = %self.base_url, full_url = %url, "Constructed completion API URL");
        Ok(url)
    }

    fn provider_name(&self) -> &'static str {
        match self.style {
            ApiStyle::Azure { .. } => "Azure OpenAI",
            ApiStyle::OpenAi => "OpenAI",
        }
    }
}

impl AiClient for OpenAiAiClient {
    fn generate<'a>(
        &'a self,
        prompt: &'a Prompt,
        options: &'a GenerationOptions,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            debug!(
                system_messages = prompt.system.len(),
                prompt_len = prompt.len(),
                model = %self.model,
                base_url = %self.base_url,
                "Preparing chat-completion request"
            );

            let mut messages: Vec<Message<'_>> = prompt
                .system
                .iter()
                .map(|content| Message {
                    role: "system",
                    content,
                })
                .collect();
            messages.push(Message {
                role: "user",
                content: &prompt.user,
            });

            let request = ChatRequest {
                model: &self.model,
                messages,
                response_format: match options.response_format {
                    ResponseFormat::JsonObject => Some(ResponseFormatDirective {
                        format_type: "json_object",
                    }),
                    ResponseFormat::Text => None,
                },
                stream: false,
            };

            let api_url = self.get_api_url()?;
            info!(url = %api_url, model = %self.model, "Sending request to {}", self.provider_name());

            let req_builder = self.client.post(api_url).json(&request);
            let req_builder = match self.style {
                ApiStyle::Azure { .. } => req_builder.header("api-key", &self.api_key),
                ApiStyle::OpenAi => req_builder.bearer_auth(&self.api_key),
            };

            let response = req_builder
                .send()
                .await
                .map_err(|e| map_transport_error(&e, self.timeout))?;
            let response = check_error_response(response).await?;

            let chat_response: ChatResponse = response
                .json()
                .await
                .map_err(|e| LlmError::InvalidResponseFormat(e.to_string()))?;

            debug!(
                choice_count = chat_response.choices.len(),
                model = ?chat_response.model,
                finish_reason = ?chat_response.choices.first().and_then(|c| c.finish_reason.as_deref()),
                "Received chat-completion response"
            );

            let result: Result<String> = chat_response
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .ok_or_else(|| {
                    LlmError::InvalidResponseFormat("No message content in response".to_string())
                        .into()
                });

            log_response_success(self.provider_name(), &result);
            result
        })
    }

    fn get_metadata(&self) -> AiClientMetadata {
        AiClientMetadata {
            provider: self.provider_name().to_string(),
            model: self.model.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn azure_with(base_url: &str, api_key: &str, model: &str) -> OpenAiAiClient {
        OpenAiAiClient::new(
            ApiStyle::Azure {
                api_version: DEFAULT_AZURE_API_VERSION.to_string(),
            },
            base_url.to_string(),
            api_key.to_string(),
            model.to_string(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn azure(base_url: &str) -> OpenAiAiClient {
        azure_with(base_url, "secret", "gpt-4o")
    }

    fn openai(base_url: &str, api_key: &str) -> OpenAiAiClient {
        OpenAiAiClient::new(
            ApiStyle::OpenAi,
            base_url.to_string(),
            api_key.to_string(),
            "gpt-4o".to_string(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({
            "model": "gpt-4o",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }]
        })
    }

    #[test]
    fn azure_url_includes_deployment_and_api_version() {
        let client = azure("https://example.openai.azure.com/");
        let url = client.get_api_url().unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-06-01"
        );
    }

    #[test]
    fn azure_deployment_strips_dots() {
        let client = azure_with("https://example.openai.azure.com", "k", "gpt-3.5-turbo");
        assert_eq!(client.deployment(), "gpt-35-turbo");
    }

    #[test]
    fn openai_url_trailing_slash() {
        let client = openai("https://api.openai.com/", "k");
        assert_eq!(
            client.get_api_url().unwrap().as_str(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let client = azure("not a url");
        assert!(matches!(
            client.get_api_url(),
            Err(LlmError::InvalidEndpoint { .. })
        ));
    }

    #[tokio::test]
    async fn azure_request_returns_first_choice_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/deployments/gpt-4o/chat/completions"))
            .and(query_param("api-version", DEFAULT_AZURE_API_VERSION))
            .and(header("api-key", "secret"))
            .and(body_partial_json(json!({
                "response_format": {"type": "json_object"},
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "my diff is:\n+x"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("{\"headline\":\"x\"}")))
            .expect(1)
            .mount(&server)
            .await;

        let client = azure(&server.uri());
        let prompt = Prompt::new("my diff is:\n+x").with_system("be brief");
        let text = client
            .generate(&prompt, &GenerationOptions::json_object())
            .await
            .unwrap();
        assert_eq!(text, "{\"headline\":\"x\"}");
    }

    #[tokio::test]
    async fn openai_request_uses_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("hello")))
            .expect(1)
            .mount(&server)
            .await;

        let client = openai(&server.uri(), "sk-test");
        let text = client
            .generate(&Prompt::new("hi"), &GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn http_error_is_api_request_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let err = azure(&server.uri())
            .generate(&Prompt::new("hi"), &GenerationOptions::json_object())
            .await
            .unwrap_err();
        match err.downcast_ref::<LlmError>() {
            Some(LlmError::ApiRequestFailed(msg)) => {
                assert!(msg.contains("401"));
                assert!(msg.contains("bad key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_choices_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = azure(&server.uri())
            .generate(&Prompt::new("hi"), &GenerationOptions::json_object())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LlmError>(),
            Some(LlmError::InvalidResponseFormat(_))
        ));
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion("late"))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let client = OpenAiAiClient::new(
            ApiStyle::OpenAi,
            server.uri(),
            "k".to_string(),
            "gpt-4o".to_string(),
            Duration::from_millis(100),
        )
        .unwrap();
        let err = client
            .generate(&Prompt::new("hi"), &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LlmError>(),
            Some(LlmError::Timeout(_))
        ));
    }

    #[test]
    fn metadata_reports_provider() {
        let meta = azure("https://example.openai.azure.com").get_metadata();
        assert_eq!(meta.provider, "Azure OpenAI");
        assert_eq!(meta.model, "gpt-4o");
    }
}
