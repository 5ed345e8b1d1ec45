//! OpenAI-compatible chat-completions client.
//!
//! Defaults to Groq's hosted endpoint; any service speaking the
//! `/chat/completions` protocol with `response_format` support works.

use super::{ChatMessage, CompletionRequest, LlmHttpConfig, LlmProvider, build_http_client};
use crate::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Chat-completions LLM client.
pub struct OpenAiClient {
    /// API endpoint.
    endpoint: String,
    /// Model to use.
    model: String,
    /// HTTP client.
    client: reqwest::blocking::Client,
}

impl OpenAiClient {
    /// Default API endpoint.
    pub const DEFAULT_ENDPOINT: &'static str = "https://api.groq.com/openai/v1";

    /// Default model.
    pub const DEFAULT_MODEL: &'static str = "llama-3.3-70b-versatile";

    /// Creates a new client with default endpoint, model and timeouts.
    #[must_use]
    pub fn new() -> Self {
        Self {
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
            client: build_http_client(LlmHttpConfig::default()),
        }
    }

    /// Sets the API endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets HTTP timeouts.
    #[must_use]
    pub fn with_http_config(mut self, config: LlmHttpConfig) -> Self {
        self.client = build_http_client(config);
        self
    }

    /// Returns the configured model.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }

    fn build_body<'a>(&'a self, request: &'a CompletionRequest) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages: &request.messages,
            response_format: request.json_output.then_some(ResponseFormat {
                kind: "json_object",
            }),
            temperature: request.temperature,
        }
    }
}

impl Default for OpenAiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmProvider for OpenAiClient {
    fn name(&self) -> &'static str {
        "openai-compatible"
    }

    fn complete(&self, credential: &SecretString, request: &CompletionRequest) -> Result<String> {
        let body = self.build_body(request);
        tracing::debug!(
            model = %self.model,
            messages = request.messages.len(),
            temperature = request.temperature,
            "Sending completion request"
        );

        let response = self
            .client
            .post(self.completions_url())
            .header(
                "Authorization",
                format!("Bearer {}", credential.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .map_err(|e| {
                metrics::counter!("remote_requests_total", "status" => "unreachable").increment(1);
                Error::OperationFailed {
                    operation: "remote_request".to_string(),
                    cause: e.to_string(),
                }
            })?;

        let status = response.status();
        let text = response.text().map_err(|e| Error::OperationFailed {
            operation: "remote_response".to_string(),
            cause: e.to_string(),
        })?;

        if !status.is_success() {
            metrics::counter!("remote_requests_total", "status" => "error").increment(1);
            tracing::warn!(status = status.as_u16(), "Remote service rejected request");
            return Err(Error::RemoteTransport {
                status: status.as_u16(),
                body: text,
            });
        }

        metrics::counter!("remote_requests_total", "status" => "success").increment(1);
        parse_completion(&text)
    }
}

/// Pulls the completion text out of a chat-completions envelope.
fn parse_completion(body: &str) -> Result<String> {
    let response: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| Error::RemoteSchema(format!("completion envelope: {e}. Body: {body}")))?;

    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| Error::RemoteSchema("no choices in completion response".to_string()))
}

/// Request to the Chat Completions API.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    temperature: f32,
}

/// Output format constraint.
#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Response from the Chat Completions API.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

/// A choice in the response.
#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

/// The message of a choice.
#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}
