//! Language model clients used by content generation.
//!
//! Each provider lives in its own module and speaks its own wire format; they
//! share [`JsonTransport`] for sending a request and mapping HTTP failures.

mod anthropic;
mod gemini;
mod ollama;

pub use anthropic::AnthropicClient;
pub use gemini::GeminiClient;
pub use ollama::OllamaClient;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(String),

    /// The provider answered successfully but produced no text.
    #[error("Empty completion: {0}")]
    Empty(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Not configured: {0}")]
    NotConfigured(String),
}

/// Token usage statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// One prompt sent to a model.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub max_tokens: u32,
    /// 0.0 is deterministic
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            max_tokens: 1024,
            temperature: 0.0,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub text: String,
    pub usage: LlmUsage,
    /// Model that actually answered, as reported by the provider.
    pub model: String,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Provider name, used as the token metric label.
    fn provider(&self) -> &str;

    fn model(&self) -> &str;

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

/// `{"error": {"message": ...}}`, the error body Anthropic and Google both use.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

fn nested_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|e| e.error.message)
}

/// An HTTP client with a fixed per-request deadline.
#[derive(Clone)]
struct JsonTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl JsonTransport {
    fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client, timeout }
    }

    fn post(&self, url: String) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .header("content-type", "application/json")
    }

    /// Sends `request` and decodes a 2xx body as `T`.
    ///
    /// Non-2xx answers become [`LlmError::Api`], with the message pulled out
    /// of the body by `error_message` when it recognises the shape.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        error_message: fn(&str) -> Option<String>,
    ) -> Result<T, LlmError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(self.timeout)
            } else {
                LlmError::Http(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body).unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| LlmError::Json(e.to_string()))
    }
}
