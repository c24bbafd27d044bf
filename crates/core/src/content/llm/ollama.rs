//! Local models served by Ollama's `/api/generate`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{CompletionRequest, CompletionResponse, JsonTransport, LlmClient, LlmError, LlmUsage};

const DEFAULT_API_BASE: &str = "http://localhost:11434";

pub struct OllamaClient {
    transport: JsonTransport,
    model: String,
    api_base: String,
}

impl OllamaClient {
    pub fn new(model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            transport: JsonTransport::new(timeout),
            model: model.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn body(&self, request: CompletionRequest) -> GenerateRequest {
        GenerateRequest {
            model: self.model.clone(),
            prompt: request.prompt,
            system: request.system,
            stream: false,
            options: Options {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    stream: bool,
    options: Options,
}

#[derive(Debug, Serialize)]
struct Options {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    model: String,
    response: String,
    /// Both counts are absent when the prompt was served from cache.
    #[serde(default)]
    prompt_eval_count: u32,
    #[serde(default)]
    eval_count: u32,
}

impl GenerateResponse {
    fn into_completion(self) -> Result<CompletionResponse, LlmError> {
        if self.response.trim().is_empty() {
            return Err(LlmError::Empty(format!("{} returned no text", self.model)));
        }
        Ok(CompletionResponse {
            text: self.response,
            usage: LlmUsage {
                input_tokens: self.prompt_eval_count,
                output_tokens: self.eval_count,
            },
            model: self.model,
        })
    }
}

/// Ollama reports failures as a flat `{"error": "..."}`.
fn flat_error_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct FlatError {
        error: String,
    }
    serde_json::from_str::<FlatError>(body).ok().map(|e| e.error)
}

#[async_trait]
impl LlmClient for OllamaClient {
    fn provider(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let http = self
            .transport
            .post(format!("{}/api/generate", self.api_base))
            .json(&self.body(request));

        let parsed: GenerateResponse = self.transport.send(http, flat_error_message).await?;
        parsed.into_completion()
    }
}
