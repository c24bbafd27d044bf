//! Mock LLM client for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

use crate::content::{CompletionRequest, CompletionResponse, LlmClient, LlmError, LlmUsage};

/// Scripted LLM client: answers prompts from a queue of canned responses.
#[derive(Debug, Default)]
pub struct MockLlmClient {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    next_error: Mutex<Option<LlmError>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the text returned by the next unanswered completion.
    pub fn push_response(&self, text: &str) {
        self.responses.lock().push_back(text.to_string());
    }

    /// Fail the next completion with this error.
    pub fn set_next_error(&self, error: LlmError) {
        *self.next_error.lock() = Some(error);
    }

    /// Prompts received so far, in call order.
    pub fn recorded_prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    fn provider(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.prompts.lock().push(request.prompt.clone());

        if let Some(error) = self.next_error.lock().take() {
            return Err(error);
        }

        let text = self.responses.lock().pop_front().ok_or_else(|| LlmError::Api {
            status: 500,
            message: "no scripted response left".to_string(),
        })?;

        Ok(CompletionResponse {
            usage: LlmUsage {
                input_tokens: request.prompt.split_whitespace().count() as u32,
                output_tokens: text.split_whitespace().count() as u32,
            },
            text,
            model: "mock-model".to_string(),
        })
    }
}
