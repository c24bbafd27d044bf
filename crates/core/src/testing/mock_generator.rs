//! Mock content generator for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;

use super::fixtures;
use crate::content::{ContentGenerator, ContentRequest, GeneratedContent, GenerationError};

/// Mock implementation of the ContentGenerator trait.
///
/// Returns `fixtures::sample_content` for the requested duration unless a
/// specific bundle was configured.
#[derive(Debug, Default)]
pub struct MockContentGenerator {
    requests: Mutex<Vec<ContentRequest>>,
    content: Mutex<Option<GeneratedContent>>,
    next_error: Mutex<Option<GenerationError>>,
    delay: Mutex<Option<Duration>>,
    panic_message: Mutex<Option<String>>,
}

impl MockContentGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return this bundle for every request.
    pub fn set_content(&self, content: GeneratedContent) {
        *self.content.lock() = Some(content);
    }

    pub fn set_next_error(&self, error: GenerationError) {
        *self.next_error.lock() = Some(error);
    }

    /// Sleep before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// Panic inside `generate`, simulating a bug in the adapter.
    pub fn set_panic(&self, message: &str) {
        *self.panic_message.lock() = Some(message.to_string());
    }

    pub fn recorded_requests(&self) -> Vec<ContentRequest> {
        self.requests.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl ContentGenerator for MockContentGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: ContentRequest) -> Result<GeneratedContent, GenerationError> {
        self.requests.lock().push(request.clone());

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let panic_message = self.panic_message.lock().clone();
        if let Some(message) = panic_message {
            panic!("{}", message);
        }

        if let Some(error) = self.next_error.lock().take() {
            return Err(error);
        }

        let configured = self.content.lock().clone();
        Ok(configured.unwrap_or_else(|| fixtures::sample_content(request.target_duration_secs)))
    }
}
