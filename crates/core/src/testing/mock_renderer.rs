//! Mock renderer for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;

use crate::render::{RenderError, RenderJob, RenderedVideo, Renderer};

pub const MOCK_SILENT_VIDEO: &[u8] = b"mock-silent-video";

/// Mock implementation of the Renderer trait.
#[derive(Debug, Default)]
pub struct MockRenderer {
    jobs: Mutex<Vec<RenderJob>>,
    next_error: Mutex<Option<RenderError>>,
    delay: Mutex<Option<Duration>>,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_next_error(&self, error: RenderError) {
        *self.next_error.lock() = Some(error);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub fn recorded_jobs(&self) -> Vec<RenderJob> {
        self.jobs.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.jobs.lock().len()
    }
}

#[async_trait]
impl Renderer for MockRenderer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn render(&self, job: RenderJob) -> Result<RenderedVideo, RenderError> {
        self.jobs.lock().push(job.clone());

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.next_error.lock().take() {
            return Err(error);
        }

        Ok(RenderedVideo {
            bytes: MOCK_SILENT_VIDEO.to_vec(),
            format: job.format,
            info: None,
        })
    }

    async fn validate(&self) -> Result<(), RenderError> {
        Ok(())
    }
}
