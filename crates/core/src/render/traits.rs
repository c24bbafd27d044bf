//! Trait definitions for the render module.

use async_trait::async_trait;

use super::error::RenderError;
use super::types::{RenderJob, RenderedVideo};

/// Renders a scene description into a silent video.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Returns the name of this renderer implementation.
    fn name(&self) -> &str;

    async fn render(&self, job: RenderJob) -> Result<RenderedVideo, RenderError>;

    /// Validates that the renderer is installed and ready.
    async fn validate(&self) -> Result<(), RenderError>;
}
