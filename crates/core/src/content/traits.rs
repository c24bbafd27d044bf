//! Trait definitions for the content module.

use async_trait::async_trait;

use super::error::GenerationError;
use super::types::{ContentRequest, GeneratedContent};

/// Produces the topic, mindmap, narrative and scene script for a query.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Returns the name of this generator implementation.
    fn name(&self) -> &str;

    async fn generate(&self, request: ContentRequest) -> Result<GeneratedContent, GenerationError>;
}
