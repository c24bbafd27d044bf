//! Trait definitions for the mux module.

use async_trait::async_trait;

use super::error::MuxError;
use super::types::{MuxJob, MuxedVideo};

/// Combines a silent video and a narration track into one file.
#[async_trait]
pub trait Muxer: Send + Sync {
    fn name(&self) -> &str;

    /// Output is truncated to the shorter of the two inputs.
    async fn mux(&self, job: MuxJob) -> Result<MuxedVideo, MuxError>;

    async fn validate(&self) -> Result<(), MuxError>;
}
