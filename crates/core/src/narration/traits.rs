//! Trait definitions for the narration module.

use async_trait::async_trait;

use super::error::SynthesisError;
use super::types::SynthesizedAudio;

/// Turns narration text into speech.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Returns the name of this synthesizer implementation.
    fn name(&self) -> &str;

    /// Synthesizes the full narration and reports the resulting audio duration.
    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio, SynthesisError>;
}
