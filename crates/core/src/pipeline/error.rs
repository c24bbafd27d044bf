//! Error types for the pipeline module.

use thiserror::Error;

use crate::content::GenerationError;
use crate::narration::SynthesisError;
use crate::session::SessionError;

/// Reasons a pipeline run ends in `failed`.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Generation(#[from] GenerationError),

    #[error("{0}")]
    Synthesis(#[from] SynthesisError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize session snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl PipelineError {
    /// True for the two session-fatal adapter failures.
    pub fn is_stage_failure(&self) -> bool {
        matches!(self, Self::Generation(_) | Self::Synthesis(_))
    }

    /// Text stored on the failed session. Adapter messages are kept verbatim.
    pub fn session_message(&self) -> String {
        if self.is_stage_failure() {
            self.to_string()
        } else {
            format!("Internal pipeline error: {}", self)
        }
    }
}
