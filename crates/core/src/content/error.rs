//! Error types for the content module.

use thiserror::Error;

use super::llm::LlmError;
use crate::session::TimelineError;

/// Errors from the content generation stage. Always fatal to the session.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The language model call failed.
    #[error("Language model request failed during {step}: {source}")]
    Llm {
        step: &'static str,
        #[source]
        source: LlmError,
    },

    /// The model answered but the answer is unusable.
    #[error("Invalid {step} response: {reason}")]
    InvalidResponse { step: &'static str, reason: String },

    /// The narrative does not form a valid timeline.
    #[error("Invalid narrative timeline: {0}")]
    Timeline(#[from] TimelineError),

    #[error("Content generation timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },
}

impl GenerationError {
    pub fn llm(step: &'static str, source: LlmError) -> Self {
        Self::Llm { step, source }
    }

    pub fn invalid_response(step: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            step,
            reason: reason.into(),
        }
    }
}
