//! Error types for the narration module.

use thiserror::Error;

/// Errors from narration synthesis. Always fatal to the session.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Narration synthesis not configured: {0}")]
    NotConfigured(String),

    #[error("Narration text is empty")]
    EmptyText,

    #[error("Narration text of {bytes} bytes exceeds the {max_bytes} byte limit for this encoding")]
    TextTooLong { bytes: usize, max_bytes: usize },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("TTS API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid TTS response: {0}")]
    InvalidResponse(String),

    #[error("Narration synthesis timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
