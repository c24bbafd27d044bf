//! Error types for the mux module.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MuxError {
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Muxing failed: {reason}")]
    ProcessFailed {
        reason: String,
        stderr: Option<String>,
    },

    #[error("Muxed output not created: {path}")]
    OutputMissing { path: PathBuf },

    #[error("Muxing timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    #[error("Invalid speed factor: {0}")]
    InvalidSpeed(f64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MuxError {
    pub fn process_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ProcessFailed {
            reason: reason.into(),
            stderr: stderr.filter(|s| !s.trim().is_empty()),
        }
    }

    /// The error message plus any captured ffmpeg error lines.
    pub fn describe(&self) -> String {
        match self {
            Self::ProcessFailed {
                stderr: Some(stderr),
                ..
            } => format!("{}\n--- stderr ---\n{}", self, stderr.trim_end()),
            _ => self.to_string(),
        }
    }
}
