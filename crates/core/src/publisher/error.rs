//! Error types for the publisher module.

use std::path::PathBuf;
use thiserror::Error;

use crate::session::SessionId;

#[derive(Debug, Error)]
pub enum PublishError {
    /// No snapshot in durable storage for this session.
    #[error("Session not found: {0}")]
    NotFound(SessionId),

    #[error("Invalid session snapshot at {path}: {reason}")]
    InvalidSnapshot { path: PathBuf, reason: String },

    #[error("Failed to copy {source_path} to {destination}: {source}")]
    CopyFailed {
        source_path: PathBuf,
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PublishError {
    pub fn copy_failed(source_path: PathBuf, destination: PathBuf, source: std::io::Error) -> Self {
        Self::CopyFailed {
            source_path,
            destination,
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
