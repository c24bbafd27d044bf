//! Error types for the render module.

use std::path::PathBuf;
use thiserror::Error;

/// Lines of process output kept when describing a failure.
const OUTPUT_TAIL_LINES: usize = 20;

/// Errors from animation rendering. Recorded on the video artifact, never fatal.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Manim not found at path: {path}")]
    ManimNotFound { path: PathBuf },

    /// The renderer ran and failed. Carries its captured output.
    #[error("Render failed: {reason}")]
    ProcessFailed {
        reason: String,
        stdout: Option<String>,
        stderr: Option<String>,
    },

    #[error("Rendered video not found at {path}")]
    OutputMissing { path: PathBuf },

    #[error("Render timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    pub fn process_failed(
        reason: impl Into<String>,
        stdout: Option<String>,
        stderr: Option<String>,
    ) -> Self {
        Self::ProcessFailed {
            reason: reason.into(),
            stdout: stdout.filter(|s| !s.trim().is_empty()),
            stderr: stderr.filter(|s| !s.trim().is_empty()),
        }
    }

    /// The error message followed by the tail of the captured output, if any.
    pub fn describe(&self) -> String {
        match self {
            Self::ProcessFailed { stdout, stderr, .. } => {
                let mut text = self.to_string();
                for (label, output) in [("stderr", stderr), ("stdout", stdout)] {
                    if let Some(output) = output {
                        text.push_str(&format!("\n--- {} ---\n{}", label, tail(output)));
                    }
                }
                text
            }
            _ => self.to_string(),
        }
    }
}

fn tail(output: &str) -> String {
    let lines: Vec<&str> = output.trim_end().lines().collect();
    let start = lines.len().saturating_sub(OUTPUT_TAIL_LINES);
    lines[start..].join("\n")
}
