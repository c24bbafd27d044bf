//! Configuration for the Manim renderer.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RendererConfig {
    /// Path to the manim executable.
    #[serde(default = "default_manim_path")]
    pub manim_path: PathBuf,

    /// Scratch directory; each job gets its own subdirectory.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Hard limit for a single render.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Keep job directories after rendering (useful when debugging scenes).
    #[serde(default)]
    pub keep_work_dirs: bool,
}

fn default_manim_path() -> PathBuf {
    PathBuf::from("manim")
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("edapt-render")
}

fn default_timeout() -> u64 {
    900
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            manim_path: default_manim_path(),
            work_dir: default_work_dir(),
            timeout_secs: default_timeout(),
            keep_work_dirs: false,
        }
    }
}

impl RendererConfig {
    pub fn with_manim_path(mut self, path: PathBuf) -> Self {
        self.manim_path = path;
        self
    }

    pub fn with_work_dir(mut self, work_dir: PathBuf) -> Self {
        self.work_dir = work_dir;
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}
