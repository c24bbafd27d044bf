//! Configuration for the ffmpeg toolchain.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Locations of ffmpeg/ffprobe and the scratch space used while muxing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Path to ffprobe binary.
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,

    /// Scratch directory for intermediate outputs.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[serde(default = "default_log_level")]
    pub ffmpeg_log_level: String,

    /// Hard limit for a single ffmpeg invocation.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("edapt-media")
}

fn default_log_level() -> String {
    "error".to_string()
}

fn default_timeout() -> u64 {
    600
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            work_dir: default_work_dir(),
            ffmpeg_log_level: default_log_level(),
            timeout_secs: default_timeout(),
        }
    }
}

impl MediaConfig {
    pub fn with_paths(ffmpeg_path: PathBuf, ffprobe_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            ffprobe_path,
            ..Default::default()
        }
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
