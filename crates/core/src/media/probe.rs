//! Media inspection through ffprobe.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;

/// Information about a media file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub duration_secs: f64,
    /// Container format (first entry of ffprobe's `format_name`).
    pub format: String,
    pub audio_codec: Option<String>,
    pub video_codec: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<f32>,
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("FFprobe not found at path: {path}")]
    FfprobeNotFound { path: PathBuf },

    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Failed to probe media file: {reason}")]
    ProbeFailed { reason: String },

    #[error("Failed to parse media info: {reason}")]
    ParseError { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reads duration, resolution and codecs of a media file.
#[async_trait]
pub trait MediaProber: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<MediaInfo, ProbeError>;
}

/// Probes files by running `ffprobe -print_format json`.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    ffprobe_path: PathBuf,
}

impl FfprobeProber {
    pub fn new(ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }

    /// Parses ffprobe JSON output into MediaInfo.
    pub(crate) fn parse_probe_output(path: &Path, output: &str) -> Result<MediaInfo, ProbeError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            format: ProbeFormat,
            #[serde(default)]
            streams: Vec<ProbeStream>,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            format_name: String,
            duration: Option<String>,
            size: Option<String>,
        }

        #[derive(Deserialize)]
        struct ProbeStream {
            codec_type: String,
            codec_name: Option<String>,
            width: Option<u32>,
            height: Option<u32>,
            r_frame_rate: Option<String>,
        }

        let probe: ProbeOutput =
            serde_json::from_str(output).map_err(|e| ProbeError::ParseError {
                reason: format!("Failed to parse ffprobe output: {}", e),
            })?;

        let audio = probe.streams.iter().find(|s| s.codec_type == "audio");
        let video = probe.streams.iter().find(|s| s.codec_type == "video");

        Ok(MediaInfo {
            path: path.to_path_buf(),
            size_bytes: probe
                .format
                .size
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            duration_secs: probe
                .format
                .duration
                .as_deref()
                .and_then(|d| d.parse().ok())
                .unwrap_or(0.0),
            format: probe
                .format
                .format_name
                .split(',')
                .next()
                .unwrap_or("unknown")
                .to_string(),
            audio_codec: audio.and_then(|s| s.codec_name.clone()),
            video_codec: video.and_then(|s| s.codec_name.clone()),
            width: video.and_then(|s| s.width),
            height: video.and_then(|s| s.height),
            fps: video
                .and_then(|s| s.r_frame_rate.as_deref())
                .and_then(parse_frame_rate),
        })
    }
}

/// Parses "30/1" or "24000/1001" style rates.
fn parse_frame_rate(rate: &str) -> Option<f32> {
    match rate.split_once('/') {
        Some((num, den)) => {
            let num = num.parse::<f32>().ok()?;
            let den = den.parse::<f32>().ok()?;
            (den > 0.0).then(|| num / den)
        }
        None => rate.parse().ok(),
    }
}

#[async_trait]
impl MediaProber for FfprobeProber {
    async fn probe(&self, path: &Path) -> Result<MediaInfo, ProbeError> {
        if !path.exists() {
            return Err(ProbeError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ProbeError::FfprobeNotFound {
                        path: self.ffprobe_path.clone(),
                    }
                } else {
                    ProbeError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(ProbeError::ProbeFailed {
                reason: format!(
                    "ffprobe failed: {}",
                    String::from_utf8_lossy(&output.stderr)
                ),
            });
        }

        Self::parse_probe_output(path, &String::from_utf8_lossy(&output.stdout))
    }
}
