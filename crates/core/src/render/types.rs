//! Types for the render module.

use serde::{Deserialize, Serialize};

use crate::content::SceneDescription;
use crate::media::MediaInfo;

/// Manim quality preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderQuality {
    /// 480p at 15 fps.
    #[default]
    Low,
    /// 720p at 30 fps.
    Medium,
    /// 1080p at 60 fps.
    High,
}

impl RenderQuality {
    /// Command line flag selecting this preset.
    pub fn flag(&self) -> &'static str {
        match self {
            Self::Low => "-ql",
            Self::Medium => "-qm",
            Self::High => "-qh",
        }
    }

    /// Directory Manim writes this preset's output to.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Low => "480p15",
            Self::Medium => "720p30",
            Self::High => "1080p60",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderFormat {
    #[default]
    Mp4,
    Mov,
    Gif,
}

impl RenderFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Mov => "mov",
            Self::Gif => "gif",
        }
    }
}

/// A scene to render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderJob {
    /// Unique id, used to isolate the job's scratch files.
    pub job_id: String,
    pub scene: SceneDescription,
    pub quality: RenderQuality,
    pub format: RenderFormat,
}

/// A rendered, silent video.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedVideo {
    pub bytes: Vec<u8>,
    pub format: RenderFormat,
    /// Probe result, when the output could be inspected.
    pub info: Option<MediaInfo>,
}
