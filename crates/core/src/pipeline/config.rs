//! Configuration for the pipeline controller.

use serde::{Deserialize, Serialize};

use crate::render::{RenderFormat, RenderQuality};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub render_quality: RenderQuality,

    #[serde(default = "default_render_format")]
    pub render_format: RenderFormat,

    /// Playback speed applied to the animation when muxing.
    #[serde(default = "default_speed_factor")]
    pub speed_factor: f64,

    /// Publish every completed session automatically.
    #[serde(default = "default_auto_publish")]
    pub auto_publish: bool,

    #[serde(default)]
    pub timeouts: StageTimeouts,
}

/// Upper bounds for each adapter call, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTimeouts {
    #[serde(default = "default_generation_timeout")]
    pub generation_secs: u64,

    #[serde(default = "default_synthesis_timeout")]
    pub synthesis_secs: u64,

    #[serde(default = "default_render_timeout")]
    pub render_secs: u64,

    #[serde(default = "default_mux_timeout")]
    pub mux_secs: u64,
}

fn default_render_format() -> RenderFormat {
    RenderFormat::Mp4
}

fn default_speed_factor() -> f64 {
    1.0
}

fn default_auto_publish() -> bool {
    true
}

fn default_generation_timeout() -> u64 {
    300
}

fn default_synthesis_timeout() -> u64 {
    300
}

fn default_render_timeout() -> u64 {
    900
}

fn default_mux_timeout() -> u64 {
    300
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            render_quality: RenderQuality::default(),
            render_format: default_render_format(),
            speed_factor: default_speed_factor(),
            auto_publish: default_auto_publish(),
            timeouts: StageTimeouts::default(),
        }
    }
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self {
            generation_secs: default_generation_timeout(),
            synthesis_secs: default_synthesis_timeout(),
            render_secs: default_render_timeout(),
            mux_secs: default_mux_timeout(),
        }
    }
}

impl StageTimeouts {
    /// Same bound for every stage.
    pub fn uniform(secs: u64) -> Self {
        Self {
            generation_secs: secs,
            synthesis_secs: secs,
            render_secs: secs,
            mux_secs: secs,
        }
    }
}

impl PipelineConfig {
    pub fn with_speed_factor(mut self, speed_factor: f64) -> Self {
        self.speed_factor = speed_factor;
        self
    }

    pub fn with_timeouts(mut self, timeouts: StageTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }
}
