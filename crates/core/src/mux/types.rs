//! Types for combining a silent video with a narration track.

use std::path::PathBuf;

use crate::media::MediaInfo;

#[derive(Debug, Clone)]
pub struct MuxJob {
    /// Used to name the scratch output.
    pub job_id: String,
    pub video_path: PathBuf,
    pub audio_path: PathBuf,
    /// Playback speed applied to the video stream. 1.0 leaves it untouched.
    pub speed_factor: f64,
}

impl MuxJob {
    pub fn new(job_id: impl Into<String>, video_path: PathBuf, audio_path: PathBuf) -> Self {
        Self {
            job_id: job_id.into(),
            video_path,
            audio_path,
            speed_factor: 1.0,
        }
    }

    pub fn with_speed(mut self, speed_factor: f64) -> Self {
        self.speed_factor = speed_factor;
        self
    }

    pub fn changes_speed(&self) -> bool {
        (self.speed_factor - 1.0).abs() > f64::EPSILON
    }

    /// True when the video stream cannot be stream-copied into an mp4.
    ///
    /// Only h264 from an mp4 or mov render can be copied; a gif render has
    /// no stream an mp4 container accepts.
    pub fn needs_reencode(&self) -> bool {
        self.changes_speed() || !self.source_is_mp4_compatible()
    }

    fn source_is_mp4_compatible(&self) -> bool {
        self.video_path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("mp4") || ext.eq_ignore_ascii_case("mov"))
    }
}

#[derive(Debug, Clone)]
pub struct MuxedVideo {
    pub bytes: Vec<u8>,
    pub info: Option<MediaInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(video: &str) -> MuxJob {
        MuxJob::new("j", PathBuf::from(video), PathBuf::from("narration.mp3"))
    }

    #[test]
    fn test_needs_reencode() {
        assert!(!job("animation.mp4").needs_reencode());
        assert!(!job("animation.MOV").needs_reencode());
        assert!(job("animation.gif").needs_reencode());
        assert!(job("animation").needs_reencode());
        assert!(job("animation.mp4").with_speed(1.5).needs_reencode());
    }
}
