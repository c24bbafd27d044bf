//! Mock muxer for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::mock_synthesizer::mock_audio_duration;
use crate::media::MediaInfo;
use crate::mux::{MuxError, MuxJob, MuxedVideo, Muxer};

/// Mock implementation of the Muxer trait.
///
/// Like the real muxer it requires both inputs to exist; the output is the
/// video bytes followed by the audio bytes. With `-shortest` the narration
/// bounds the result, so the reported duration is the one carried by a
/// [`mock_audio`](super::mock_audio) clip.
#[derive(Debug, Default)]
pub struct MockMuxer {
    jobs: Mutex<Vec<MuxJob>>,
    next_error: Mutex<Option<MuxError>>,
    delay: Mutex<Option<Duration>>,
}

impl MockMuxer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_next_error(&self, error: MuxError) {
        *self.next_error.lock() = Some(error);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub fn recorded_jobs(&self) -> Vec<MuxJob> {
        self.jobs.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.jobs.lock().len()
    }
}

#[async_trait]
impl Muxer for MockMuxer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn mux(&self, job: MuxJob) -> Result<MuxedVideo, MuxError> {
        self.jobs.lock().push(job.clone());

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.next_error.lock().take() {
            return Err(error);
        }

        let video = read_input(&job.video_path).await?;
        let audio = read_input(&job.audio_path).await?;

        let info = mock_audio_duration(&audio).map(|duration_secs| MediaInfo {
            path: PathBuf::from(format!("{}.mp4", job.job_id)),
            size_bytes: (video.len() + audio.len()) as u64,
            duration_secs,
            format: "mov".to_string(),
            audio_codec: Some("aac".to_string()),
            video_codec: Some("h264".to_string()),
            width: Some(854),
            height: Some(480),
            fps: Some(15.0),
        });

        Ok(MuxedVideo {
            bytes: [video, audio].concat(),
            info,
        })
    }

    async fn validate(&self) -> Result<(), MuxError> {
        Ok(())
    }
}

async fn read_input(path: &Path) -> Result<Vec<u8>, MuxError> {
    tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            MuxError::InputNotFound {
                path: path.to_path_buf(),
            }
        } else {
            MuxError::Io(e)
        }
    })
}
