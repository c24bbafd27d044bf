//! FFmpeg-based muxer implementation.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

use super::error::MuxError;
use super::traits::Muxer;
use super::types::{MuxJob, MuxedVideo};
use crate::media::{MediaConfig, MediaProber};

pub struct FfmpegMuxer {
    config: MediaConfig,
    prober: Arc<dyn MediaProber>,
}

impl FfmpegMuxer {
    pub fn new(config: MediaConfig, prober: Arc<dyn MediaProber>) -> Self {
        Self { config, prober }
    }

    fn output_path(&self, job: &MuxJob) -> PathBuf {
        self.config.work_dir.join(format!("{}.mp4", job.job_id))
    }

    /// Builds ffmpeg arguments for a mux job.
    fn build_args(&self, job: &MuxJob, output_path: &Path) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-i".to_string(),
            job.video_path.to_string_lossy().to_string(),
            "-i".to_string(),
            job.audio_path.to_string_lossy().to_string(),
        ];

        if job.changes_speed() {
            // setpts scales presentation timestamps, so a faster speed means a smaller factor
            args.extend([
                "-filter:v".to_string(),
                format!("setpts={}*PTS", 1.0 / job.speed_factor),
            ]);
        }
        if job.needs_reencode() {
            args.extend([
                "-c:v".to_string(),
                "libx264".to_string(),
                "-pix_fmt".to_string(),
                "yuv420p".to_string(),
            ]);
        } else {
            args.extend(["-c:v".to_string(), "copy".to_string()]);
        }

        args.extend([
            "-c:a".to_string(),
            "aac".to_string(),
            "-shortest".to_string(),
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
        ]);

        args.push(output_path.to_string_lossy().to_string());
        args
    }

    async fn run_mux(&self, job: &MuxJob, output_path: &Path) -> Result<MuxedVideo, MuxError> {
        for input in [&job.video_path, &job.audio_path] {
            if !input.exists() {
                return Err(MuxError::InputNotFound {
                    path: input.clone(),
                });
            }
        }
        if !job.speed_factor.is_finite() || job.speed_factor <= 0.0 {
            return Err(MuxError::InvalidSpeed(job.speed_factor));
        }

        tokio::fs::create_dir_all(&self.config.work_dir).await?;

        let args = self.build_args(job, output_path);
        debug!(job_id = %job.job_id, ?args, "starting ffmpeg");

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    MuxError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    MuxError::Io(e)
                }
            })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("ffmpeg stderr was not captured"))?;
        let mut reader = BufReader::new(stderr).lines();

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let result = timeout(timeout_duration, async {
            let mut error_output = String::new();
            while let Ok(Some(line)) = reader.next_line().await {
                if line.contains("Error") || line.contains("error") {
                    error_output.push_str(&line);
                    error_output.push('\n');
                }
            }
            let status = child.wait().await?;
            Ok::<(std::process::ExitStatus, String), std::io::Error>((status, error_output))
        })
        .await;

        match result {
            Ok(Ok((status, error_output))) => {
                if !status.success() {
                    return Err(MuxError::process_failed(
                        format!("FFmpeg exited with code: {:?}", status.code()),
                        Some(error_output),
                    ));
                }
            }
            Ok(Err(e)) => return Err(MuxError::Io(e)),
            Err(_) => {
                let _ = child.kill().await;
                return Err(MuxError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                });
            }
        }

        let bytes = match tokio::fs::read(output_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MuxError::OutputMissing {
                    path: output_path.to_path_buf(),
                })
            }
            Err(e) => return Err(MuxError::Io(e)),
        };

        let info = match self.prober.probe(output_path).await {
            Ok(info) => Some(info),
            Err(e) => {
                warn!(job_id = %job.job_id, error = %e, "Could not probe muxed video");
                None
            }
        };

        Ok(MuxedVideo { bytes, info })
    }
}

#[async_trait]
impl Muxer for FfmpegMuxer {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn mux(&self, job: MuxJob) -> Result<MuxedVideo, MuxError> {
        let start = Instant::now();
        let output_path = self.output_path(&job);

        let result = self.run_mux(&job, &output_path).await;

        if let Err(e) = tokio::fs::remove_file(&output_path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(job_id = %job.job_id, error = %e, "Failed to remove mux output");
            }
        }

        if let Ok(ref video) = result {
            info!(
                job_id = %job.job_id,
                bytes = video.bytes.len(),
                speed_factor = job.speed_factor,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "narration muxed"
            );
        }
        result
    }

    async fn validate(&self) -> Result<(), MuxError> {
        let result = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .output()
            .await;

        if let Err(e) = result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(MuxError::FfmpegNotFound {
                    path: self.config.ffmpeg_path.clone(),
                });
            }
            return Err(MuxError::Io(e));
        }

        tokio::fs::create_dir_all(&self.config.work_dir).await?;
        Ok(())
    }
}
