//! Manim-based renderer implementation.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

use super::config::RendererConfig;
use super::error::RenderError;
use super::traits::Renderer;
use super::types::{RenderJob, RenderedVideo};
use crate::media::MediaProber;

/// File name the scene script is written to. Manim names its output folder after the stem.
const SCENE_FILE: &str = "scene.py";

pub struct ManimRenderer {
    config: RendererConfig,
    prober: Arc<dyn MediaProber>,
}

impl ManimRenderer {
    pub fn new(config: RendererConfig, prober: Arc<dyn MediaProber>) -> Self {
        Self { config, prober }
    }

    fn job_dir(&self, job: &RenderJob) -> PathBuf {
        self.config.work_dir.join(&job.job_id)
    }

    /// Builds manim arguments for a job whose script lives in `job_dir`.
    fn build_args(&self, job: &RenderJob, job_dir: &Path) -> Vec<String> {
        vec![
            job.quality.flag().to_string(),
            job_dir.join(SCENE_FILE).to_string_lossy().to_string(),
            job.scene.scene_name.clone(),
            "--format".to_string(),
            job.format.extension().to_string(),
            "--media_dir".to_string(),
            job_dir.join("media").to_string_lossy().to_string(),
        ]
    }

    /// Where manim leaves the rendered file for this job.
    fn expected_output(job: &RenderJob, job_dir: &Path) -> PathBuf {
        let stem = Path::new(SCENE_FILE)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "scene".to_string());
        job_dir
            .join("media")
            .join("videos")
            .join(stem)
            .join(job.quality.dir_name())
            .join(format!("{}.{}", job.scene.scene_name, job.format.extension()))
    }

    async fn run_render(&self, job: &RenderJob, job_dir: &Path) -> Result<RenderedVideo, RenderError> {
        tokio::fs::create_dir_all(job_dir).await?;
        tokio::fs::write(job_dir.join(SCENE_FILE), &job.scene.code).await?;

        let args = self.build_args(job, job_dir);
        debug!(job_id = %job.job_id, ?args, "starting manim");

        let child = Command::new(&self.config.manim_path)
            .args(&args)
            .current_dir(job_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    RenderError::ManimNotFound {
                        path: self.config.manim_path.clone(),
                    }
                } else {
                    RenderError::Io(e)
                }
            })?;

        // Dropping the child on timeout kills the process.
        let output = match timeout(
            Duration::from_secs(self.config.timeout_secs),
            child.wait_with_output(),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(RenderError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                })
            }
        };

        if !output.status.success() {
            return Err(RenderError::process_failed(
                format!("manim exited with code: {:?}", output.status.code()),
                Some(String::from_utf8_lossy(&output.stdout).to_string()),
                Some(String::from_utf8_lossy(&output.stderr).to_string()),
            ));
        }

        let output_path = Self::expected_output(job, job_dir);
        let bytes = match tokio::fs::read(&output_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RenderError::OutputMissing { path: output_path })
            }
            Err(e) => return Err(RenderError::Io(e)),
        };

        let info = match self.prober.probe(&output_path).await {
            Ok(info) => Some(info),
            Err(e) => {
                warn!(job_id = %job.job_id, error = %e, "Could not probe rendered video");
                None
            }
        };

        Ok(RenderedVideo {
            bytes,
            format: job.format,
            info,
        })
    }
}

#[async_trait]
impl Renderer for ManimRenderer {
    fn name(&self) -> &str {
        "manim"
    }

    async fn render(&self, job: RenderJob) -> Result<RenderedVideo, RenderError> {
        let start = Instant::now();
        let job_dir = self.job_dir(&job);

        let result = self.run_render(&job, &job_dir).await;

        if !self.config.keep_work_dirs {
            if let Err(e) = tokio::fs::remove_dir_all(&job_dir).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(job_id = %job.job_id, error = %e, "Failed to clean render directory");
                }
            }
        }

        if let Ok(ref video) = result {
            info!(
                job_id = %job.job_id,
                bytes = video.bytes.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "scene rendered"
            );
        }
        result
    }

    async fn validate(&self) -> Result<(), RenderError> {
        let result = Command::new(&self.config.manim_path)
            .arg("--version")
            .output()
            .await;

        if let Err(e) = result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(RenderError::ManimNotFound {
                    path: self.config.manim_path.clone(),
                });
            }
            return Err(RenderError::Io(e));
        }

        tokio::fs::create_dir_all(&self.config.work_dir).await?;
        Ok(())
    }
}
