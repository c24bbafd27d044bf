//! Pipeline controller implementation.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::io::AsyncWriteExt;
use tokio::time::{timeout, Duration};
use tracing::{error, info, info_span, warn, Instrument};

use super::config::PipelineConfig;
use super::error::PipelineError;
use crate::content::{ContentGenerator, ContentRequest, GeneratedContent, GenerationError};
use crate::metrics;
use crate::mux::{MuxError, MuxJob, Muxer};
use crate::narration::{SynthesisError, SynthesizedAudio, Synthesizer};
use crate::render::{RenderError, RenderJob, RenderedVideo, Renderer};
use crate::session::narrative::{narration_text, validate_timeline};
use crate::session::{
    ArtifactEntry, ArtifactKind, ArtifactMetadata, ArtifactRecord, Session, SessionStatus,
    SessionStore,
};

pub const MINDMAP_FILE: &str = "mindmap.txt";
pub const SCENE_FILE: &str = "animation.py";
pub const FINAL_VIDEO_FILE: &str = "final_video.mp4";
pub const SNAPSHOT_FILE: &str = "metadata.json";

/// The four stage adapters a controller drives.
#[derive(Clone)]
pub struct StageAdapters {
    pub generator: Arc<dyn ContentGenerator>,
    pub synthesizer: Arc<dyn Synthesizer>,
    pub renderer: Arc<dyn Renderer>,
    pub muxer: Arc<dyn Muxer>,
}

pub struct PipelineController {
    config: PipelineConfig,
    output_dir: PathBuf,
    store: Arc<dyn SessionStore>,
    adapters: StageAdapters,
}

impl PipelineController {
    pub fn new(
        config: PipelineConfig,
        output_dir: PathBuf,
        store: Arc<dyn SessionStore>,
        adapters: StageAdapters,
    ) -> Self {
        Self {
            config,
            output_dir,
            store,
            adapters,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Directory holding a session's artifacts and snapshot.
    pub fn session_dir(&self, session: &Session) -> PathBuf {
        self.output_dir.join(session.session_id.as_str())
    }

    /// Runs every stage for `session` and returns it in a terminal status.
    ///
    /// Never returns an error: anything that goes wrong ends up on the session.
    pub async fn run(&self, mut session: Session) -> Session {
        let span = info_span!("pipeline", session_id = %session.session_id);

        async move {
            let start = Instant::now();
            info!(query = %session.query, include_video = session.include_video, "pipeline started");

            if let Err(e) = self.execute(&mut session).await {
                if e.is_stage_failure() {
                    warn!(error = %e, "pipeline failed");
                } else {
                    error!(error = %e, "unexpected pipeline error");
                }
                if let Err(transition) = session.fail(e.session_message()) {
                    error!(error = %transition, "could not mark session failed");
                }
            }

            if session.status == SessionStatus::Completed {
                if let Err(e) = self.write_snapshot(&session).await {
                    warn!(error = %e, "Failed to write session snapshot");
                }
            }

            metrics::SESSIONS_FINISHED
                .with_label_values(&[session.status.as_str()])
                .inc();
            info!(
                status = %session.status,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "pipeline finished"
            );

            self.store.put(session.clone());
            session
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, session: &mut Session) -> Result<(), PipelineError> {
        let session_dir = self.session_dir(session);
        tokio::fs::create_dir_all(&session_dir).await?;

        let content = self.generate(session).await?;

        let mindmap_path = session_dir.join(MINDMAP_FILE);
        let size_bytes = write_new(&mindmap_path, content.mindmap.as_bytes()).await?;
        session.record_topic(content.topic.clone())?;
        session.attach_artifact(
            ArtifactKind::Mindmap,
            ArtifactEntry::Ready(ArtifactRecord {
                path: mindmap_path,
                size_bytes,
                metadata: ArtifactMetadata::Mindmap {
                    format: "mermaid".to_string(),
                    line_count: content.mindmap.lines().count(),
                },
            }),
        )?;
        write_new(&session_dir.join(SCENE_FILE), content.scene.code.as_bytes()).await?;
        self.store.put(session.clone());

        let text = narration_text(&content.segments);
        let render_job = session.include_video.then(|| RenderJob {
            job_id: session.session_id.to_string(),
            scene: content.scene.clone(),
            quality: self.config.render_quality,
            format: self.config.render_format,
        });

        let (audio, rendered) = tokio::join!(self.synthesize(&text), self.render(render_job));
        let audio = audio?;

        let audio_path = session_dir.join(format!("narration.{}", audio.encoding.extension()));
        let size_bytes = write_new(&audio_path, &audio.bytes).await?;
        session.attach_artifact(
            ArtifactKind::Audio,
            ArtifactEntry::Ready(ArtifactRecord {
                path: audio_path.clone(),
                size_bytes,
                metadata: ArtifactMetadata::Audio {
                    duration_secs: audio.duration_secs,
                    encoding: audio.encoding.api_name().to_string(),
                    segments: content.segments.clone(),
                },
            }),
        )?;
        self.store.put(session.clone());

        if let Some(rendered) = rendered {
            let entry = match rendered {
                Ok(video) => self.finish_video(session, &session_dir, video, &audio_path).await,
                Err(e) => ArtifactEntry::Failed {
                    error: e.describe(),
                },
            };
            if let Some(error) = entry.error() {
                warn!(error = %error, "video artifact failed");
                metrics::ARTIFACT_FAILURES
                    .with_label_values(&[ArtifactKind::Video.as_str()])
                    .inc();
            }
            session.attach_artifact(ArtifactKind::Video, entry)?;
        }

        session.complete()?;
        Ok(())
    }

    async fn generate(&self, session: &Session) -> Result<GeneratedContent, PipelineError> {
        let request = ContentRequest {
            query: session.query.clone(),
            style: session.style.clone(),
            target_duration_secs: session.target_duration_secs,
        };

        let content = run_stage(
            "generation",
            self.config.timeouts.generation_secs,
            self.adapters.generator.generate(request),
            |timeout_secs| GenerationError::Timeout { timeout_secs },
        )
        .await?;

        // A broken timeline is a generation failure: narration and animation both sync to it.
        validate_timeline(&content.segments, f64::from(session.target_duration_secs))
            .map_err(GenerationError::from)?;

        info!(topic = %content.topic, segments = content.segments.len(), "content generated");
        Ok(content)
    }

    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio, SynthesisError> {
        run_stage(
            "synthesis",
            self.config.timeouts.synthesis_secs,
            self.adapters.synthesizer.synthesize(text),
            |timeout_secs| SynthesisError::Timeout { timeout_secs },
        )
        .await
    }

    async fn render(&self, job: Option<RenderJob>) -> Option<Result<RenderedVideo, RenderError>> {
        let job = job?;
        Some(
            run_stage(
                "render",
                self.config.timeouts.render_secs,
                self.adapters.renderer.render(job),
                |timeout_secs| RenderError::Timeout { timeout_secs },
            )
            .await,
        )
    }

    /// Stores the silent render, muxes narration onto it and returns the video entry.
    async fn finish_video(
        &self,
        session: &Session,
        session_dir: &Path,
        video: RenderedVideo,
        audio_path: &Path,
    ) -> ArtifactEntry {
        let silent_path = session_dir.join(format!("animation.{}", video.format.extension()));
        if let Err(e) = write_new(&silent_path, &video.bytes).await {
            return ArtifactEntry::Failed {
                error: format!("Failed to store rendered video: {}", e),
            };
        }

        let job = MuxJob::new(
            session.session_id.to_string(),
            silent_path,
            audio_path.to_path_buf(),
        )
        .with_speed(self.config.speed_factor);

        let muxed = match run_stage(
            "mux",
            self.config.timeouts.mux_secs,
            self.adapters.muxer.mux(job),
            |timeout_secs| MuxError::Timeout { timeout_secs },
        )
        .await
        {
            Ok(muxed) => muxed,
            Err(e) => return ArtifactEntry::Failed { error: e.describe() },
        };

        let final_path = session_dir.join(FINAL_VIDEO_FILE);
        let size_bytes = match write_new(&final_path, &muxed.bytes).await {
            Ok(size) => size,
            Err(e) => {
                return ArtifactEntry::Failed {
                    error: format!("Failed to store final video: {}", e),
                }
            }
        };

        let info = muxed.info.or(video.info);
        ArtifactEntry::Ready(ArtifactRecord {
            path: final_path,
            size_bytes,
            metadata: ArtifactMetadata::Video {
                duration_secs: info.as_ref().map(|i| i.duration_secs),
                width: info.as_ref().and_then(|i| i.width),
                height: info.as_ref().and_then(|i| i.height),
                fps: info.as_ref().and_then(|i| i.fps),
                codec: info.as_ref().and_then(|i| i.video_codec.clone()),
                speed_factor: self.config.speed_factor,
            },
        })
    }

    async fn write_snapshot(&self, session: &Session) -> Result<(), PipelineError> {
        let path = self.session_dir(session).join(SNAPSHOT_FILE);
        let json = serde_json::to_vec_pretty(session)?;
        tokio::fs::write(&path, json).await?;
        Ok(())
    }
}

/// Runs one adapter call under a deadline and records its metrics.
async fn run_stage<T, E, F>(
    stage: &'static str,
    limit_secs: u64,
    call: F,
    on_timeout: impl FnOnce(u64) -> E,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    info!(stage, "stage started");
    let start = Instant::now();

    let result = match timeout(Duration::from_secs(limit_secs), call).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout(limit_secs)),
    };

    let elapsed = start.elapsed();
    match &result {
        Ok(_) => {
            metrics::record_stage(stage, "success", elapsed.as_secs_f64());
            info!(stage, elapsed_ms = elapsed.as_millis() as u64, "stage finished");
        }
        Err(e) => {
            metrics::record_stage(stage, "failure", elapsed.as_secs_f64());
            warn!(stage, error = %e, "stage failed");
        }
    }
    result
}

/// Writes an artifact file that must not exist yet.
async fn write_new(path: &Path, bytes: &[u8]) -> std::io::Result<u64> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    Ok(bytes.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_new_refuses_overwrite() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("mindmap.txt");

        assert_eq!(write_new(&path, b"mindmap").await.unwrap(), 7);
        let err = write_new(&path, b"again").await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::AlreadyExists);
        assert_eq!(std::fs::read(&path).unwrap(), b"mindmap");
    }

    #[tokio::test]
    async fn test_run_stage_maps_timeout() {
        let result: Result<(), String> = run_stage(
            "test",
            0,
            async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(())
            },
            |secs| format!("timed out after {}", secs),
        )
        .await;
        assert_eq!(result.unwrap_err(), "timed out after 0");
    }
}
