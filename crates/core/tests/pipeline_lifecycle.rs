//! Pipeline lifecycle integration tests.
//!
//! These tests drive the dispatcher and controller with mock stage adapters:
//! - Status transitions (processing -> completed | failed)
//! - Which stage failures are fatal and which are artifact-local
//! - Narration text and timeline guarantees
//! - Snapshot, publishing and auto-publish

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use edapt_core::{
    config::StorageConfig,
    content::GenerationError,
    mux::MuxError,
    narration::SynthesisError,
    pipeline::{PipelineConfig, PipelineController, StageAdapters, StageTimeouts, SNAPSHOT_FILE},
    publisher::Publisher,
    render::RenderError,
    session::narrative::{narration_text, validate_timeline},
    session::ArtifactMetadata,
    testing::{
        fixtures, wait_for_terminal, MockContentGenerator, MockMuxer, MockRenderer,
        MockSynthesizer, MOCK_AUDIO, MOCK_SILENT_VIDEO,
    },
    ArtifactEntry, ArtifactKind, DispatchError, GenerationRequest, InMemorySessionStore,
    JobDispatcher, Session, SessionId, SessionStatus, SessionStore,
};

const WAIT: Duration = Duration::from_secs(10);

/// Test helper wiring a dispatcher to mock adapters over a temp directory.
struct TestHarness {
    dispatcher: JobDispatcher,
    store: Arc<InMemorySessionStore>,
    publisher: Arc<Publisher>,
    generator: Arc<MockContentGenerator>,
    synthesizer: Arc<MockSynthesizer>,
    renderer: Arc<MockRenderer>,
    muxer: Arc<MockMuxer>,
    storage: StorageConfig,
    _temp_dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_config(PipelineConfig::default(), false)
    }

    fn with_config(config: PipelineConfig, auto_publish: bool) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let storage = StorageConfig {
            output_dir: temp_dir.path().join("output"),
            public_dir: temp_dir.path().join("public"),
            public_url_prefix: "/public".to_string(),
        };

        let store = Arc::new(InMemorySessionStore::new());
        let generator = Arc::new(MockContentGenerator::new());
        let synthesizer = Arc::new(MockSynthesizer::new());
        let renderer = Arc::new(MockRenderer::new());
        let muxer = Arc::new(MockMuxer::new());

        let controller = Arc::new(PipelineController::new(
            config,
            storage.output_dir.clone(),
            Arc::clone(&store) as Arc<dyn SessionStore>,
            StageAdapters {
                generator: generator.clone(),
                synthesizer: synthesizer.clone(),
                renderer: renderer.clone(),
                muxer: muxer.clone(),
            },
        ));
        let publisher = Arc::new(Publisher::new(storage.clone()));

        let mut dispatcher =
            JobDispatcher::new(Arc::clone(&store) as Arc<dyn SessionStore>, controller);
        if auto_publish {
            dispatcher = dispatcher.with_publisher(Arc::clone(&publisher));
        }

        Self {
            dispatcher,
            store,
            publisher,
            generator,
            synthesizer,
            renderer,
            muxer,
            storage,
            _temp_dir: temp_dir,
        }
    }

    async fn run(&self, request: GenerationRequest) -> Session {
        let handle = self.dispatcher.submit(request).expect("submit failed");
        assert_eq!(handle.status, SessionStatus::Processing);
        wait_for_terminal(self.store.as_ref(), &handle.session_id, WAIT)
            .await
            .expect("session did not finish in time")
    }

    fn session_dir(&self, session: &Session) -> std::path::PathBuf {
        self.storage.output_dir.join(session.session_id.as_str())
    }
}

fn request(include_video: bool) -> GenerationRequest {
    GenerationRequest::new("How do derivatives work?")
        .with_style("intuitive")
        .with_target_duration(60)
        .with_video(include_video)
}

fn ready_path(session: &Session, kind: ArtifactKind) -> &Path {
    &session
        .artifact(kind)
        .and_then(ArtifactEntry::record)
        .unwrap_or_else(|| panic!("{} artifact not ready", kind))
        .path
}

fn ready_metadata(session: &Session, kind: ArtifactKind) -> &ArtifactMetadata {
    &session
        .artifact(kind)
        .and_then(ArtifactEntry::record)
        .unwrap_or_else(|| panic!("{} artifact not ready", kind))
        .metadata
}

// =============================================================================
// Submission
// =============================================================================

#[tokio::test]
async fn test_submit_rejects_blank_query() {
    let harness = TestHarness::new();

    let err = harness
        .dispatcher
        .submit(GenerationRequest::new("   \n"))
        .unwrap_err();

    assert_eq!(err, DispatchError::EmptyQuery);
    assert!(harness.store.is_empty());
    assert_eq!(harness.generator.call_count(), 0);
}

#[tokio::test]
async fn test_submit_returns_before_pipeline_runs() {
    let harness = TestHarness::new();
    harness.generator.set_delay(Duration::from_millis(300));

    let start = Instant::now();
    let handle = harness.dispatcher.submit(request(true)).unwrap();
    assert!(start.elapsed() < Duration::from_millis(200));

    let stored = harness.store.get(&handle.session_id).unwrap();
    assert_eq!(stored.status, SessionStatus::Processing);
    assert_eq!(stored.query, "How do derivatives work?");
    assert_eq!(stored.target_duration_secs, 60);
    assert_eq!(harness.store.len(), 1);
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let harness = TestHarness::new();
    assert!(harness.store.get(&SessionId::from("nope")).is_none());
}

// =============================================================================
// Happy paths
// =============================================================================

#[tokio::test]
async fn test_full_run_with_video() {
    let harness = TestHarness::new();
    let session = harness.run(request(true)).await;

    assert_eq!(session.status, SessionStatus::Completed);
    assert!(session.error.is_none());
    assert!(session.finished_at.is_some());
    assert_eq!(session.topic.as_deref(), Some("Derivatives"));

    let dir = harness.session_dir(&session);
    assert_eq!(ready_path(&session, ArtifactKind::Mindmap), dir.join("mindmap.txt"));
    assert_eq!(ready_path(&session, ArtifactKind::Audio), dir.join("narration.mp3"));
    assert_eq!(ready_path(&session, ArtifactKind::Video), dir.join("final_video.mp4"));
    assert!(dir.join("animation.py").exists());
    assert_eq!(std::fs::read(dir.join("animation.mp4")).unwrap(), MOCK_SILENT_VIDEO);

    let narration = std::fs::read(dir.join("narration.mp3")).unwrap();
    assert!(narration.starts_with(MOCK_AUDIO));
    let final_video = std::fs::read(dir.join("final_video.mp4")).unwrap();
    assert_eq!(final_video, [MOCK_SILENT_VIDEO, narration.as_slice()].concat());

    assert_eq!(harness.generator.call_count(), 1);
    assert_eq!(harness.synthesizer.call_count(), 1);
    assert_eq!(harness.renderer.call_count(), 1);
    assert_eq!(harness.muxer.call_count(), 1);

    let request = &harness.generator.recorded_requests()[0];
    assert_eq!(request.style, "intuitive");
    assert_eq!(request.target_duration_secs, 60);
}

#[tokio::test]
async fn test_full_run_120s_video_matches_narration() {
    let harness = TestHarness::new();
    let session = harness.run(request(true).with_target_duration(120)).await;

    assert_eq!(session.status, SessionStatus::Completed);
    for kind in [ArtifactKind::Mindmap, ArtifactKind::Audio, ArtifactKind::Video] {
        assert!(
            matches!(session.artifact(kind), Some(ArtifactEntry::Ready(_))),
            "{:?} not ready",
            kind
        );
    }

    let segments = session.narrative().unwrap();
    assert_eq!(segments.last().unwrap().end_time, 120.0);

    let audio_secs = match ready_metadata(&session, ArtifactKind::Audio) {
        ArtifactMetadata::Audio { duration_secs, .. } => *duration_secs,
        other => panic!("unexpected audio metadata: {:?}", other),
    };
    let (video_secs, codec) = match ready_metadata(&session, ArtifactKind::Video) {
        ArtifactMetadata::Video {
            duration_secs,
            codec,
            ..
        } => (*duration_secs, codec.clone()),
        other => panic!("unexpected video metadata: {:?}", other),
    };

    assert!(audio_secs > 0.0);
    let video_secs = video_secs.expect("muxed video reports a duration");
    assert!(
        (video_secs - audio_secs).abs() < 0.01,
        "video {}s vs narration {}s",
        video_secs,
        audio_secs
    );
    assert_eq!(codec.as_deref(), Some("h264"));
}

#[tokio::test]
async fn test_without_video_skips_render_and_mux() {
    let harness = TestHarness::new();
    let session = harness.run(request(false)).await;

    assert_eq!(session.status, SessionStatus::Completed);
    assert!(session.artifact(ArtifactKind::Video).is_none());
    assert!(session.artifact(ArtifactKind::Mindmap).unwrap().is_ready());
    assert!(session.artifact(ArtifactKind::Audio).unwrap().is_ready());

    assert_eq!(harness.renderer.call_count(), 0);
    assert_eq!(harness.muxer.call_count(), 0);
}

#[tokio::test]
async fn test_narration_text_is_segments_in_id_order() {
    let harness = TestHarness::new();
    let session = harness.run(request(false)).await;

    let texts = harness.synthesizer.recorded_texts();
    assert_eq!(texts.len(), 1);
    assert_eq!(texts[0], fixtures::SAMPLE_SEGMENT_TEXTS.join(" "));

    let segments = session.narrative().expect("narrative recorded on audio");
    assert_eq!(narration_text(segments), texts[0]);
}

#[tokio::test]
async fn test_recorded_timeline_spans_target_duration() {
    let harness = TestHarness::new();
    let session = harness
        .run(request(false).with_target_duration(95))
        .await;

    let segments = session.narrative().unwrap();
    assert_eq!(segments.len(), 3);
    validate_timeline(segments, 95.0).unwrap();
    assert_eq!(segments[0].start_time, 0.0);
    assert_eq!(segments.last().unwrap().end_time, 95.0);
}

#[tokio::test]
async fn test_render_uses_configured_quality_and_speed() {
    let config = PipelineConfig {
        render_quality: edapt_core::render::RenderQuality::High,
        render_format: edapt_core::render::RenderFormat::Mov,
        ..PipelineConfig::default()
    }
    .with_speed_factor(1.5);
    let harness = TestHarness::with_config(config, false);

    let session = harness.run(request(true)).await;
    assert_eq!(session.status, SessionStatus::Completed);

    let job = &harness.renderer.recorded_jobs()[0];
    assert_eq!(job.quality, edapt_core::render::RenderQuality::High);
    assert_eq!(job.scene.scene_name, "GeneratedScene");
    assert_eq!(job.job_id, session.session_id.as_str());

    let mux = &harness.muxer.recorded_jobs()[0];
    assert_eq!(mux.speed_factor, 1.5);
    assert!(mux.video_path.ends_with("animation.mov"));
    assert!(mux.audio_path.ends_with("narration.mp3"));
}

#[tokio::test]
async fn test_narration_and_render_run_concurrently() {
    let harness = TestHarness::new();
    harness.synthesizer.set_delay(Duration::from_millis(400));
    harness.renderer.set_delay(Duration::from_millis(400));

    let start = Instant::now();
    let session = harness.run(request(true)).await;

    assert_eq!(session.status, SessionStatus::Completed);
    assert!(
        start.elapsed() < Duration::from_millis(750),
        "stages ran sequentially: {:?}",
        start.elapsed()
    );
}

// =============================================================================
// Failure policy
// =============================================================================

#[tokio::test]
async fn test_generation_failure_is_fatal() {
    let harness = TestHarness::new();
    harness
        .generator
        .set_next_error(GenerationError::invalid_response("narrative", "not a JSON array"));

    let session = harness.run(request(true)).await;

    assert_eq!(session.status, SessionStatus::Failed);
    assert_eq!(
        session.error.as_deref(),
        Some(
            GenerationError::invalid_response("narrative", "not a JSON array")
                .to_string()
                .as_str()
        )
    );
    assert!(session.artifacts.is_empty());
    assert_eq!(harness.synthesizer.call_count(), 0);
    assert_eq!(harness.renderer.call_count(), 0);
    assert_eq!(harness.muxer.call_count(), 0);
}

#[tokio::test]
async fn test_broken_timeline_is_generation_failure() {
    let harness = TestHarness::new();
    let mut content = fixtures::sample_content(60);
    content.segments[1].start_time += 5.0;
    harness.generator.set_content(content);

    let session = harness.run(request(true)).await;

    assert_eq!(session.status, SessionStatus::Failed);
    assert!(session.error.unwrap().contains("timeline"));
    assert_eq!(harness.synthesizer.call_count(), 0);
}

#[tokio::test]
async fn test_narration_failure_is_fatal() {
    let harness = TestHarness::new();
    harness.synthesizer.set_next_error(SynthesisError::Api {
        status: 403,
        message: "API key not valid".to_string(),
    });

    let session = harness.run(request(true)).await;

    assert_eq!(session.status, SessionStatus::Failed);
    assert!(session.error.as_deref().unwrap().contains("API key not valid"));
    assert!(session.artifact(ArtifactKind::Mindmap).unwrap().is_ready());
    assert!(session.artifact(ArtifactKind::Audio).is_none());
    assert!(session.artifact(ArtifactKind::Video).is_none());
    assert_eq!(harness.muxer.call_count(), 0);
}

#[tokio::test]
async fn test_render_failure_completes_with_video_error() {
    let harness = TestHarness::new();
    harness.renderer.set_next_error(RenderError::process_failed(
        "manim exited with code: Some(1)",
        None,
        Some("NameError: name 'Circel' is not defined".to_string()),
    ));

    let session = harness.run(request(true)).await;

    assert_eq!(session.status, SessionStatus::Completed);
    assert!(session.error.is_none());
    let video_error = session.artifact(ArtifactKind::Video).unwrap().error().unwrap();
    assert!(video_error.contains("Render failed"));
    assert!(video_error.contains("Circel"));
    assert!(session.artifact(ArtifactKind::Mindmap).unwrap().is_ready());
    assert!(session.artifact(ArtifactKind::Audio).unwrap().is_ready());
    assert_eq!(harness.muxer.call_count(), 0);
}

#[tokio::test]
async fn test_mux_failure_completes_with_video_error() {
    let harness = TestHarness::new();
    harness.muxer.set_next_error(MuxError::process_failed(
        "FFmpeg exited with code: Some(1)",
        Some("Error opening output file".to_string()),
    ));

    let session = harness.run(request(true)).await;

    assert_eq!(session.status, SessionStatus::Completed);
    let video_error = session.artifact(ArtifactKind::Video).unwrap().error().unwrap();
    assert!(video_error.contains("Error opening output file"));
    assert!(!harness.session_dir(&session).join("final_video.mp4").exists());
}

#[tokio::test]
async fn test_generation_timeout_fails_session() {
    let config = PipelineConfig::default().with_timeouts(StageTimeouts {
        generation_secs: 1,
        ..StageTimeouts::default()
    });
    let harness = TestHarness::with_config(config, false);
    harness.generator.set_delay(Duration::from_secs(5));

    let session = harness.run(request(true)).await;

    assert_eq!(session.status, SessionStatus::Failed);
    assert_eq!(
        session.error.as_deref(),
        Some(GenerationError::Timeout { timeout_secs: 1 }.to_string().as_str())
    );
    assert_eq!(harness.synthesizer.call_count(), 0);
}

#[tokio::test]
async fn test_render_timeout_is_artifact_local() {
    let config = PipelineConfig::default().with_timeouts(StageTimeouts {
        render_secs: 1,
        ..StageTimeouts::default()
    });
    let harness = TestHarness::with_config(config, false);
    harness.renderer.set_delay(Duration::from_secs(5));

    let session = harness.run(request(true)).await;

    assert_eq!(session.status, SessionStatus::Completed);
    let video_error = session.artifact(ArtifactKind::Video).unwrap().error().unwrap();
    assert_eq!(video_error, RenderError::Timeout { timeout_secs: 1 }.to_string());
}

#[tokio::test]
async fn test_adapter_panic_marks_session_failed() {
    let harness = TestHarness::new();
    harness.generator.set_panic("generator exploded");

    let session = harness.run(request(true)).await;

    assert_eq!(session.status, SessionStatus::Failed);
    assert!(session
        .error
        .unwrap()
        .starts_with("Internal pipeline error"));
}

#[tokio::test]
async fn test_status_is_monotonic() {
    let harness = TestHarness::new();
    harness.generator.set_delay(Duration::from_millis(50));
    harness.synthesizer.set_delay(Duration::from_millis(50));
    harness.renderer.set_delay(Duration::from_millis(50));

    let handle = harness.dispatcher.submit(request(true)).unwrap();
    let mut observed = Vec::new();
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        let status = harness.store.get(&handle.session_id).unwrap().status;
        observed.push(status);
        if status.is_terminal() && observed.len() > 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    // Keep sampling briefly after reaching a terminal status.
    for _ in 0..10 {
        observed.push(harness.store.get(&handle.session_id).unwrap().status);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let first_terminal = observed
        .iter()
        .position(|s| s.is_terminal())
        .expect("never finished");
    assert!(observed[..first_terminal]
        .iter()
        .all(|s| *s == SessionStatus::Processing));
    assert!(observed[first_terminal..]
        .iter()
        .all(|s| *s == SessionStatus::Completed));
}

// =============================================================================
// Snapshot and publishing
// =============================================================================

#[tokio::test]
async fn test_completed_session_writes_snapshot() {
    let harness = TestHarness::new();
    let session = harness.run(request(true)).await;

    let bytes = std::fs::read(harness.session_dir(&session).join(SNAPSHOT_FILE)).unwrap();
    let snapshot: Session = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(snapshot, session);
}

#[tokio::test]
async fn test_failed_session_cannot_be_published() {
    let harness = TestHarness::new();
    harness
        .generator
        .set_next_error(GenerationError::Timeout { timeout_secs: 3 });
    let session = harness.run(request(true)).await;

    let err = harness.publisher.publish(&session.session_id).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_publish_without_video_yields_two_paths() {
    let harness = TestHarness::new();
    let session = harness.run(request(false)).await;

    let published = harness.publisher.publish(&session.session_id).await.unwrap();

    assert_eq!(published.artifacts.len(), 2);
    let id = session.session_id.as_str();
    assert_eq!(
        published.url(ArtifactKind::Mindmap).unwrap(),
        format!("/public/generated/{}/mindmap.txt", id)
    );
    assert_eq!(
        published.url(ArtifactKind::Audio).unwrap(),
        format!("/public/generated/{}/narration.mp3", id)
    );
}

#[tokio::test]
async fn test_publish_skips_failed_video() {
    let harness = TestHarness::new();
    harness
        .renderer
        .set_next_error(RenderError::Timeout { timeout_secs: 9 });
    let session = harness.run(request(true)).await;

    let published = harness.publisher.publish(&session.session_id).await.unwrap();
    assert!(published.url(ArtifactKind::Video).is_none());
    assert!(!harness
        .storage
        .public_dir
        .join("generated")
        .join(session.session_id.as_str())
        .join("video.mp4")
        .exists());
}

#[tokio::test]
async fn test_republish_is_idempotent() {
    let harness = TestHarness::new();
    let session = harness.run(request(true)).await;

    let first = harness.publisher.publish(&session.session_id).await.unwrap();
    let second = harness.publisher.publish(&session.session_id).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.artifacts.len(), 3);
    let video = &first.artifacts[&ArtifactKind::Video];
    let narration = std::fs::read(ready_path(&session, ArtifactKind::Audio)).unwrap();
    assert_eq!(
        std::fs::read(&video.path).unwrap(),
        [MOCK_SILENT_VIDEO, narration.as_slice()].concat()
    );
}

#[tokio::test]
async fn test_auto_publish_after_completion() {
    let harness = TestHarness::with_config(PipelineConfig::default(), true);
    let session = harness.run(request(false)).await;

    let public_dir = harness
        .storage
        .public_dir
        .join("generated")
        .join(session.session_id.as_str());
    let deadline = Instant::now() + WAIT;
    while !public_dir.join("narration.mp3").exists() && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert!(public_dir.join("mindmap.txt").exists());
    assert!(public_dir.join("narration.mp3").exists());
}
