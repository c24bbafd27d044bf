//! Testing utilities and mock implementations of the stage adapters.
//!
//! The mocks record every call, accept one-shot injected errors and optional
//! delays, so pipeline scenarios can be exercised without an LLM, a TTS
//! service, Manim or ffmpeg.
//!
//! # Example
//!
//! ```rust,ignore
//! use edapt_core::testing::{MockContentGenerator, MockRenderer, MockSynthesizer, MockMuxer};
//!
//! let renderer = Arc::new(MockRenderer::new());
//! renderer.set_next_error(RenderError::Timeout { timeout_secs: 1 });
//!
//! // Build a PipelineController with the mocks, submit, then:
//! let session = wait_for_terminal(store.as_ref(), &handle.session_id, Duration::from_secs(5)).await;
//! ```

mod mock_generator;
mod mock_llm_client;
mod mock_muxer;
mod mock_renderer;
mod mock_synthesizer;

pub use mock_generator::MockContentGenerator;
pub use mock_llm_client::MockLlmClient;
pub use mock_muxer::MockMuxer;
pub use mock_renderer::{MockRenderer, MOCK_SILENT_VIDEO};
pub use mock_synthesizer::{mock_audio, mock_audio_duration, MockSynthesizer, MOCK_AUDIO};

use std::time::Duration;

use crate::session::{Session, SessionId, SessionStore};

/// Polls the store until the session reaches a terminal status.
///
/// Returns `None` if it is unknown or still processing when `timeout` expires.
pub async fn wait_for_terminal(
    store: &dyn SessionStore,
    session_id: &SessionId,
    timeout: Duration,
) -> Option<Session> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if let Some(session) = store.get(session_id) {
            if session.status.is_terminal() {
                return Some(session);
            }
        }
        if tokio::time::Instant::now() >= deadline {
            return None;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::content::{GeneratedContent, SceneDescription};
    use crate::session::narrative::build_timeline;
    use crate::session::SegmentDraft;

    /// Texts of the segments in [`sample_content`], in id order.
    pub const SAMPLE_SEGMENT_TEXTS: [&str; 3] = [
        "Every curve hides a slope.",
        "Zoom in until the curve looks straight.",
        "That slope is the derivative.",
    ];

    /// A plausible content bundle whose timeline spans `target_secs`.
    pub fn sample_content(target_secs: u32) -> GeneratedContent {
        let drafts = vec![
            draft(3, "Payoff", SAMPLE_SEGMENT_TEXTS[2], 10.0),
            draft(1, "Hook", SAMPLE_SEGMENT_TEXTS[0], 10.0),
            draft(2, "Zoom", SAMPLE_SEGMENT_TEXTS[1], 20.0),
        ];
        let segments = build_timeline(drafts, f64::from(target_secs))
            .expect("sample timeline is valid");

        GeneratedContent {
            topic: "Derivatives".to_string(),
            mindmap: "mindmap\n  root((Derivatives))\n    Slope\n    Limit".to_string(),
            segments,
            scene: SceneDescription {
                code: "from manim import *\n\nclass GeneratedScene(Scene):\n    def construct(self):\n        self.wait(1)\n".to_string(),
                scene_name: "GeneratedScene".to_string(),
                duration_secs: f64::from(target_secs),
            },
        }
    }

    fn draft(id: u32, title: &str, text: &str, estimated: f64) -> SegmentDraft {
        SegmentDraft {
            id,
            title: title.to_string(),
            text: text.to_string(),
            estimated_duration_secs: estimated,
        }
    }
}
