//! Types exchanged with the content generation stage.

use serde::{Deserialize, Serialize};

use crate::session::NarrativeSegment;

/// Input of the content generation stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRequest {
    pub query: String,
    /// Narrative register, passed through untouched ("intuitive", "formal", ...).
    pub style: String,
    pub target_duration_secs: u32,
}

/// Script for the animation renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    /// Source of the scene (Manim Python).
    pub code: String,
    /// Class to render from `code`.
    pub scene_name: String,
    pub duration_secs: f64,
}

/// Everything the later stages are built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub topic: String,
    /// Mermaid mindmap source.
    pub mindmap: String,
    pub segments: Vec<NarrativeSegment>,
    pub scene: SceneDescription,
}
