//! Session types and the status state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use super::error::SessionError;
use super::narrative::NarrativeSegment;

/// Opaque, globally unique identifier of a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id can name a directory without leaving its parent.
    ///
    /// Only ASCII letters, digits, `-` and `_` are allowed.
    pub fn is_path_safe(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of a session.
///
/// `Processing` is the only non-terminal state. Once a session reaches
/// `Completed` or `Failed` it never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Processing,
    Completed,
    Failed,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of artifact a session can carry. Ordered by the stage that produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Mindmap,
    Audio,
    Video,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mindmap => "mindmap",
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage-specific metadata attached to a stored artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ArtifactMetadata {
    Mindmap {
        /// Diagram syntax of the stored outline.
        format: String,
        line_count: usize,
    },
    Audio {
        duration_secs: f64,
        encoding: String,
        /// The timeline the narration was synthesized from.
        segments: Vec<NarrativeSegment>,
    },
    Video {
        duration_secs: Option<f64>,
        width: Option<u32>,
        height: Option<u32>,
        fps: Option<f32>,
        codec: Option<String>,
        speed_factor: f64,
    },
}

/// A stored artifact file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub metadata: ArtifactMetadata,
}

/// An entry in a session's artifact map.
///
/// Only the video stage ever produces `Failed`: rendering and muxing errors
/// are recorded against the artifact while the session still completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ArtifactEntry {
    Ready(ArtifactRecord),
    Failed { error: String },
}

impl ArtifactEntry {
    pub fn record(&self) -> Option<&ArtifactRecord> {
        match self {
            Self::Ready(record) => Some(record),
            Self::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Ready(_) => None,
            Self::Failed { error } => Some(error),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// A generation request as accepted by the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub query: String,
    #[serde(default = "default_style")]
    pub style: String,
    #[serde(default = "default_target_duration")]
    pub target_duration_secs: u32,
    #[serde(default = "default_include_video")]
    pub include_video: bool,
}

fn default_style() -> String {
    "intuitive".to_string()
}

fn default_target_duration() -> u32 {
    120
}

fn default_include_video() -> bool {
    true
}

impl GenerationRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            style: default_style(),
            target_duration_secs: default_target_duration(),
            include_video: default_include_video(),
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    pub fn with_target_duration(mut self, secs: u32) -> Self {
        self.target_duration_secs = secs;
        self
    }

    pub fn with_video(mut self, include_video: bool) -> Self {
        self.include_video = include_video;
        self
    }
}

/// The record of one generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: SessionId,
    pub status: SessionStatus,
    pub query: String,
    pub style: String,
    pub target_duration_secs: u32,
    pub include_video: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default)]
    pub artifacts: BTreeMap<ArtifactKind, ArtifactEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Session {
    /// Creates a new session in `Processing` for the given request.
    pub fn new(session_id: SessionId, request: &GenerationRequest) -> Self {
        Self {
            session_id,
            status: SessionStatus::Processing,
            query: request.query.clone(),
            style: request.style.clone(),
            target_duration_secs: request.target_duration_secs,
            include_video: request.include_video,
            created_at: Utc::now(),
            finished_at: None,
            topic: None,
            artifacts: BTreeMap::new(),
            error: None,
        }
    }

    fn ensure_processing(&self) -> Result<(), SessionError> {
        if self.status.is_terminal() {
            return Err(SessionError::InvalidTransition {
                session_id: self.session_id.clone(),
                from: self.status,
            });
        }
        Ok(())
    }

    /// Records the topic extracted by content generation.
    pub fn record_topic(&mut self, topic: impl Into<String>) -> Result<(), SessionError> {
        self.ensure_processing()?;
        self.topic = Some(topic.into());
        Ok(())
    }

    /// Attaches an artifact. Each kind may be written exactly once.
    pub fn attach_artifact(
        &mut self,
        kind: ArtifactKind,
        entry: ArtifactEntry,
    ) -> Result<(), SessionError> {
        self.ensure_processing()?;
        if self.artifacts.contains_key(&kind) {
            return Err(SessionError::ArtifactExists {
                session_id: self.session_id.clone(),
                kind,
            });
        }
        self.artifacts.insert(kind, entry);
        Ok(())
    }

    pub fn complete(&mut self) -> Result<(), SessionError> {
        self.ensure_processing()?;
        self.status = SessionStatus::Completed;
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// Moves the session to `Failed`, keeping the first error description.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), SessionError> {
        self.ensure_processing()?;
        self.status = SessionStatus::Failed;
        self.finished_at = Some(Utc::now());
        if self.error.is_none() {
            self.error = Some(error.into());
        }
        Ok(())
    }

    pub fn artifact(&self, kind: ArtifactKind) -> Option<&ArtifactEntry> {
        self.artifacts.get(&kind)
    }

    /// Segments recorded on the audio artifact, if narration succeeded.
    pub fn narrative(&self) -> Option<&[NarrativeSegment]> {
        match self.artifact(ArtifactKind::Audio)?.record()?.metadata {
            ArtifactMetadata::Audio { ref segments, .. } => Some(segments.as_slice()),
            _ => None,
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.session_id.clone(),
            status: self.status,
            query: self.query.clone(),
            topic: self.topic.clone(),
            created_at: self.created_at,
        }
    }
}

/// Compact view of a session for listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub status: SessionStatus,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Returned by the dispatcher as soon as a session is scheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionHandle {
    pub session_id: SessionId,
    pub status: SessionStatus,
}
