//! Session API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, warn};

use edapt_core::session::NarrativeSegment;
use edapt_core::{
    ArtifactEntry, ArtifactKind, DispatchError, GenerationRequest, Session, SessionId,
    SessionStatus, SessionSummary,
};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for starting a generation
#[derive(Debug, Deserialize)]
pub struct CreateSessionBody {
    pub query: String,
    /// Narrative style hint, e.g. "intuitive"
    #[serde(alias = "narrative_style")]
    pub style: Option<String>,
    /// Target narration length in seconds
    #[serde(alias = "target_duration_secs")]
    pub target_duration: Option<u32>,
    pub include_video: Option<bool>,
}

impl From<CreateSessionBody> for GenerationRequest {
    fn from(body: CreateSessionBody) -> Self {
        let mut request = GenerationRequest::new(body.query);
        if let Some(style) = body.style {
            request = request.with_style(style);
        }
        if let Some(secs) = body.target_duration {
            request = request.with_target_duration(secs);
        }
        if let Some(include_video) = body.include_video {
            request = request.with_video(include_video);
        }
        request
    }
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: SessionId,
    pub status: SessionStatus,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub session_id: SessionId,
    pub status: SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl From<&Session> for SessionStatusResponse {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.session_id.clone(),
            status: session.status,
            topic: session.topic.clone(),
            error: session.error.clone(),
            created_at: session.created_at,
            finished_at: session.finished_at,
        }
    }
}

/// The generated bundle. Only `session_id`, `status` and `message` are set
/// until the session has completed.
#[derive(Debug, Serialize)]
pub struct SessionContentResponse {
    pub session_id: SessionId,
    pub status: SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mindmap: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrative: Option<Vec<NarrativeSegment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<BTreeMap<ArtifactKind, ArtifactEntry>>,
    /// Public URLs of artifacts that have been published.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urls: Option<BTreeMap<ArtifactKind, String>>,
}

impl SessionContentResponse {
    fn pending(session: &Session) -> Self {
        let message = match session.status {
            SessionStatus::Processing => Some("Content generation not completed yet".to_string()),
            _ => session.error.clone(),
        };
        Self {
            session_id: session.session_id.clone(),
            status: session.status,
            message,
            query: None,
            topic: None,
            mindmap: None,
            narrative: None,
            artifacts: None,
            urls: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListSessionsResponse {
    pub sessions: Vec<SessionSummary>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct PublishResponse {
    pub session_id: SessionId,
    /// Published file path per artifact kind.
    pub paths: BTreeMap<ArtifactKind, String>,
    pub urls: BTreeMap<ArtifactKind, String>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct SessionErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<SessionErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(SessionErrorResponse {
            error: error.into(),
        }),
    )
}

fn session_not_found(id: &str) -> ApiError {
    api_error(StatusCode::NOT_FOUND, format!("Session not found: {}", id))
}

// ============================================================================
// Handlers
// ============================================================================

/// Start a generation; returns before any stage has run
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateSessionBody>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), ApiError> {
    match state.dispatcher().submit(body.into()) {
        Ok(handle) => Ok((
            StatusCode::ACCEPTED,
            Json(CreateSessionResponse {
                message: format!(
                    "Content generation started. Check status with /api/v1/sessions/{}/status",
                    handle.session_id
                ),
                session_id: handle.session_id,
                status: handle.status,
            }),
        )),
        Err(e @ DispatchError::EmptyQuery) => {
            Err(api_error(StatusCode::BAD_REQUEST, e.to_string()))
        }
    }
}

/// List known sessions, newest first
pub async fn list_sessions(State(state): State<Arc<AppState>>) -> Json<ListSessionsResponse> {
    let sessions = state.store().summaries();
    Json(ListSessionsResponse {
        total: sessions.len(),
        sessions,
    })
}

/// Get the status of a session
pub async fn get_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionStatusResponse>, ApiError> {
    let session = state
        .store()
        .get(&SessionId::from(id.as_str()))
        .ok_or_else(|| session_not_found(&id))?;
    Ok(Json(SessionStatusResponse::from(&session)))
}

/// Get the generated content of a completed session
pub async fn get_content(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionContentResponse>, ApiError> {
    let session = state
        .store()
        .get(&SessionId::from(id.as_str()))
        .ok_or_else(|| session_not_found(&id))?;

    if session.status != SessionStatus::Completed {
        return Ok(Json(SessionContentResponse::pending(&session)));
    }

    let mindmap = match session
        .artifact(ArtifactKind::Mindmap)
        .and_then(ArtifactEntry::record)
    {
        Some(record) => match tokio::fs::read_to_string(&record.path).await {
            Ok(text) => Some(text),
            Err(e) => {
                error!(session_id = %id, path = ?record.path, error = %e, "Failed to read mindmap");
                return Err(api_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to read mindmap: {}", e),
                ));
            }
        },
        None => None,
    };

    Ok(Json(SessionContentResponse {
        session_id: session.session_id.clone(),
        status: session.status,
        message: None,
        query: Some(session.query.clone()),
        topic: session.topic.clone(),
        mindmap,
        narrative: session.narrative().map(<[NarrativeSegment]>::to_vec),
        urls: Some(state.publisher().urls_for(&session)),
        artifacts: Some(session.artifacts),
    }))
}

/// Copy the artifacts of a completed session into the public tree
pub async fn publish_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PublishResponse>, ApiError> {
    let session_id = SessionId::from(id.as_str());
    if !session_id.is_path_safe() {
        return Err(session_not_found(&id));
    }
    match state.publisher().publish(&session_id).await {
        Ok(published) => {
            let paths = published
                .artifacts
                .iter()
                .map(|(kind, artifact)| (*kind, artifact.path.display().to_string()))
                .collect();
            let urls = published
                .artifacts
                .iter()
                .map(|(kind, artifact)| (*kind, artifact.url.clone()))
                .collect();
            Ok(Json(PublishResponse {
                session_id: published.session_id,
                paths,
                urls,
            }))
        }
        Err(e) if e.is_not_found() => Err(session_not_found(&id)),
        Err(e) => {
            warn!(session_id = %id, error = %e, "Publish failed");
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}
