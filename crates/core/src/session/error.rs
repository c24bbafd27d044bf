//! Error types for the session module.

use thiserror::Error;

use super::types::{ArtifactKind, SessionId, SessionStatus};

/// Violations of the session state machine.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session already reached a terminal state.
    #[error("Session {session_id} is already {from}")]
    InvalidTransition {
        session_id: SessionId,
        from: SessionStatus,
    },

    /// An artifact of this kind was already recorded.
    #[error("Session {session_id} already has a {kind} artifact")]
    ArtifactExists {
        session_id: SessionId,
        kind: ArtifactKind,
    },
}
