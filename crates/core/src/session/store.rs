//! Session storage trait and in-memory implementation.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::types::{Session, SessionId, SessionSummary};

/// Process-wide map of sessions, the single source of truth for status queries.
///
/// Writes are last-writer-wins. Each session has exactly one writer (the
/// pipeline run that owns it), so no merge is needed. Implementations must not
/// block for long: callers hold no lock across adapter calls and expect `put`
/// and `get` to return promptly.
pub trait SessionStore: Send + Sync {
    /// Inserts or replaces the record for `session.session_id`.
    fn put(&self, session: Session);

    /// Returns a snapshot of the record, or `None` if the id is unknown.
    fn get(&self, session_id: &SessionId) -> Option<Session>;

    /// All known sessions, newest first.
    fn list(&self) -> Vec<Session>;

    fn summaries(&self) -> Vec<SessionSummary> {
        self.list().iter().map(Session::summary).collect()
    }

    fn len(&self) -> usize {
        self.list().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Session store backed by a `HashMap` behind a read-write lock.
///
/// Nothing is persisted: restarting the process forgets every session.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn put(&self, session: Session) {
        debug!(
            session_id = %session.session_id,
            status = %session.status,
            artifacts = session.artifacts.len(),
            "storing session"
        );
        self.sessions
            .write()
            .insert(session.session_id.clone(), session);
    }

    fn get(&self, session_id: &SessionId) -> Option<Session> {
        self.sessions.read().get(session_id).cloned()
    }

    fn list(&self) -> Vec<Session> {
        let mut sessions: Vec<Session> = self.sessions.read().values().cloned().collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        sessions
    }

    fn len(&self) -> usize {
        self.sessions.read().len()
    }
}
