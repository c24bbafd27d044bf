//! Job dispatcher: accepts generation requests and starts one background run each.

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::metrics;
use crate::pipeline::PipelineController;
use crate::publisher::Publisher;
use crate::session::{
    GenerationRequest, Session, SessionHandle, SessionId, SessionStatus, SessionStore,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Query must not be empty")]
    EmptyQuery,
}

pub struct JobDispatcher {
    store: Arc<dyn SessionStore>,
    controller: Arc<PipelineController>,
    publisher: Option<Arc<Publisher>>,
}

impl JobDispatcher {
    pub fn new(store: Arc<dyn SessionStore>, controller: Arc<PipelineController>) -> Self {
        Self {
            store,
            controller,
            publisher: None,
        }
    }

    /// Publish every session that completes.
    pub fn with_publisher(mut self, publisher: Arc<Publisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Registers a new session and schedules its pipeline run.
    ///
    /// Returns as soon as the session is stored; the outcome is only observable
    /// through the session store. Must be called from within a tokio runtime.
    pub fn submit(&self, request: GenerationRequest) -> Result<SessionHandle, DispatchError> {
        if request.query.trim().is_empty() {
            return Err(DispatchError::EmptyQuery);
        }

        let session = Session::new(SessionId::generate(), &request);
        let handle = SessionHandle {
            session_id: session.session_id.clone(),
            status: session.status,
        };
        self.store.put(session.clone());
        metrics::SESSIONS_SUBMITTED.inc();

        info!(
            session_id = %handle.session_id,
            style = %request.style,
            target_duration_secs = request.target_duration_secs,
            include_video = request.include_video,
            "session submitted"
        );

        let store = Arc::clone(&self.store);
        let controller = Arc::clone(&self.controller);
        let publisher = self.publisher.clone();
        tokio::spawn(supervise(session, store, controller, publisher));

        Ok(handle)
    }
}

/// Runs the controller in its own task so a panic still leaves a terminal session.
async fn supervise(
    session: Session,
    store: Arc<dyn SessionStore>,
    controller: Arc<PipelineController>,
    publisher: Option<Arc<Publisher>>,
) {
    let session_id = session.session_id.clone();
    let run = tokio::spawn(async move { controller.run(session).await });

    match run.await {
        Ok(finished) => {
            if finished.status != SessionStatus::Completed {
                return;
            }
            if let Some(publisher) = publisher {
                match publisher.publish(&session_id).await {
                    Ok(published) => info!(
                        session_id = %session_id,
                        artifacts = published.artifacts.len(),
                        "session auto-published"
                    ),
                    Err(e) => warn!(session_id = %session_id, error = %e, "Auto-publish failed"),
                }
            }
        }
        Err(join_error) => {
            error!(session_id = %session_id, error = %join_error, "pipeline task aborted");
            let Some(mut current) = store.get(&session_id) else {
                return;
            };
            if current.status.is_terminal() {
                return;
            }
            if current
                .fail(format!("Internal pipeline error: {}", join_error))
                .is_ok()
            {
                metrics::SESSIONS_FINISHED
                    .with_label_values(&[current.status.as_str()])
                    .inc();
                store.put(current);
            }
        }
    }
}
