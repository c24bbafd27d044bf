//! Sessions: the record of one generation request and where it is kept.
//!
//! A [`Session`] starts in `processing` when the dispatcher accepts a request
//! and ends in `completed` or `failed`. Artifacts are attached as stages
//! finish and are never replaced. The [`SessionStore`] is the only state shared
//! between the pipeline runs and the callers polling for status.
//!
//! # Example
//!
//! ```ignore
//! use edapt_core::session::{GenerationRequest, InMemorySessionStore, Session, SessionId, SessionStore};
//!
//! let store = InMemorySessionStore::new();
//! let session = Session::new(SessionId::generate(), &GenerationRequest::new("How do vaccines work?"));
//! store.put(session.clone());
//!
//! let fetched = store.get(&session.session_id).expect("just stored");
//! assert!(!fetched.status.is_terminal());
//! ```

mod error;
pub mod narrative;
mod store;
mod types;

pub use error::SessionError;
pub use narrative::{NarrativeSegment, SegmentDraft, TimelineError};
pub use store::{InMemorySessionStore, SessionStore};
pub use types::{
    ArtifactEntry, ArtifactKind, ArtifactMetadata, ArtifactRecord, GenerationRequest, Session,
    SessionHandle, SessionId, SessionStatus, SessionSummary,
};
