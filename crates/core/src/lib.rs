pub mod config;
pub mod content;
pub mod dispatcher;
pub mod media;
pub mod metrics;
pub mod mux;
pub mod narration;
pub mod pipeline;
pub mod publisher;
pub mod render;
pub mod session;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
    StorageConfig,
};
pub use dispatcher::{DispatchError, JobDispatcher};
pub use pipeline::{PipelineConfig, PipelineController, PipelineError, StageAdapters};
pub use publisher::{PublishError, PublishedArtifact, PublishedSession, Publisher};
pub use session::{
    ArtifactEntry, ArtifactKind, GenerationRequest, InMemorySessionStore, Session, SessionHandle,
    SessionId, SessionStatus, SessionStore, SessionSummary,
};
