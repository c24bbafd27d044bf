//! Publisher: copies a completed session's artifacts into the public tree.
//!
//! Published layout is `<public_dir>/generated/<session_id>/` with
//! `mindmap.txt`, `narration.<ext>` and `video.mp4`. Failed or missing
//! artifacts are skipped. Republishing overwrites the same files.

mod error;
mod fs_publisher;
mod types;

pub use error::PublishError;
pub use fs_publisher::{public_file_name, Publisher, PUBLIC_SUBDIR};
pub use types::{PublishedArtifact, PublishedSession};
