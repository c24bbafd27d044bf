//! Pipeline controller: drives one session from submission to a terminal status.
//!
//! Stage order:
//! 1. Content generation (fatal on failure)
//! 2. Narration synthesis and animation rendering, concurrently
//! 3. Muxing the narration onto the animation
//!
//! Narration failures fail the session. Rendering and muxing failures are
//! recorded on the `video` artifact and the session still completes.
//!
//! # Example
//!
//! ```ignore
//! use edapt_core::pipeline::{PipelineConfig, PipelineController, StageAdapters};
//!
//! let controller = PipelineController::new(
//!     PipelineConfig::default(),
//!     output_dir,
//!     store.clone(),
//!     StageAdapters { generator, synthesizer, renderer, muxer },
//! );
//! let finished = controller.run(session).await;
//! ```

mod config;
mod controller;
mod error;

pub use config::{PipelineConfig, StageTimeouts};
pub use controller::{
    PipelineController, StageAdapters, FINAL_VIDEO_FILE, MINDMAP_FILE, SNAPSHOT_FILE,
};
pub use error::PipelineError;
