//! Media muxing: attaches the narration track to the rendered animation.
//!
//! # Example
//!
//! ```ignore
//! use edapt_core::mux::{FfmpegMuxer, MuxJob, Muxer};
//!
//! let muxer = FfmpegMuxer::new(media_config, prober);
//! let video = muxer
//!     .mux(MuxJob::new("abc", video_path, audio_path).with_speed(1.25))
//!     .await?;
//! ```

mod error;
mod ffmpeg;
mod traits;
mod types;

pub use error::MuxError;
pub use ffmpeg::FfmpegMuxer;
pub use traits::Muxer;
pub use types::{MuxJob, MuxedVideo};
