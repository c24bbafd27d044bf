//! Animation rendering: turns a scene script into a silent video.
//!
//! The production renderer shells out to Manim Community Edition. Each job
//! runs in its own scratch directory under `work_dir`, which is removed once
//! the output has been read back.
//!
//! # Example
//!
//! ```ignore
//! use edapt_core::render::{ManimRenderer, RenderFormat, RenderJob, RenderQuality, Renderer, RendererConfig};
//!
//! let renderer = ManimRenderer::new(RendererConfig::default(), prober);
//! renderer.validate().await?;
//!
//! let video = renderer
//!     .render(RenderJob {
//!         job_id: "abc".to_string(),
//!         scene,
//!         quality: RenderQuality::Low,
//!         format: RenderFormat::Mp4,
//!     })
//!     .await?;
//! ```

mod config;
mod error;
mod manim;
mod traits;
mod types;

pub use config::RendererConfig;
pub use error::RenderError;
pub use manim::ManimRenderer;
pub use traits::Renderer;
pub use types::{RenderFormat, RenderJob, RenderQuality, RenderedVideo};
