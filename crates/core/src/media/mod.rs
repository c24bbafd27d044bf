//! Shared ffmpeg toolchain configuration and media probing.

mod config;
mod probe;

pub use config::MediaConfig;
pub use probe::{FfprobeProber, MediaInfo, MediaProber, ProbeError};
