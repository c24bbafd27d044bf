//! Narration synthesis: turns the narrative script into a spoken audio track.
//!
//! # Example
//!
//! ```ignore
//! use edapt_core::media::FfprobeProber;
//! use edapt_core::narration::{GoogleTtsSynthesizer, NarrationConfig, Synthesizer};
//!
//! let config = NarrationConfig::default().with_api_key(std::env::var("TTS_KEY")?);
//! let tts = GoogleTtsSynthesizer::new(config, Arc::new(FfprobeProber::new("ffprobe")));
//!
//! let audio = tts.synthesize("A derivative measures how fast something changes.").await?;
//! println!("{} bytes, {:.1}s", audio.bytes.len(), audio.duration_secs);
//! ```

mod config;
mod error;
mod google_tts;
mod traits;
mod types;

pub use config::NarrationConfig;
pub use error::SynthesisError;
pub use google_tts::GoogleTtsSynthesizer;
pub use traits::Synthesizer;
pub use types::{AudioEncoding, SynthesizedAudio, VoiceGender};
