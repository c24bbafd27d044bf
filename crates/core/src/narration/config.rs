//! Configuration for narration synthesis.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::types::{AudioEncoding, VoiceGender};

/// Voice, audio and endpoint settings for Google Cloud Text-to-Speech.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrationConfig {
    /// API key sent as the `key` query parameter.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_language_code")]
    pub language_code: String,

    #[serde(default = "default_voice_name")]
    pub voice_name: String,

    #[serde(default)]
    pub gender: VoiceGender,

    /// Speaking rate, 0.25 to 4.0.
    #[serde(default = "default_speaking_rate")]
    pub speaking_rate: f32,

    /// Pitch in semitones, -20.0 to 20.0.
    #[serde(default)]
    pub pitch: f32,

    #[serde(default)]
    pub audio_encoding: AudioEncoding,

    #[serde(default = "default_effects_profile")]
    pub effects_profile: Vec<String>,

    /// Upper bound of a single synthesis request. Longer text is split on sentences.
    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: usize,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Used to estimate duration when the audio cannot be probed.
    #[serde(default = "default_words_per_second")]
    pub words_per_second: f64,

    /// Scratch space for probing synthesized audio.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
}

fn default_api_base() -> String {
    "https://texttospeech.googleapis.com".to_string()
}

fn default_language_code() -> String {
    "en-US".to_string()
}

fn default_voice_name() -> String {
    "en-US-Neural2-J".to_string()
}

fn default_speaking_rate() -> f32 {
    0.95
}

fn default_effects_profile() -> Vec<String> {
    vec!["small-bluetooth-speaker-class-device".to_string()]
}

fn default_max_request_bytes() -> usize {
    4800
}

fn default_request_timeout() -> u64 {
    60
}

fn default_words_per_second() -> f64 {
    2.5
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("edapt-narration")
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: default_api_base(),
            language_code: default_language_code(),
            voice_name: default_voice_name(),
            gender: VoiceGender::default(),
            speaking_rate: default_speaking_rate(),
            pitch: 0.0,
            audio_encoding: AudioEncoding::default(),
            effects_profile: default_effects_profile(),
            max_request_bytes: default_max_request_bytes(),
            request_timeout_secs: default_request_timeout(),
            words_per_second: default_words_per_second(),
            work_dir: default_work_dir(),
        }
    }
}

impl NarrationConfig {
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_work_dir(mut self, work_dir: PathBuf) -> Self {
        self.work_dir = work_dir;
        self
    }
}
