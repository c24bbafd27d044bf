//! Types for the narration module.

use serde::{Deserialize, Serialize};

/// Audio container/codec produced by the synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioEncoding {
    #[default]
    Mp3,
    /// 16-bit PCM in a WAV container.
    Linear16,
    OggOpus,
}

impl AudioEncoding {
    /// Name used by the Google Text-to-Speech API.
    pub fn api_name(&self) -> &'static str {
        match self {
            Self::Mp3 => "MP3",
            Self::Linear16 => "LINEAR16",
            Self::OggOpus => "OGG_OPUS",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Linear16 => "wav",
            Self::OggOpus => "ogg",
        }
    }

    /// Whether independently encoded chunks can be joined byte-wise.
    pub fn is_concatenable(&self) -> bool {
        matches!(self, Self::Mp3)
    }
}

/// Voice gender requested from the TTS service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoiceGender {
    #[default]
    Male,
    Female,
    Neutral,
}

/// Output of the narration stage.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedAudio {
    pub bytes: Vec<u8>,
    pub duration_secs: f64,
    pub encoding: AudioEncoding,
}
