//! Mock narration synthesizer for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;

use crate::narration::{AudioEncoding, SynthesisError, SynthesizedAudio, Synthesizer};

/// Leading bytes of every clip [`MockSynthesizer`] returns.
pub const MOCK_AUDIO: &[u8] = b"ID3mock-narration";

/// A mock clip: [`MOCK_AUDIO`] followed by its duration, so mocks further
/// down the pipeline can "probe" it.
pub fn mock_audio(duration_secs: f64) -> Vec<u8> {
    let mut bytes = MOCK_AUDIO.to_vec();
    bytes.extend(format!(";duration={:.3}", duration_secs).into_bytes());
    bytes
}

/// Reads the duration back out of a [`mock_audio`] clip.
pub fn mock_audio_duration(bytes: &[u8]) -> Option<f64> {
    let tail = bytes.strip_prefix(MOCK_AUDIO)?;
    std::str::from_utf8(tail)
        .ok()?
        .strip_prefix(";duration=")?
        .parse()
        .ok()
}

/// Mock implementation of the Synthesizer trait. Records every text it is asked to speak.
#[derive(Debug, Default)]
pub struct MockSynthesizer {
    texts: Mutex<Vec<String>>,
    next_error: Mutex<Option<SynthesisError>>,
    delay: Mutex<Option<Duration>>,
}

impl MockSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_next_error(&self, error: SynthesisError) {
        *self.next_error.lock() = Some(error);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub fn recorded_texts(&self) -> Vec<String> {
        self.texts.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.texts.lock().len()
    }
}

#[async_trait]
impl Synthesizer for MockSynthesizer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio, SynthesisError> {
        self.texts.lock().push(text.to_string());

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.next_error.lock().take() {
            return Err(error);
        }

        let duration_secs = text.split_whitespace().count() as f64 / 2.5;
        Ok(SynthesizedAudio {
            bytes: mock_audio(duration_secs),
            duration_secs,
            encoding: AudioEncoding::Mp3,
        })
    }
}
