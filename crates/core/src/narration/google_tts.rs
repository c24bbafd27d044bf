//! Google Cloud Text-to-Speech synthesizer (REST `text:synthesize`).

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::config::NarrationConfig;
use super::error::SynthesisError;
use super::traits::Synthesizer;
use super::types::{SynthesizedAudio, VoiceGender};
use crate::media::MediaProber;

pub struct GoogleTtsSynthesizer {
    client: reqwest::Client,
    config: NarrationConfig,
    prober: Arc<dyn MediaProber>,
}

impl GoogleTtsSynthesizer {
    pub fn new(config: NarrationConfig, prober: Arc<dyn MediaProber>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            config,
            prober,
        }
    }

    fn build_request<'a>(&'a self, text: &'a str) -> SynthesizeRequest<'a> {
        SynthesizeRequest {
            input: SynthesisInput { text },
            voice: VoiceSelection {
                language_code: &self.config.language_code,
                name: &self.config.voice_name,
                ssml_gender: self.config.gender,
            },
            audio_config: AudioConfig {
                audio_encoding: self.config.audio_encoding.api_name(),
                speaking_rate: self.config.speaking_rate,
                pitch: self.config.pitch,
                effects_profile_id: &self.config.effects_profile,
            },
        }
    }

    async fn synthesize_chunk(&self, api_key: &str, text: &str) -> Result<Vec<u8>, SynthesisError> {
        let response = self
            .client
            .post(format!("{}/v1/text:synthesize", self.config.api_base))
            .query(&[("key", api_key)])
            .json(&self.build_request(text))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SynthesisError::Timeout {
                        timeout_secs: self.config.request_timeout_secs,
                    }
                } else {
                    SynthesisError::Http(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GoogleErrorResponse>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);
            return Err(SynthesisError::Api { status, message });
        }

        let body: SynthesizeResponse = response
            .json()
            .await
            .map_err(|e| SynthesisError::InvalidResponse(e.to_string()))?;

        STANDARD
            .decode(body.audio_content.as_bytes())
            .map_err(|e| SynthesisError::InvalidResponse(format!("audioContent is not base64: {}", e)))
    }

    /// Measures the audio with ffprobe, falling back to a speaking-rate estimate.
    async fn measure_duration(&self, bytes: &[u8], text: &str) -> f64 {
        let scratch = self.config.work_dir.join(format!(
            "{}.{}",
            uuid::Uuid::new_v4(),
            self.config.audio_encoding.extension()
        ));

        let measured = async {
            tokio::fs::create_dir_all(&self.config.work_dir).await?;
            tokio::fs::write(&scratch, bytes).await?;
            Ok::<_, std::io::Error>(())
        }
        .await;

        let duration = match measured {
            Ok(()) => match self.prober.probe(&scratch).await {
                Ok(info) if info.duration_secs > 0.0 => Some(info.duration_secs),
                Ok(_) => None,
                Err(e) => {
                    warn!(error = %e, "Could not probe narration audio");
                    None
                }
            },
            Err(e) => {
                warn!(error = %e, "Could not write narration scratch file");
                None
            }
        };
        let _ = tokio::fs::remove_file(&scratch).await;

        duration.unwrap_or_else(|| {
            estimate_duration(text, self.config.words_per_second, self.config.speaking_rate)
        })
    }
}

#[async_trait]
impl Synthesizer for GoogleTtsSynthesizer {
    fn name(&self) -> &str {
        "google_tts"
    }

    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio, SynthesisError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| SynthesisError::NotConfigured("narration.api_key".to_string()))?;

        let text = text.trim();
        if text.is_empty() {
            return Err(SynthesisError::EmptyText);
        }

        let encoding = self.config.audio_encoding;
        let chunks = split_text(text, self.config.max_request_bytes);
        if chunks.len() > 1 && !encoding.is_concatenable() {
            return Err(SynthesisError::TextTooLong {
                bytes: text.len(),
                max_bytes: self.config.max_request_bytes,
            });
        }

        let mut bytes = Vec::new();
        for (index, chunk) in chunks.iter().enumerate() {
            debug!(chunk = index, len = chunk.len(), "synthesizing narration chunk");
            bytes.extend(self.synthesize_chunk(api_key, chunk).await?);
        }

        let duration_secs = self.measure_duration(&bytes, text).await;

        Ok(SynthesizedAudio {
            bytes,
            duration_secs,
            encoding,
        })
    }
}

/// Splits text into chunks of at most `max_bytes`, preferring sentence boundaries.
///
/// A single sentence longer than the limit is cut on whitespace, and a single
/// word longer than the limit is cut on a character boundary.
fn split_text(text: &str, max_bytes: usize) -> Vec<String> {
    if text.len() <= max_bytes || max_bytes == 0 {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in sentences(text) {
        if sentence.len() <= max_bytes {
            append_piece(sentence, &mut current, &mut chunks, max_bytes);
            continue;
        }
        for word in sentence.split_whitespace() {
            if word.len() <= max_bytes {
                append_piece(word, &mut current, &mut chunks, max_bytes);
                continue;
            }
            let mut rest = word;
            while !rest.is_empty() {
                let mut cut = rest.len().min(max_bytes);
                while !rest.is_char_boundary(cut) {
                    cut -= 1;
                }
                if cut == 0 {
                    // The limit is narrower than the next character: emit it whole
                    cut = rest.chars().next().map_or(rest.len(), char::len_utf8);
                }
                append_piece(&rest[..cut], &mut current, &mut chunks, max_bytes);
                rest = &rest[cut..];
            }
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn append_piece(piece: &str, current: &mut String, chunks: &mut Vec<String>, max_bytes: usize) {
    if !current.is_empty() && current.len() + 1 + piece.len() > max_bytes {
        chunks.push(std::mem::take(current));
    }
    if !current.is_empty() {
        current.push(' ');
    }
    current.push_str(piece);
}

fn sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split_inclusive(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn estimate_duration(text: &str, words_per_second: f64, speaking_rate: f32) -> f64 {
    let words = text.split_whitespace().count() as f64;
    let rate = words_per_second * f64::from(speaking_rate.max(0.25));
    if rate > 0.0 {
        words / rate
    } else {
        0.0
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig<'a>,
}

#[derive(Debug, Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    name: &'a str,
    ssml_gender: VoiceGender,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig<'a> {
    audio_encoding: &'static str,
    speaking_rate: f32,
    pitch: f32,
    effects_profile_id: &'a [String],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorResponse {
    error: GoogleErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    message: String,
}
