use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::content::{ContentConfig, LlmProvider};
use crate::media::MediaConfig;
use crate::narration::{AudioEncoding, NarrationConfig};
use crate::pipeline::PipelineConfig;
use crate::render::RendererConfig;

/// Root configuration. Every section is optional in the file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub narration: NarrationConfig,
    #[serde(default)]
    pub renderer: RendererConfig,
    #[serde(default)]
    pub media: MediaConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8000
}

/// Where session artifacts live and where published copies are served from.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Session-scoped working storage (`<output_dir>/<session_id>/`).
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Root of the publicly served tree.
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,
    /// URL prefix `public_dir` is mounted under.
    #[serde(default = "default_public_url_prefix")]
    pub public_url_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            public_dir: default_public_dir(),
            public_url_prefix: default_public_url_prefix(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_public_url_prefix() -> String {
    "/public".to_string()
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub pipeline: PipelineConfig,
    pub content: SanitizedContentConfig,
    pub narration: SanitizedNarrationConfig,
    pub renderer: RendererConfig,
    pub media: MediaConfig,
}

/// Content generation config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedContentConfig {
    pub provider: LlmProvider,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    pub api_key_configured: bool,
    pub max_tokens: u32,
    pub temperature: f32,
    pub words_per_second: f64,
}

/// Narration config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedNarrationConfig {
    pub api_base: String,
    pub api_key_configured: bool,
    pub language_code: String,
    pub voice_name: String,
    pub speaking_rate: f32,
    pub audio_encoding: AudioEncoding,
}

fn key_configured(key: &Option<String>) -> bool {
    key.as_deref().is_some_and(|k| !k.trim().is_empty())
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            storage: config.storage.clone(),
            pipeline: config.pipeline.clone(),
            content: SanitizedContentConfig {
                provider: config.content.provider,
                model: config.content.model.clone(),
                api_base: config.content.api_base.clone(),
                api_key_configured: key_configured(&config.content.api_key),
                max_tokens: config.content.max_tokens,
                temperature: config.content.temperature,
                words_per_second: config.content.words_per_second,
            },
            narration: SanitizedNarrationConfig {
                api_base: config.narration.api_base.clone(),
                api_key_configured: key_configured(&config.narration.api_key),
                language_code: config.narration.language_code.clone(),
                voice_name: config.narration.voice_name.clone(),
                speaking_rate: config.narration.speaking_rate,
                audio_encoding: config.narration.audio_encoding,
            },
            renderer: config.renderer.clone(),
            media: config.media.clone(),
        }
    }
}
