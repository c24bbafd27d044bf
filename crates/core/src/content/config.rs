//! Configuration for content generation.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::llm::{AnthropicClient, GeminiClient, LlmClient, LlmError, OllamaClient};

/// Which LLM backend writes the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    Anthropic,
    Gemini,
    Ollama,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
            Self::Ollama => "ollama",
        }
    }

    /// Hosted providers authenticate with `content.api_key`.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Ollama)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentConfig {
    #[serde(default = "default_provider")]
    pub provider: LlmProvider,

    #[serde(default = "default_model")]
    pub model: String,

    /// Required for Anthropic and Gemini, ignored by Ollama.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Overrides the provider's default endpoint.
    #[serde(default)]
    pub api_base: Option<String>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Average speaking rate used to size the narrative.
    #[serde(default = "default_words_per_second")]
    pub words_per_second: f64,

    /// Class name the generated animation script must define.
    #[serde(default = "default_scene_name")]
    pub scene_name: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_provider() -> LlmProvider {
    LlmProvider::Anthropic
}

fn default_model() -> String {
    "claude-3-5-sonnet-latest".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.7
}

fn default_words_per_second() -> f64 {
    2.5
}

fn default_scene_name() -> String {
    "GeneratedScene".to_string()
}

fn default_request_timeout() -> u64 {
    120
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            api_base: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            words_per_second: default_words_per_second(),
            scene_name: default_scene_name(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ContentConfig {
    /// Builds the LLM client this configuration describes.
    pub fn build_client(&self) -> Result<Arc<dyn LlmClient>, LlmError> {
        let timeout = Duration::from_secs(self.request_timeout_secs);
        let api_key = || {
            self.api_key
                .clone()
                .filter(|k| !k.is_empty())
                .ok_or_else(|| {
                    LlmError::NotConfigured(format!(
                        "content.api_key is required for {}",
                        self.provider.as_str()
                    ))
                })
        };
        let api_base = self.api_base.clone();

        let client: Arc<dyn LlmClient> = match self.provider {
            LlmProvider::Anthropic => {
                let client = AnthropicClient::new(api_key()?, self.model.clone(), timeout);
                Arc::new(match api_base {
                    Some(base) => client.with_api_base(base),
                    None => client,
                })
            }
            LlmProvider::Gemini => {
                let client = GeminiClient::new(api_key()?, self.model.clone(), timeout);
                Arc::new(match api_base {
                    Some(base) => client.with_api_base(base),
                    None => client,
                })
            }
            LlmProvider::Ollama => {
                let client = OllamaClient::new(self.model.clone(), timeout);
                Arc::new(match api_base {
                    Some(base) => client.with_api_base(base),
                    None => client,
                })
            }
        };
        Ok(client)
    }
}
