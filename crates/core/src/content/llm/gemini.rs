//! Google Gemini `generateContent` API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use super::{
    nested_error_message, CompletionRequest, CompletionResponse, JsonTransport, LlmClient,
    LlmError, LlmUsage,
};

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

pub struct GeminiClient {
    transport: JsonTransport,
    api_key: String,
    model: String,
    api_base: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            transport: JsonTransport::new(timeout),
            api_key: api_key.into(),
            model: model.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }

    fn body(request: CompletionRequest) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part {
                    text: request.prompt,
                }],
            }],
            system_instruction: request.system.map(|text| Content {
                role: None,
                parts: vec![Part { text }],
            }),
            generation_config: GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    fn into_completion(self, requested_model: &str) -> Result<CompletionResponse, LlmError> {
        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = self
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates".to_string());
            return Err(LlmError::Empty(format!("prompt blocked: {}", reason)));
        };

        let finish_reason = candidate.finish_reason.unwrap_or_default();
        if finish_reason == "MAX_TOKENS" {
            warn!(model = requested_model, "completion truncated at max output tokens");
        }

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(LlmError::Empty(format!(
                "candidate has no text (finish reason: {})",
                finish_reason
            )));
        }

        let usage = self
            .usage_metadata
            .map(|u| LlmUsage {
                input_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            text,
            usage,
            model: self
                .model_version
                .unwrap_or_else(|| requested_model.to_string()),
        })
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    fn provider(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let http = self
            .transport
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::body(request));

        let parsed: GenerateContentResponse =
            self.transport.send(http, nested_error_message).await?;
        parsed.into_completion(&self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let client = GeminiClient::new("key", "gemini-1.5-flash", Duration::from_secs(5))
            .with_api_base("http://localhost:9000/");
        assert_eq!(
            client.endpoint(),
            "http://localhost:9000/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_body_shape() {
        let body = GeminiClient::body(
            CompletionRequest::new("Explain orbits")
                .with_system("You write lessons")
                .with_max_tokens(2048)
                .with_temperature(0.25),
        );
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Explain orbits");
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "You write lessons");
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 2048);
        assert_eq!(json["generationConfig"]["temperature"], 0.25);
    }

    #[test]
    fn test_body_without_system() {
        let json = serde_json::to_value(GeminiClient::body(CompletionRequest::new("q"))).unwrap();
        assert!(json.get("systemInstruction").is_none());
    }

    #[test]
    fn test_response_joins_parts_and_reads_usage() {
        let raw = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Orbits are "}, {"text": "falling sideways."}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 5, "totalTokenCount": 17},
            "modelVersion": "gemini-1.5-flash-002"
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        let completion = parsed.into_completion("gemini-1.5-flash").unwrap();
        assert_eq!(completion.text, "Orbits are falling sideways.");
        assert_eq!(completion.model, "gemini-1.5-flash-002");
        assert_eq!(
            completion.usage,
            LlmUsage {
                input_tokens: 12,
                output_tokens: 5
            }
        );
    }

    #[test]
    fn test_blocked_prompt_is_empty_error() {
        let raw = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        let err = parsed.into_completion("gemini-1.5-flash").unwrap_err();
        assert!(matches!(err, LlmError::Empty(ref reason) if reason.contains("SAFETY")));
    }

    #[test]
    fn test_candidate_without_parts_is_empty_error() {
        let raw = r#"{"candidates": [{"finishReason": "RECITATION"}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        let err = parsed.into_completion("gemini-1.5-flash").unwrap_err();
        assert!(matches!(err, LlmError::Empty(ref reason) if reason.contains("RECITATION")));
    }
}
