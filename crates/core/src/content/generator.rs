//! LLM-backed content generator.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

use super::config::ContentConfig;
use super::error::GenerationError;
use super::llm::{CompletionRequest, LlmClient};
use super::traits::ContentGenerator;
use super::types::{ContentRequest, GeneratedContent, SceneDescription};
use crate::metrics;
use crate::session::narrative::{build_timeline, SegmentDraft};
use crate::session::NarrativeSegment;

const SYSTEM_PROMPT: &str = "You are an experienced educator who turns questions into clear, \
well structured learning material. Follow the requested output format exactly.";

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_+-]*[ \t]*\r?\n?(.*?)```").expect("static regex is valid")
});

/// Generates content with four completions: topic, mindmap, narrative and scene script.
pub struct LlmContentGenerator {
    client: Arc<dyn LlmClient>,
    config: ContentConfig,
}

impl LlmContentGenerator {
    pub fn new(client: Arc<dyn LlmClient>, config: ContentConfig) -> Self {
        Self { client, config }
    }

    async fn ask(
        &self,
        step: &'static str,
        prompt: String,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, GenerationError> {
        let request = CompletionRequest::new(prompt)
            .with_system(SYSTEM_PROMPT)
            .with_max_tokens(max_tokens)
            .with_temperature(temperature);

        let response = self
            .client
            .complete(request)
            .await
            .map_err(|e| GenerationError::llm(step, e))?;

        metrics::LLM_TOKENS
            .with_label_values(&[self.client.provider(), "input"])
            .inc_by(response.usage.input_tokens as u64);
        metrics::LLM_TOKENS
            .with_label_values(&[self.client.provider(), "output"])
            .inc_by(response.usage.output_tokens as u64);

        debug!(
            step,
            model = %response.model,
            output_tokens = response.usage.output_tokens,
            "completion received"
        );

        let text = response.text.trim().to_string();
        if text.is_empty() {
            return Err(GenerationError::invalid_response(step, "empty response"));
        }
        Ok(text)
    }

    async fn extract_topic(&self, query: &str) -> Result<String, GenerationError> {
        let prompt = format!(
            "Name the main educational topic of this question in 2 to 4 words. \
             Reply with the topic only.\n\nQuestion: {}",
            query
        );
        let text = self.ask("topic", prompt, 32, 0.0).await?;
        let topic = clean_topic(&text);
        if topic.is_empty() {
            return Err(GenerationError::invalid_response("topic", "no topic in response"));
        }
        Ok(topic)
    }

    async fn generate_mindmap(&self, topic: &str, query: &str) -> Result<String, GenerationError> {
        let prompt = format!(
            "Write a Mermaid mindmap for the topic \"{topic}\".\n\
             Learner question: {query}\n\n\
             Rules:\n\
             - start with the keyword `mindmap`\n\
             - one root node named after the topic\n\
             - 5 to 7 main branches, each with 2 to 4 short child nodes\n\
             - plain labels, no emojis, ordered from fundamentals to applications\n\
             Output only the Mermaid source."
        );
        let text = self
            .ask("mindmap", prompt, self.config.max_tokens, self.config.temperature)
            .await?;
        let mindmap = strip_code_fence(&text);
        if !mindmap.trim_start().starts_with("mindmap") {
            return Err(GenerationError::invalid_response(
                "mindmap",
                "output does not start with `mindmap`",
            ));
        }
        Ok(mindmap)
    }

    async fn generate_narrative(
        &self,
        topic: &str,
        style: &str,
        target_duration_secs: u32,
    ) -> Result<Vec<NarrativeSegment>, GenerationError> {
        let target_words = (target_duration_secs as f64 * self.config.words_per_second) as u32;
        let prompt = format!(
            "Write a {style} spoken explanation of \"{topic}\" of about {target_words} words \
             ({target_duration_secs} seconds of speech).\n\
             Split it into 8 to 12 segments of 1 to 3 sentences that build from basics to \
             advanced ideas, with concrete examples.\n\n\
             Answer with a JSON array only, each element shaped like\n\
             {{\"segment_id\": 1, \"title\": \"Introduction\", \"content\": \"...\", \
             \"estimated_duration\": 10}}"
        );
        let text = self
            .ask("narrative", prompt, self.config.max_tokens, self.config.temperature)
            .await?;
        let drafts = parse_segments(&text)?;
        Ok(build_timeline(drafts, target_duration_secs as f64)?)
    }

    async fn generate_scene(
        &self,
        topic: &str,
        segments: &[NarrativeSegment],
        duration_secs: f64,
    ) -> Result<SceneDescription, GenerationError> {
        let scene_name = &self.config.scene_name;
        let outline = segments
            .iter()
            .map(|s| {
                format!(
                    "- segment {} ({:.1}s to {:.1}s): {}",
                    s.id, s.start_time, s.end_time, s.title
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "Write a Manim Community Edition scene that illustrates \"{topic}\".\n\
             The class must be named `{scene_name}` and derive from `Scene`.\n\
             The animation lasts {duration_secs:.1} seconds and follows this narration:\n\
             {outline}\n\n\
             Use self.wait() so visual transitions land on segment boundaries. \
             Target 854x480 at 15 fps. Output only Python code, starting with the imports."
        );
        let text = self
            .ask("scene", prompt, self.config.max_tokens, self.config.temperature)
            .await?;
        let code = strip_code_fence(&text);
        if !code.contains(&format!("class {}", scene_name)) {
            return Err(GenerationError::invalid_response(
                "scene",
                format!("script does not define class {}", scene_name),
            ));
        }
        Ok(SceneDescription {
            code,
            scene_name: scene_name.clone(),
            duration_secs,
        })
    }
}

#[async_trait]
impl ContentGenerator for LlmContentGenerator {
    fn name(&self) -> &str {
        self.client.provider()
    }

    async fn generate(&self, request: ContentRequest) -> Result<GeneratedContent, GenerationError> {
        let topic = self.extract_topic(&request.query).await?;
        info!(topic = %topic, "topic extracted");

        let mindmap = self.generate_mindmap(&topic, &request.query).await?;
        let segments = self
            .generate_narrative(&topic, &request.style, request.target_duration_secs)
            .await?;
        info!(segments = segments.len(), "narrative generated");

        let duration = segments.last().map(|s| s.end_time).unwrap_or_default();
        let scene = self.generate_scene(&topic, &segments, duration).await?;

        Ok(GeneratedContent {
            topic,
            mindmap,
            segments,
            scene,
        })
    }
}

/// Returns the body of the first fenced code block, or the trimmed text when there is none.
pub(crate) fn strip_code_fence(text: &str) -> String {
    CODE_FENCE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(text)
        .trim()
        .to_string()
}

fn clean_topic(text: &str) -> String {
    text.lines()
        .next()
        .unwrap_or_default()
        .trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '*' | '.'))
        .trim()
        .to_string()
}

#[derive(Debug, Deserialize)]
struct RawSegment {
    segment_id: u32,
    #[serde(default)]
    title: String,
    content: String,
    #[serde(default)]
    estimated_duration: f64,
}

fn parse_segments(text: &str) -> Result<Vec<SegmentDraft>, GenerationError> {
    let body = strip_code_fence(text);
    let json = match (body.find('['), body.rfind(']')) {
        (Some(start), Some(end)) if start < end => &body[start..=end],
        _ => {
            return Err(GenerationError::invalid_response(
                "narrative",
                "no JSON array in response",
            ))
        }
    };

    let raw: Vec<RawSegment> = serde_json::from_str(json)
        .map_err(|e| GenerationError::invalid_response("narrative", e.to_string()))?;

    Ok(raw
        .into_iter()
        .map(|s| SegmentDraft {
            id: s.segment_id,
            title: s.title,
            text: s.content,
            estimated_duration_secs: s.estimated_duration,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::LlmError;
    use crate::session::narrative::validate_timeline;
    use crate::testing::MockLlmClient;

    const NARRATIVE: &str = r#"```json
[
  {"segment_id": 1, "title": "Hook", "content": "Imagine a car speeding up.", "estimated_duration": 10},
  {"segment_id": 2, "title": "Slope", "content": "A derivative is a slope.", "estimated_duration": 20},
  {"segment_id": 3, "title": "Limit", "content": "We shrink the interval.", "estimated_duration": 10}
]
```"#;

    const SCENE: &str = "```python\nfrom manim import *\n\nclass GeneratedScene(Scene):\n    def construct(self):\n        self.wait(60)\n```";

    fn scripted_client() -> Arc<MockLlmClient> {
        let client = MockLlmClient::new();
        client.push_response("\"Derivatives in calculus\"");
        client.push_response("```mermaid\nmindmap\n  root((Derivatives))\n    Slope\n```");
        client.push_response(NARRATIVE);
        client.push_response(SCENE);
        Arc::new(client)
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```mermaid\nmindmap\n  root\n```"), "mindmap\n  root");
        assert_eq!(strip_code_fence("```\nplain\n```"), "plain");
        assert_eq!(strip_code_fence("  no fence here  "), "no fence here");
        assert_eq!(
            strip_code_fence("Here you go:\n```python\nprint(1)\n```\nEnjoy"),
            "print(1)"
        );
    }

    #[test]
    fn test_clean_topic() {
        assert_eq!(clean_topic("\"Photosynthesis basics\"\n"), "Photosynthesis basics");
        assert_eq!(clean_topic("**Entropy**."), "Entropy");
    }

    #[test]
    fn test_parse_segments_with_prose_around() {
        let text = "Sure! [{\"segment_id\": 2, \"content\": \"b\"}, {\"segment_id\": 1, \"content\": \"a\", \"estimated_duration\": 4}] hope it helps";
        let drafts = parse_segments(text).unwrap();
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].id, 2);
        assert_eq!(drafts[0].estimated_duration_secs, 0.0);
        assert_eq!(drafts[1].title, "");
    }

    #[test]
    fn test_parse_segments_rejects_non_array() {
        let result = parse_segments("{\"segment_id\": 1}");
        assert!(matches!(
            result,
            Err(GenerationError::InvalidResponse { step: "narrative", .. })
        ));
    }

    #[tokio::test]
    async fn test_generate_full_content() {
        let client = scripted_client();
        let generator = LlmContentGenerator::new(client.clone(), ContentConfig::default());

        let content = generator
            .generate(ContentRequest {
                query: "How do derivatives work?".to_string(),
                style: "intuitive".to_string(),
                target_duration_secs: 60,
            })
            .await
            .unwrap();

        assert_eq!(content.topic, "Derivatives in calculus");
        assert!(content.mindmap.starts_with("mindmap"));
        assert_eq!(content.segments.len(), 3);
        validate_timeline(&content.segments, 60.0).unwrap();
        assert_eq!(content.scene.scene_name, "GeneratedScene");
        assert!(content.scene.code.starts_with("from manim import *"));
        assert_eq!(content.scene.duration_secs, 60.0);

        let prompts = client.recorded_prompts();
        assert_eq!(prompts.len(), 4);
        assert!(prompts[0].contains("How do derivatives work?"));
        assert!(prompts[2].contains("150 words"));
        assert!(prompts[3].contains("segment 2"));
    }

    #[tokio::test]
    async fn test_generate_propagates_llm_error() {
        let client = Arc::new(MockLlmClient::new());
        client.set_next_error(LlmError::Api {
            status: 500,
            message: "boom".to_string(),
        });
        let generator = LlmContentGenerator::new(client, ContentConfig::default());

        let err = generator
            .generate(ContentRequest {
                query: "q".to_string(),
                style: "formal".to_string(),
                target_duration_secs: 30,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Llm { step: "topic", .. }));
    }

    #[tokio::test]
    async fn test_generate_rejects_scene_without_class() {
        let client = MockLlmClient::new();
        client.push_response("Entropy");
        client.push_response("mindmap\n  root((Entropy))");
        client.push_response(NARRATIVE);
        client.push_response("from manim import *\nclass Other(Scene): pass");
        let generator = LlmContentGenerator::new(Arc::new(client), ContentConfig::default());

        let err = generator
            .generate(ContentRequest {
                query: "What is entropy?".to_string(),
                style: "intuitive".to_string(),
                target_duration_secs: 40,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::InvalidResponse { step: "scene", .. }));
    }
}
