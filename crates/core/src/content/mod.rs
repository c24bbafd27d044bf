//! Content generation: the first pipeline stage.
//!
//! Turns a free-form learning query into a topic, a Mermaid mindmap, a timed
//! narrative and a Manim scene script. The production implementation asks an
//! LLM (Anthropic, Gemini or a local Ollama) for each piece in turn.
//!
//! # Example
//!
//! ```ignore
//! use edapt_core::content::{ContentConfig, ContentGenerator, ContentRequest, LlmContentGenerator};
//!
//! let config = ContentConfig::default();
//! let generator = LlmContentGenerator::new(config.build_client()?, config);
//!
//! let content = generator
//!     .generate(ContentRequest {
//!         query: "Why is the sky blue?".to_string(),
//!         style: "intuitive".to_string(),
//!         target_duration_secs: 90,
//!     })
//!     .await?;
//! println!("{}: {} segments", content.topic, content.segments.len());
//! ```

mod config;
mod error;
mod generator;
mod llm;
mod traits;
mod types;

pub use config::{ContentConfig, LlmProvider};
pub use error::GenerationError;
pub use generator::LlmContentGenerator;
pub use llm::{
    AnthropicClient, CompletionRequest, CompletionResponse, GeminiClient, LlmClient, LlmError,
    LlmUsage, OllamaClient,
};
pub use traits::ContentGenerator;
pub use types::{ContentRequest, GeneratedContent, SceneDescription};
