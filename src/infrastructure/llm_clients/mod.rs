pub mod gemini;

use crate::domain::error::Result;
use crate::domain::llm_config::LLMConfig;
use crate::domain::prompt::GenerationPrompt;
use async_trait::async_trait;

pub use gemini::GeminiClient;

/// Multimodal generation service. Errors are surfaced to callers verbatim.
#[async_trait]
pub trait LLMClient {
    async fn generate(&self, config: &LLMConfig, prompt: &GenerationPrompt) -> Result<String>;
    async fn list_models(&self, config: &LLMConfig) -> Result<Vec<String>>;
}
