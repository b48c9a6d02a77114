use serde::{Deserialize, Serialize};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_THINKING_BUDGET: u32 = 32768;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LLMConfig {
    pub base_url: String,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub thinking_budget: Option<u32>,
    pub temperature: Option<f32>,
}

impl LLMConfig {
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_key: None,
            thinking_budget: Some(DEFAULT_THINKING_BUDGET),
            temperature: None,
        }
    }
}
