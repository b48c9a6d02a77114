use super::LLMClient;
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;
use crate::domain::prompt::{GenerationPrompt, PromptPart};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

#[derive(Serialize)]
struct GeminiRequest {
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(rename = "thinkingConfig", skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Serialize)]
struct ThinkingConfig {
    #[serde(rename = "thinkingBudget")]
    thinking_budget: u32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Deserialize)]
struct GeminiCandidatePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Deserialize)]
struct GeminiModelsResponse {
    models: Option<Vec<GeminiModelInfo>>,
}

#[derive(Deserialize)]
struct GeminiModelInfo {
    name: String,
}

pub struct GeminiClient {
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(300))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    fn api_key(config: &LLMConfig) -> Result<String> {
        config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AppError::LLMError("Missing API key for Gemini".to_string()))
    }

    fn endpoint(base_url: &str, path: &str, api_key: &str) -> Result<Url> {
        let base_url = base_url.trim_end_matches('/');
        let raw = if path.is_empty() {
            base_url.to_string()
        } else {
            format!("{}/{}", base_url, path)
        };
        Url::parse_with_params(&raw, &[("key", api_key)])
            .map_err(|e| AppError::LLMError(format!("Invalid base URL {}: {}", base_url, e)))
    }

    fn build_request(config: &LLMConfig, prompt: &GenerationPrompt) -> GeminiRequest {
        let parts = prompt
            .parts
            .iter()
            .map(|part| match part {
                PromptPart::Text(text) => GeminiPart::Text { text: text.clone() },
                PromptPart::InlineImage { mime_type, data } => GeminiPart::InlineData {
                    inline_data: InlineData {
                        mime_type: mime_type.clone(),
                        data: data.clone(),
                    },
                },
            })
            .collect();

        let system_instruction = if prompt.system_instruction.trim().is_empty() {
            None
        } else {
            Some(GeminiContent {
                parts: vec![GeminiPart::Text {
                    text: prompt.system_instruction.clone(),
                }],
                role: None,
            })
        };

        let generation_config = if config.temperature.is_some() || config.thinking_budget.is_some()
        {
            Some(GenerationConfig {
                temperature: config.temperature.map(f64::from),
                thinking_config: config.thinking_budget.map(|thinking_budget| ThinkingConfig {
                    thinking_budget,
                }),
            })
        } else {
            None
        };

        GeminiRequest {
            system_instruction,
            contents: vec![GeminiContent {
                parts,
                role: Some("user".to_string()),
            }],
            generation_config,
        }
    }

    /// Joins the visible text parts of the first candidate. Thought parts are skipped.
    fn extract_text(response: GeminiResponse) -> Option<String> {
        let content = response.candidates.into_iter().next()?.content?;
        let text: String = content
            .parts
            .into_iter()
            .filter(|part| !part.thought)
            .filter_map(|part| part.text)
            .collect();

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

impl Default for GeminiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LLMClient for GeminiClient {
    async fn generate(&self, config: &LLMConfig, prompt: &GenerationPrompt) -> Result<String> {
        let api_key = Self::api_key(config)?;
        let model_id = config.model.trim();
        let url = Self::endpoint(
            &config.base_url,
            &format!("{}:generateContent", model_id),
            &api_key,
        )?;

        let body = Self::build_request(config, prompt);

        tracing::info!(
            model = %model_id,
            images = prompt.image_count(),
            "Sending frames to Gemini"
        );

        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::LLMError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, "Gemini returned an error status");
            return Err(AppError::LLMError(format!(
                "API error ({}): {}",
                status, text
            )));
        }

        let json: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AppError::LLMError(format!("Failed to parse JSON: {}", e)))?;

        Self::extract_text(json)
            .ok_or_else(|| AppError::LLMError("No text generated from Gemini".to_string()))
    }

    async fn list_models(&self, config: &LLMConfig) -> Result<Vec<String>> {
        let api_key = Self::api_key(config)?;
        let url = Self::endpoint(&config.base_url, "", &api_key)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::LLMError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::LLMError(format!(
                "API error ({}): {}",
                status, text
            )));
        }

        let json: GeminiModelsResponse = response
            .json()
            .await
            .map_err(|e| AppError::LLMError(format!("Failed to parse JSON: {}", e)))?;

        let models = json
            .models
            .unwrap_or_default()
            .into_iter()
            .map(|model| {
                model
                    .name
                    .strip_prefix("models/")
                    .unwrap_or(model.name.as_str())
                    .to_string()
            })
            .collect();

        Ok(models)
    }
}
