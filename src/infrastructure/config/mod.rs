use crate::domain::error::Result;
use crate::domain::llm_config::{
    LLMConfig, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL, DEFAULT_THINKING_BUDGET,
};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "framescribe.toml";
pub const ENV_PREFIX: &str = "FRAMESCRIBE_";

/// Uploads above this size are rejected before any work starts.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Browser origins allowed to call the API. Requests from any other origin are rejected.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub thinking_budget: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            thinking_budget: Some(DEFAULT_THINKING_BUDGET),
            temperature: None,
            timeout_secs: 300,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SamplingSettings {
    pub frame_count: u32,
    pub quality: f32,
    pub max_upload_bytes: u64,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            frame_count: 60,
            quality: 0.8,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    pub log_level: String,
    pub server: ServerSettings,
    pub llm: LlmSettings,
    pub sampling: SamplingSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            server: ServerSettings::default(),
            llm: LlmSettings::default(),
            sampling: SamplingSettings::default(),
        }
    }
}

impl AppConfig {
    /// Defaults, then `framescribe.toml`, then `FRAMESCRIBE_*` variables
    /// (`FRAMESCRIBE_LLM__MODEL=...` for nested keys).
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::figment(Path::new(CONFIG_FILE_NAME))
            .extract()
            .map_err(Into::into)
    }

    pub fn figment(file: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Request-level LLM settings; the key is resolved separately per request.
    pub fn llm_config(&self) -> LLMConfig {
        LLMConfig {
            base_url: self.llm.base_url.clone(),
            model: self.llm.model.clone(),
            api_key: None,
            thinking_budget: self.llm.thinking_budget,
            temperature: self.llm.temperature,
        }
    }
}
