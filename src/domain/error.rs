use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum AppError {
    Internal(String),
    ValidationError(String),
    ParseError(String),
    LLMError(String),
    SecurityError(String),
    SamplingError(String),
    IoError(String),
    ConfigError(String),
}

impl AppError {
    /// Input problems the caller can fix before retrying.
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::ValidationError(_))
    }

    pub(crate) fn sampling(cause: impl fmt::Display) -> Self {
        AppError::SamplingError(format!("Frame sampling failed: {}", cause))
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            AppError::LLMError(msg) => write!(f, "LLM error: {}", msg),
            AppError::SecurityError(msg) => write!(f, "Security error: {}", msg),
            AppError::SamplingError(msg) => write!(f, "{}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::Internal(format!("Image encoding failed: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::LLMError(format!("Request failed: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ParseError(err.to_string())
    }
}

impl From<figment::Error> for AppError {
    fn from(err: figment::Error) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampling_error_message() {
        let err = AppError::sampling("seek to 4.000s failed");
        assert_eq!(
            err.to_string(),
            "Frame sampling failed: seek to 4.000s failed"
        );
    }

    #[test]
    fn test_validation_flag() {
        assert!(AppError::ValidationError("x".into()).is_validation());
        assert!(!AppError::LLMError("x".into()).is_validation());
    }
}
