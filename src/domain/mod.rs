pub mod analysis;
pub mod error;
pub mod frame;
pub mod llm_config;
pub mod prompt;
pub mod test_case;
