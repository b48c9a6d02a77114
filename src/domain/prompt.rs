use serde::{Deserialize, Serialize};

/// Which artifact the model is asked to produce.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerationMode {
    /// CSV with the fixed 13-column schema.
    #[default]
    TestCases,
    /// Markdown knowledge-base article.
    Documentation,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum PromptPart {
    Text(String),
    InlineImage { mime_type: String, data: String },
}

/// Everything sent to the generation service for one request.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationPrompt {
    pub system_instruction: String,
    pub parts: Vec<PromptPart>,
}

impl GenerationPrompt {
    pub fn image_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|part| matches!(part, PromptPart::InlineImage { .. }))
            .count()
    }
}
