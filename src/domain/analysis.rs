use crate::domain::prompt::GenerationMode;
use crate::domain::test_case::TestCaseRecord;
use serde::{Deserialize, Serialize};

/// Coarse progress of an in-flight analysis run.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Progress {
    #[default]
    Idle,
    Validating,
    ExtractingFrames,
    Analyzing,
    Done,
}

impl Progress {
    pub fn percent(&self) -> u8 {
        match self {
            Progress::Idle => 0,
            Progress::Validating => 10,
            Progress::ExtractingFrames => 20,
            Progress::Analyzing => 50,
            Progress::Done => 100,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutcome {
    pub mode: GenerationMode,
    pub raw: String,
    pub frame_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_cases: Option<Vec<TestCaseRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
}
