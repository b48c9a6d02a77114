use crate::domain::frame::Frame;
use crate::domain::prompt::{GenerationMode, GenerationPrompt, PromptPart};
use crate::domain::test_case::CSV_COLUMNS;

const TEST_CASE_SYSTEM_PROMPT: &str = r#"You are a software test case writer.
You receive frames sampled from a screen recording of a feature, a user flow or a bug reproduction. Each frame is preceded by its video timestamp. Study the whole recording and write detailed test cases.

Output format: CSV with exactly these columns, in this order, header row first:
{columns}

Rules:
- Be exhaustive. Write one atomic test case per user interaction: every button click, every navigation, every page load, every validation message appearing or disappearing.
- For every input field write separate cases for valid data, invalid data and the empty state.
- Label each case's Case Type as Positive, Negative, Boundary or UI.
- Test Steps are numbered, step-by-step actions.
- Expected Result describes the exact behaviour shown or expected.
- When the recording does not show an outcome, write "Not Executed" in Actual Result and "Not Run" in Result.
- When a bug is visible, describe it in Actual Result, Comments and Ticket If Any.
- Never leave a column blank; write NA when it does not apply.
- Quote any value that contains a comma.

Return ONLY the raw CSV. No Markdown code fences, no introduction, no closing remarks."#;

const DOCUMENTATION_SYSTEM_PROMPT: &str = r#"You are a senior technical writer. Write a knowledge-base article for the feature shown in the provided video frames.

Guidelines:
- Work out the feature flow, the UI elements involved and how the feature is used.
- Every frame is labelled with its video timestamp. Whenever you describe an action or suggest a screenshot, cite the timestamp in bold brackets, for example **[Video Timestamp: 2:15]**.
- Write clearly and concisely; use headings, bold text and lists for readability.

Use this structure:

# <Feature Name> - Knowledge Base Article

## Table of Contents
## Overview
Summary of the feature, key benefits, the problem it solves and where it fits in the product.
## Use Cases
Common scenarios with concrete examples.
## Feature Availability
Supported products and plan types.
## Prerequisites
Permissions, plans, dependencies, configuration and release status.
## Configuration and Setup
Detailed setup instructions. For steps visible in the video add *(Screenshot: [Video Timestamp: M:SS])*.
## Technical Details
How it works, compatibility, limitations, workarounds, error codes and verification.
## How to access and use the feature
Navigation path, numbered steps with expected outcomes, screenshot placeholders with timestamps, and tips or warnings for complex actions.
## Recommended Best Practices
## Troubleshooting/Known Issues
Common issues, fixes, and how to verify the feature works. End with a note pointing readers to support.
## FAQs"#;

const DEFAULT_USER_PROMPT: &str = "Analyze the provided video frames and generate the output.";

pub fn system_prompt(mode: GenerationMode) -> String {
    match mode {
        GenerationMode::TestCases => {
            let columns = CSV_COLUMNS
                .iter()
                .enumerate()
                .map(|(idx, column)| format!("{}. {}", idx + 1, column))
                .collect::<Vec<_>>()
                .join("\n");
            TEST_CASE_SYSTEM_PROMPT.replace("{columns}", &columns)
        }
        GenerationMode::Documentation => DOCUMENTATION_SYSTEM_PROMPT.to_string(),
    }
}

/// Trailing instruction; custom text from the user is appended verbatim.
pub fn user_prompt(custom_instructions: Option<&str>) -> String {
    match custom_instructions.filter(|text| !text.trim().is_empty()) {
        Some(text) => format!(
            "Additional Instructions: {}\n\nAnalyze the provided video frames.",
            text
        ),
        None => DEFAULT_USER_PROMPT.to_string(),
    }
}

/// Interleaves a timestamp label before every frame, then the trailing instruction.
pub fn build_generation_prompt(
    frames: &[Frame],
    mode: GenerationMode,
    custom_instructions: Option<&str>,
) -> GenerationPrompt {
    let mut parts = Vec::with_capacity(frames.len() * 2 + 1);
    for frame in frames {
        parts.push(PromptPart::Text(format!(
            "[Video Timestamp: {}]",
            frame.timestamp_label()
        )));
        parts.push(PromptPart::InlineImage {
            mime_type: frame.mime_type.clone(),
            data: frame.data.clone(),
        });
    }
    parts.push(PromptPart::Text(user_prompt(custom_instructions)));

    GenerationPrompt {
        system_instruction: system_prompt(mode),
        parts,
    }
}
