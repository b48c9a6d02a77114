use once_cell::sync::Lazy;
use regex::Regex;

static THINK_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<think>[\s\S]*?</think>|<think\s*/>").unwrap());

static REASONING_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<reasoning>[\s\S]*?</reasoning>").unwrap());

// Whole-response fence such as ```csv ... ``` or ```markdown ... ```.
static CODE_FENCE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^```[A-Za-z0-9_-]*[ \t]*\r?\n([\s\S]*?)\r?\n?```$").unwrap());

static LINE_LEADING_FENCE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*```").unwrap());

static MULTIPLE_NEWLINES_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Removes reasoning tags and an enclosing code fence from model output.
pub fn clean_llm_response(response: &str) -> String {
    let mut cleaned = THINK_TAG_PATTERN.replace_all(response, "").to_string();
    cleaned = REASONING_TAG_PATTERN.replace_all(&cleaned, "").to_string();
    cleaned = cleaned.trim().to_string();
    cleaned = unwrap_code_fence(&cleaned);

    MULTIPLE_NEWLINES_PATTERN
        .replace_all(&cleaned, "\n\n")
        .to_string()
}

/// Returns the fenced body when the whole text is a single fenced block.
/// Text that opens and closes with two different blocks is left alone.
pub fn unwrap_code_fence(text: &str) -> String {
    let trimmed = text.trim();
    let body = CODE_FENCE_PATTERN
        .captures(trimmed)
        .and_then(|captures| captures.get(1))
        .map(|body| body.as_str());

    match body {
        Some(body) if !LINE_LEADING_FENCE_PATTERN.is_match(body) => body.trim().to_string(),
        _ => trimmed.to_string(),
    }
}
