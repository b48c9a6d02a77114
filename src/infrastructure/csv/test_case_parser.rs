// ============================================================
// TEST CASE PARSER
// ============================================================
// Permissive reader for the model's 13-column CSV output. Never fails:
// anything it cannot use is dropped and an empty result means "no data".

use crate::domain::test_case::{TestCaseRecord, DEFAULT_CASE_TYPE, PLACEHOLDER};

/// Columns a row must carry to be accepted (id .. expected result).
pub const MIN_COLUMNS: usize = 8;

#[derive(Debug, Default, Clone, Copy)]
pub struct TestCaseParser;

impl TestCaseParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse raw model text into records, preserving line order.
    ///
    /// The first line is always treated as the header. Rows with fewer than
    /// [`MIN_COLUMNS`] cells are skipped; missing trailing columns default to
    /// `-` (or `Positive` for the case type).
    pub fn parse(&self, raw: &str) -> Vec<TestCaseRecord> {
        let content = raw.trim();
        if content.is_empty() {
            return Vec::new();
        }

        let lines: Vec<&str> = content.split('\n').collect();
        if lines.len() < 2 {
            return Vec::new();
        }

        let mut records = Vec::new();
        for line in &lines[1..] {
            if line.trim().is_empty() {
                continue;
            }

            let cells = split_line(line);
            if cells.len() < MIN_COLUMNS {
                tracing::debug!(cells = cells.len(), "Skipping short CSV row");
                continue;
            }

            records.push(Self::build_record(&cells));
        }

        records
    }

    fn build_record(cells: &[String]) -> TestCaseRecord {
        let cell = |idx: usize, default: &str| -> String {
            match cells.get(idx) {
                Some(value) if !value.is_empty() => value.clone(),
                _ => default.to_string(),
            }
        };

        TestCaseRecord {
            id: cell(0, PLACEHOLDER),
            scenario: cell(1, PLACEHOLDER),
            module: cell(2, PLACEHOLDER),
            case_type: cell(3, DEFAULT_CASE_TYPE),
            title: cell(4, PLACEHOLDER),
            preconditions: cell(5, PLACEHOLDER),
            steps: cell(6, PLACEHOLDER),
            expected_result: cell(7, PLACEHOLDER),
            actual_result: cell(8, PLACEHOLDER),
            result: cell(9, PLACEHOLDER),
            comments: cell(10, PLACEHOLDER),
            ticket: cell(11, PLACEHOLDER),
            owner: cell(12, PLACEHOLDER),
        }
    }
}

/// Quote-aware comma split. A `"` toggles quoted mode and is not kept; an
/// unterminated quote turns every later comma on the line into text.
pub fn split_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quote = !in_quote,
            ',' if !in_quote => {
                cells.push(clean_cell(&current));
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    cells.push(clean_cell(&current));

    cells
}

fn clean_cell(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('"').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('"').unwrap_or(trimmed);
    trimmed.to_string()
}
