// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// Tabular model output -> test case records

mod test_case_parser;

pub use test_case_parser::{split_line, TestCaseParser, MIN_COLUMNS};
