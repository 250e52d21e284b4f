//! Detail/summary page classification.

use serde::Serialize;

use super::patterns::SUMMARY_HEADER;
use crate::models::report::Line;

/// Kind of report page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    /// Transaction listing for one department.
    Detail,
    /// Trailing department/reason totals.
    Summary,
}

/// Whether a line is the summary table's column header.
pub fn is_summary_header(text: &str) -> bool {
    let lower = text.to_lowercase();
    (lower.contains("department") && lower.contains("reason") && lower.contains("items"))
        || SUMMARY_HEADER.is_match(text)
}

/// Classify a page by looking for the summary header row.
pub fn classify(lines: &[Line]) -> PageKind {
    if lines.iter().any(|line| is_summary_header(&line.text())) {
        PageKind::Summary
    } else {
        PageKind::Detail
    }
}
