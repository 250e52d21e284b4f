//! Record tokenizer for anchor-offset detail pages.
//!
//! Splits the lines between the column header and the `Total` line into
//! candidate record blocks. A block starts at a line whose first token is a
//! confirmation number or a long bare number; any other line continues the
//! open block.

use tracing::trace;

use super::patterns::{CONF_NUMBER, LONG_NUMBER};
use crate::models::report::Line;

/// Raw text of one candidate record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordBlock {
    /// Source lines in page order.
    pub lines: Vec<String>,
}

impl RecordBlock {
    /// All tokens of the block, in order.
    pub fn tokens(&self) -> Vec<&str> {
        self.lines.iter().flat_map(|l| l.split_whitespace()).collect()
    }
}

/// Whether a line is the detail table's column header.
pub fn is_record_header(text: &str) -> bool {
    let trimmed = text.trim_start();
    let starts_with_conf = trimmed
        .get(..4)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("conf"));
    starts_with_conf || (text.contains("Conf") && text.contains("Date") && text.contains("User"))
}

/// Whether a line closes the record region.
pub fn is_total_line(text: &str) -> bool {
    text.trim_start()
        .get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("total"))
}

fn starts_record(text: &str) -> bool {
    text.split_whitespace()
        .next()
        .is_some_and(|first| CONF_NUMBER.is_match(first) || LONG_NUMBER.is_match(first))
}

/// Lines between the column header (exclusive) and the first total line.
///
/// Without a header the region starts at the top of the page.
pub fn record_region(texts: &[String]) -> &[String] {
    let start = texts
        .iter()
        .position(|t| is_record_header(t))
        .map_or(0, |i| i + 1);
    let end = texts[start..]
        .iter()
        .position(|t| is_total_line(t))
        .map_or(texts.len(), |i| start + i);
    &texts[start..end]
}

/// Partition a detail page into candidate record blocks.
pub fn tokenize(lines: &[Line]) -> Vec<RecordBlock> {
    let texts: Vec<String> = lines.iter().map(Line::text).collect();
    let mut blocks = Vec::new();
    let mut open: Option<RecordBlock> = None;

    for text in record_region(&texts) {
        if starts_record(text) {
            if let Some(block) = open.take() {
                blocks.push(block);
            }
            open = Some(RecordBlock {
                lines: vec![text.clone()],
            });
        } else if let Some(block) = open.as_mut() {
            block.lines.push(text.clone());
        } else {
            trace!("Dropping line before first record: {}", text);
        }
    }

    blocks.extend(open);
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(texts: &[&str]) -> Vec<Line> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Line::from_text(*t, i as f32))
            .collect()
    }

    #[test]
    fn test_blocks_with_continuations() {
        let page = lines(&[
            "Department: Deli",
            "Conf # Date User UPC Description",
            "12345-01 03/14 ABC Sliced",
            "Turkey Breast",
            "12345-02 03/14 ABC Ham",
            "Total 2",
            "12345-03 03/15 XYZ after total",
        ]);
        let blocks = tokenize(&page);

        assert_eq!(blocks.len(), 2);
        assert_eq!(
            blocks[0].lines,
            vec!["12345-01 03/14 ABC Sliced", "Turkey Breast"]
        );
        assert_eq!(blocks[1].tokens(), vec!["12345-02", "03/14", "ABC", "Ham"]);
    }

    #[test]
    fn test_leading_noise_dropped_without_header() {
        let page = lines(&["stray words", "987654 something", "more"]);
        let blocks = tokenize(&page);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].lines, vec!["987654 something", "more"]);
    }

    #[test]
    fn test_header_detection() {
        assert!(is_record_header("CONF # DATE"));
        assert!(is_record_header("  Conf#"));
        assert!(is_record_header("Line Conf Date User"));
        assert!(!is_record_header("Department: Deli"));
        assert!(is_total_line("TOTAL: 12"));
        assert!(is_total_line("  totals"));
        assert!(!is_total_line("Subtotal"));
    }

    #[test]
    fn test_empty_region() {
        let page = lines(&["Conf # Date User", "Total"]);
        assert!(tokenize(&page).is_empty());
    }
}
