//! Fixed x-coordinate column layout for detail pages.

use super::patterns::CONF_PREFIX;
use super::tokenizer::{is_record_header, is_total_line};
use crate::error::ParseFailure;
use crate::models::report::{Field, Line, TransactionRecord};

/// Header fragments that must sit in their own column before a page is read by bands.
pub const MIN_HEADER_MATCHES: usize = 10;

/// Assigns fragments to columns by their left edge.
#[derive(Debug, Clone)]
pub struct ColumnBands {
    /// Exclusive upper x bound of each column but the last.
    bounds: Vec<f32>,
}

impl ColumnBands {
    pub fn new(bounds: Vec<f32>) -> Self {
        Self { bounds }
    }

    /// Column a fragment starting at `x` belongs to.
    pub fn column_of(&self, x: f32) -> Field {
        let index = self
            .bounds
            .iter()
            .position(|&bound| x < bound)
            .unwrap_or(self.bounds.len());
        Field::ALL[index.min(Field::ALL.len() - 1)]
    }

    /// Number of fragments in a header line that land in the column they name.
    pub fn header_score(&self, line: &Line) -> usize {
        line.fragments
            .iter()
            .filter(|f| names_column(&f.text, self.column_of(f.x)))
            .count()
    }

    /// Whether the page's header line is laid out on these bands.
    pub fn fits(&self, lines: &[Line]) -> bool {
        lines
            .iter()
            .find(|line| is_record_header(&line.text()))
            .is_some_and(|header| self.header_score(header) >= MIN_HEADER_MATCHES)
    }

    /// Cells of one line, fragments of the same column joined by spaces.
    pub fn cells(&self, line: &Line) -> TransactionRecord {
        let mut row = TransactionRecord::new();
        for fragment in &line.fragments {
            row.append(self.column_of(fragment.x), &fragment.text);
        }
        row
    }

    /// Read the records of a detail page.
    ///
    /// A row whose Conf # cell starts with a confirmation number opens a
    /// record. A row with an empty Conf # cell and some description text
    /// extends the open record's description.
    pub fn parse(&self, lines: &[Line]) -> Vec<Result<TransactionRecord, ParseFailure>> {
        let start = lines
            .iter()
            .position(|l| is_record_header(&l.text()))
            .map_or(0, |i| i + 1);

        let mut results = Vec::new();
        let mut open: Option<TransactionRecord> = None;

        for line in &lines[start..] {
            if is_total_line(&line.text()) {
                break;
            }
            let row = self.cells(line);

            if CONF_PREFIX.is_match(row.conf()) {
                results.extend(open.take().map(Ok));
                open = Some(row);
            } else if row.conf().is_empty() {
                if let Some(record) = open.as_mut() {
                    record.append(Field::Description, row.get(Field::Description));
                }
            } else {
                results.extend(open.take().map(Ok));
                results.push(Err(ParseFailure::NoConfirmationAnchor));
            }
        }

        results.extend(open.map(Ok));
        results
    }
}

/// Whether header text names the given column ("Conf" for "Conf #", "Units" for "Units/Scans").
fn names_column(text: &str, field: Field) -> bool {
    let text = text.trim().to_lowercase();
    let name = field.name().to_lowercase();
    text == name || (text.len() >= 3 && name.starts_with(&text))
}
