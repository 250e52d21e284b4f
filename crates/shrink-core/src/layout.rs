//! Fragment grouping: positioned text runs into physical lines.
//!
//! Fragments are bucketed by their y coordinate rounded to a fixed number of
//! decimal places. Two fragments share a line exactly when their rounded y
//! values are equal, so a line skewed by more than the rounding step splits
//! into two lines. That is a known tolerance of the report format, not
//! something to smooth over here.

use std::collections::BTreeMap;

use tracing::trace;

use crate::models::report::{Line, PageLines, PositionedFragment};
use crate::pdf::{PageContent, PageInput};

/// Groups fragments into lines for one page.
#[derive(Debug, Clone, Copy)]
pub struct FragmentGrouper {
    scale: f32,
}

impl FragmentGrouper {
    /// Create a grouper rounding y to `precision` decimal places.
    pub fn new(precision: u32) -> Self {
        Self {
            scale: 10f32.powi(precision as i32),
        }
    }

    /// Bucket key for a y coordinate.
    fn key(&self, y: f32) -> i64 {
        (y * self.scale).round() as i64
    }

    /// Group fragments into lines, top to bottom, each ordered left to right.
    ///
    /// Whitespace-only fragments are dropped.
    pub fn group(&self, fragments: Vec<PositionedFragment>) -> Vec<Line> {
        let mut buckets: BTreeMap<i64, Vec<PositionedFragment>> = BTreeMap::new();

        for fragment in fragments {
            if fragment.text.trim().is_empty() || !fragment.y.is_finite() {
                continue;
            }
            buckets.entry(self.key(fragment.y)).or_default().push(fragment);
        }

        let lines: Vec<Line> = buckets
            .into_iter()
            .map(|(key, mut fragments)| {
                fragments.sort_by(|a, b| a.x.total_cmp(&b.x));
                Line {
                    y: key as f32 / self.scale,
                    fragments,
                }
            })
            .collect();

        trace!("Grouped fragments into {} lines", lines.len());
        lines
    }

    /// Turn one page of PDF input into parse-ready lines.
    ///
    /// Text-line input bypasses grouping; each line keeps its order.
    pub fn page_lines(&self, page: PageInput) -> PageLines {
        match page.content {
            PageContent::Fragments(fragments) => PageLines {
                number: page.number,
                lines: self.group(fragments),
                positioned: true,
            },
            PageContent::Lines(lines) => PageLines {
                number: page.number,
                lines: lines
                    .into_iter()
                    .filter(|l| !l.trim().is_empty())
                    .enumerate()
                    .map(|(i, text)| Line::from_text(text, i as f32))
                    .collect(),
                positioned: false,
            },
        }
    }
}

impl Default for FragmentGrouper {
    fn default() -> Self {
        Self::new(1)
    }
}
