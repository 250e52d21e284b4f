//! Report page parsing: metadata, classification and record reconstruction.

pub mod bands;
pub mod classify;
pub mod fields;
pub mod metadata;
pub mod patterns;
pub mod summary;
pub mod tokenizer;

pub use bands::ColumnBands;
pub use classify::{classify, PageKind};
pub use fields::split_record;
pub use metadata::MetadataExtractor;
pub use summary::{aggregate, SummaryLines};
pub use tokenizer::{tokenize, RecordBlock};

use serde::Serialize;
use tracing::debug;

use crate::error::ParseFailure;
use crate::models::config::{LayoutPreference, ReportConfig};
use crate::models::report::{PageLines, PageMetadata, TransactionRecord};

/// Record reconstruction strategy for a detail page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailLayout {
    /// Confirmation-number and UPC anchors with fixed token offsets.
    AnchorOffset,
    /// Fixed x-coordinate column bands.
    ColumnBands,
}

/// Discarded record counts for one page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FailureCounts {
    pub no_confirmation_anchor: usize,
    pub no_upc_anchor: usize,
    pub empty_record: usize,
}

impl FailureCounts {
    pub fn record(&mut self, failure: ParseFailure) {
        match failure {
            ParseFailure::NoConfirmationAnchor => self.no_confirmation_anchor += 1,
            ParseFailure::NoUpcAnchor => self.no_upc_anchor += 1,
            ParseFailure::EmptyRecord => self.empty_record += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.no_confirmation_anchor + self.no_upc_anchor + self.empty_record
    }
}

/// Parsed content of one page.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageBody {
    Detail {
        layout: DetailLayout,
        records: Vec<TransactionRecord>,
        failures: FailureCounts,
    },
    Summary(SummaryLines),
}

/// One page after parsing.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedPage {
    pub number: u32,
    pub metadata: PageMetadata,
    pub body: PageBody,
}

/// Parses grouped page lines into metadata and records or summary lines.
pub struct ReportParser {
    config: ReportConfig,
    bands: ColumnBands,
}

impl ReportParser {
    pub fn new(config: &ReportConfig) -> Self {
        Self {
            config: config.clone(),
            bands: ColumnBands::new(config.column_bands.clone()),
        }
    }

    /// Pick the detail strategy for a page.
    ///
    /// Bands need real geometry, so text-line pages always use anchors.
    pub fn select_layout(&self, page: &PageLines) -> DetailLayout {
        if !page.positioned {
            return DetailLayout::AnchorOffset;
        }
        match self.config.layout {
            LayoutPreference::Anchor => DetailLayout::AnchorOffset,
            LayoutPreference::Bands => DetailLayout::ColumnBands,
            LayoutPreference::Auto if self.bands.fits(&page.lines) => DetailLayout::ColumnBands,
            LayoutPreference::Auto => DetailLayout::AnchorOffset,
        }
    }

    /// Parse one page.
    pub fn parse_page(&self, page: &PageLines) -> ParsedPage {
        let metadata = MetadataExtractor::new(&self.config).extract(&page.lines, page.number);

        let body = match classify(&page.lines) {
            PageKind::Summary => {
                let collected = summary::collect(&page.lines);
                debug!(
                    "Page {} is a summary page with {} lines",
                    page.number,
                    collected.lines.len()
                );
                PageBody::Summary(collected)
            }
            PageKind::Detail => {
                let layout = self.select_layout(page);
                let results = match layout {
                    DetailLayout::AnchorOffset => tokenize(&page.lines)
                        .iter()
                        .map(|block| split_record(&block.tokens()))
                        .collect(),
                    DetailLayout::ColumnBands => self.bands.parse(&page.lines),
                };

                let mut records = Vec::new();
                let mut failures = FailureCounts::default();
                for result in results {
                    match result {
                        Ok(record) => records.push(record),
                        Err(failure) => {
                            debug!("Page {}: skipped record ({})", page.number, failure);
                            failures.record(failure);
                        }
                    }
                }

                debug!(
                    "Page {} ({}): {:?} layout, {} records, {} skipped",
                    page.number,
                    metadata.department,
                    layout,
                    records.len(),
                    failures.total()
                );
                PageBody::Detail {
                    layout,
                    records,
                    failures,
                }
            }
        };

        ParsedPage {
            number: page.number,
            metadata,
            body,
        }
    }
}
