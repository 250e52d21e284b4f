//! End-to-end conversion: PDF bytes to parsed report and workbook.

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Result, ShrinkError};
use crate::layout::FragmentGrouper;
use crate::models::config::ShrinkConfig;
use crate::models::report::SummaryTable;
use crate::pdf::{LopdfSource, PdfSource};
use crate::report::{aggregate, PageBody, ParsedPage, ReportParser, SummaryLines};
use crate::sheet::{SheetAssembler, Workbook, WorkbookWriter, XlsxWriter};

/// Per-run accumulator for parsed pages, reduced once every page is in.
#[derive(Debug, Default)]
pub struct RunContext {
    pages: Vec<ParsedPage>,
    summary: Option<SummaryLines>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take one page. Pages must arrive in page order.
    pub fn absorb(&mut self, page: ParsedPage) {
        if let PageBody::Summary(lines) = &page.body {
            match self.summary.as_mut() {
                Some(summary) => summary.merge(lines.clone()),
                None => self.summary = Some(lines.clone()),
            }
        }
        self.pages.push(page);
    }

    /// Pages in order plus the aggregated summary, if any page carried one.
    pub fn finish(self) -> (Vec<ParsedPage>, Option<SummaryTable>) {
        let summary = self.summary.map(aggregate);
        if summary.is_none() {
            debug!("No summary page found");
        }
        (self.pages, summary)
    }
}

/// Everything one conversion learned about the document.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedReport {
    pub pages: Vec<ParsedPage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<SummaryTable>,
    #[serde(skip)]
    pub workbook: Workbook,
}

impl ParsedReport {
    /// Records kept across all detail pages.
    pub fn record_count(&self) -> usize {
        self.pages
            .iter()
            .map(|p| match &p.body {
                PageBody::Detail { records, .. } => records.len(),
                PageBody::Summary(_) => 0,
            })
            .sum()
    }

    /// Records discarded across all detail pages.
    pub fn skipped_count(&self) -> usize {
        self.pages
            .iter()
            .map(|p| match &p.body {
                PageBody::Detail { failures, .. } => failures.total(),
                PageBody::Summary(_) => 0,
            })
            .sum()
    }
}

/// A parsed report together with its serialized workbook.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub report: ParsedReport,
    pub bytes: Vec<u8>,
}

/// Runs the conversion with a pluggable PDF source and workbook writer.
pub struct Converter {
    config: ShrinkConfig,
    source: Box<dyn PdfSource>,
    writer: Box<dyn WorkbookWriter + Send + Sync>,
}

impl Converter {
    /// Create a converter using lopdf input and xlsx output.
    pub fn new(config: ShrinkConfig) -> Self {
        let source = LopdfSource::new(config.pdf.mode);
        Self {
            config,
            source: Box::new(source),
            writer: Box::new(XlsxWriter::new()),
        }
    }

    /// Replace the PDF source.
    pub fn with_source(mut self, source: impl PdfSource + 'static) -> Self {
        self.source = Box::new(source);
        self
    }

    /// Replace the workbook writer.
    pub fn with_writer(mut self, writer: impl WorkbookWriter + Send + Sync + 'static) -> Self {
        self.writer = Box::new(writer);
        self
    }

    pub fn config(&self) -> &ShrinkConfig {
        &self.config
    }

    /// Parse the document and assemble the workbook without serializing it.
    ///
    /// Fails with [`ShrinkError::EmptyResult`] when no sheet would be produced.
    pub fn parse(&self, data: &[u8]) -> Result<ParsedReport> {
        self.config.validate().map_err(ShrinkError::Config)?;

        let inputs = self.source.load_pages(data)?;
        info!(
            "Loaded {} pages with {} backend",
            inputs.len(),
            self.source.backend_name()
        );

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.config.pipeline.workers)
            .build()
            .map_err(|e| ShrinkError::Pool(e.to_string()))?;

        let grouper = FragmentGrouper::new(self.config.pdf.y_precision);
        let parser = ReportParser::new(&self.config.report);

        let mut parsed: Vec<(usize, ParsedPage)> = pool.install(|| {
            inputs
                .into_par_iter()
                .enumerate()
                .map(|(index, input)| {
                    let lines = grouper.page_lines(input);
                    (index, parser.parse_page(&lines))
                })
                .collect()
        });
        parsed.sort_by_key(|(index, _)| *index);

        let mut context = RunContext::new();
        for (_, page) in parsed {
            if let PageBody::Detail { failures, .. } = &page.body {
                if failures.total() > 0 {
                    warn!(
                        "Page {}: skipped {} unreadable records",
                        page.number,
                        failures.total()
                    );
                }
            }
            context.absorb(page);
        }
        let (pages, summary) = context.finish();

        let workbook = SheetAssembler::new(&self.config.output).assemble(&pages, summary.as_ref());
        if workbook.is_empty() {
            return Err(ShrinkError::EmptyResult);
        }

        let report = ParsedReport {
            pages,
            summary,
            workbook,
        };
        info!(
            "Parsed {} records into {} sheets ({} skipped)",
            report.record_count(),
            report.workbook.sheets.len(),
            report.skipped_count()
        );
        Ok(report)
    }

    /// Parse the document and serialize the workbook.
    pub fn convert(&self, data: &[u8]) -> Result<Conversion> {
        let report = self.parse(data)?;
        let bytes = self.writer.write(&report.workbook)?;
        debug!("Serialized workbook: {} bytes", bytes.len());
        Ok(Conversion { report, bytes })
    }
}
