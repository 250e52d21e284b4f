//! Sheet assembly from parsed pages.

use tracing::{debug, info};

use super::naming::SheetNamer;
use super::{Sheet, SheetKind, Workbook};
use crate::models::config::OutputConfig;
use crate::models::report::{
    record_header, DepartmentSource, PageMetadata, SummaryTable, TransactionRecord, RECORD_WIDTH,
};
use crate::report::{PageBody, ParsedPage};

/// Summary sheet column header.
pub const SUMMARY_HEADER: [&str; 4] = ["Department", "Reason", "Items", "Total Retail"];

/// Builds department and summary sheets.
pub struct SheetAssembler<'a> {
    config: &'a OutputConfig,
}

impl<'a> SheetAssembler<'a> {
    pub fn new(config: &'a OutputConfig) -> Self {
        Self { config }
    }

    /// Metadata block, blank line, header, records and closing `Total` row.
    pub fn department_rows(
        &self,
        metadata: &PageMetadata,
        records: &[TransactionRecord],
    ) -> Vec<Vec<String>> {
        let mut rows = vec![
            vec![self.config.title.clone()],
            vec![self.config.subtitle.clone()],
            vec![format!("Store: {}", metadata.store)],
            vec![format!("Page: {}", metadata.page_label)],
            vec![format!("Report: {}", metadata.report)],
            vec![format!("Date Printed: {}", metadata.printed_at)],
            vec![format!("Department: {}", metadata.department)],
            Vec::new(),
            record_header(),
        ];
        rows.extend(records.iter().map(TransactionRecord::to_row));

        let mut total = vec![String::new(); RECORD_WIDTH];
        total[0] = "Total".to_string();
        rows.push(total);
        rows
    }

    /// Title, blank line, header and every summary line in table order.
    pub fn summary_rows(&self, table: &SummaryTable) -> Vec<Vec<String>> {
        let mut rows = vec![
            vec![self.config.summary_title.clone()],
            Vec::new(),
            SUMMARY_HEADER.iter().map(|s| s.to_string()).collect(),
        ];
        rows.extend(table.lines.iter().map(|line| line.to_row()));
        rows
    }

    /// Assemble the workbook: one sheet per emitted page in page order, then
    /// the summary sheet when a summary was found.
    ///
    /// A detail page without records produces a sheet only when it carries an
    /// explicit department marker.
    pub fn assemble(&self, pages: &[ParsedPage], summary: Option<&SummaryTable>) -> Workbook {
        let mut namer = SheetNamer::new();
        let summary_name = summary.map(|_| namer.reserve(&self.config.summary_sheet));
        let mut sheets = Vec::new();

        for page in pages {
            let PageBody::Detail { records, .. } = &page.body else {
                continue;
            };
            let meta = &page.metadata;
            if meta.department_source != DepartmentSource::Marker && records.is_empty() {
                debug!("Page {} has no department marker and no records, dropping", page.number);
                continue;
            }

            let name = namer.assign(&meta.department, Some(page.number));
            sheets.push(Sheet {
                name,
                kind: SheetKind::Department,
                rows: self.department_rows(meta, records),
            });
        }

        if let (Some(name), Some(table)) = (summary_name, summary) {
            sheets.push(Sheet {
                name,
                kind: SheetKind::Summary,
                rows: self.summary_rows(table),
            });
        }

        info!("Assembled {} sheets", sheets.len());
        Workbook { sheets }
    }
}
