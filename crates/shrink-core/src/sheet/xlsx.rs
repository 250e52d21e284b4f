//! Workbook serialization.

use std::io::Cursor;

use tracing::debug;

use super::Workbook;
use crate::error::ExportError;

/// Trait for workbook serializers.
pub trait WorkbookWriter {
    /// Serialize the whole workbook into a byte buffer.
    fn write(&self, workbook: &Workbook) -> Result<Vec<u8>, ExportError>;

    /// Content type of the produced bytes.
    fn mime_type(&self) -> &str;
}

/// Office Open XML writer backed by umya-spreadsheet.
///
/// Every cell is written as a string; no number inference.
#[derive(Debug, Default)]
pub struct XlsxWriter;

impl XlsxWriter {
    pub fn new() -> Self {
        Self
    }
}

impl WorkbookWriter for XlsxWriter {
    fn write(&self, workbook: &Workbook) -> Result<Vec<u8>, ExportError> {
        if workbook.is_empty() {
            return Err(ExportError::Write("workbook has no sheets".to_string()));
        }

        let mut book = umya_spreadsheet::new_file_empty_worksheet();
        for sheet in &workbook.sheets {
            let worksheet = book.new_sheet(&sheet.name).map_err(|e| ExportError::Sheet {
                name: sheet.name.clone(),
                reason: e.to_string(),
            })?;

            for (r, row) in sheet.rows.iter().enumerate() {
                for (c, value) in row.iter().enumerate() {
                    if value.is_empty() {
                        continue;
                    }
                    worksheet
                        .get_cell_mut((c as u32 + 1, r as u32 + 1))
                        .set_value_string(value);
                }
            }
            debug!("Wrote sheet '{}' ({} rows)", sheet.name, sheet.rows.len());
        }

        let mut buffer = Cursor::new(Vec::new());
        umya_spreadsheet::writer::xlsx::write_writer(&book, &mut buffer)
            .map_err(|e| ExportError::Write(e.to_string()))?;
        Ok(buffer.into_inner())
    }

    fn mime_type(&self) -> &str {
        Workbook::MIME_TYPE
    }
}
