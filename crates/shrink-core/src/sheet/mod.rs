//! Named tables and the workbook they form.

mod assembler;
mod naming;
mod xlsx;

pub use assembler::SheetAssembler;
pub use naming::{SheetNamer, MAX_SHEET_NAME};
pub use xlsx::{WorkbookWriter, XlsxWriter};

use serde::Serialize;

/// What a sheet holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetKind {
    Department,
    Summary,
}

/// One named table. Rows may be ragged; an empty row is a blank line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sheet {
    pub name: String,
    pub kind: SheetKind,
    pub rows: Vec<Vec<String>>,
}

/// Ordered collection of sheets, built once per conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// Content type of the serialized workbook.
    pub const MIME_TYPE: &'static str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|s| s.name.as_str())
    }
}

/// Workbook file name for an uploaded document name.
///
/// A trailing `.pdf` is removed case-insensitively before `suffix` and the
/// `.xlsx` extension are appended.
pub fn output_file_name(input_name: &str, suffix: &str) -> String {
    let stem = match input_name.len().checked_sub(4) {
        Some(cut)
            if input_name.is_char_boundary(cut)
                && input_name[cut..].eq_ignore_ascii_case(".pdf") =>
        {
            &input_name[..cut]
        }
        _ => input_name,
    };
    format!("{stem}{suffix}.xlsx")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name("shrink.pdf", "_converted"), "shrink_converted.xlsx");
        assert_eq!(output_file_name("SHRINK.PDF", "_converted"), "SHRINK_converted.xlsx");
        assert_eq!(output_file_name("week.12.Pdf", ""), "week.12.xlsx");
        assert_eq!(output_file_name("report", "_parsed"), "report_parsed.xlsx");
        assert_eq!(output_file_name("pdf", "_converted"), "pdf_converted.xlsx");
    }

    #[test]
    fn test_lookup() {
        let workbook = Workbook {
            sheets: vec![Sheet {
                name: "Deli".to_string(),
                kind: SheetKind::Department,
                rows: vec![],
            }],
        };
        assert!(workbook.sheet("Deli").is_some());
        assert!(workbook.sheet("deli").is_none());
        assert_eq!(workbook.sheet_names().collect::<Vec<_>>(), vec!["Deli"]);
    }
}
