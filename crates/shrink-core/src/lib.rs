//! Core library for converting shrink report PDFs into spreadsheets.
//!
//! This crate provides:
//! - PDF text extraction (positioned fragments or plain text lines)
//! - Fragment grouping into physical lines
//! - Report parsing: page metadata, page classification, record
//!   reconstruction and summary aggregation
//! - Sheet assembly and xlsx serialization

pub mod error;
pub mod layout;
pub mod models;
pub mod pdf;
pub mod pipeline;
pub mod report;
pub mod sheet;

pub use error::{ExportError, ParseFailure, PdfError, Result, ShrinkError};
pub use models::config::ShrinkConfig;
pub use models::report::{
    Field, PageMetadata, PositionedFragment, SummaryLine, SummaryTable, TransactionRecord,
};
pub use pdf::{LopdfSource, PageContent, PageInput, PdfSource};
pub use pipeline::{Conversion, Converter, ParsedReport};
pub use sheet::{output_file_name, Workbook, WorkbookWriter, XlsxWriter};
