//! Error types for the shrink-core library.

use thiserror::Error;

/// Main error type for the shrink library.
#[derive(Error, Debug)]
pub enum ShrinkError {
    /// PDF processing error. Always fatal: the run aborts before any page is parsed.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Workbook serialization error.
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// No department sheet and no summary could be produced.
    #[error("no shrink data found in document")]
    EmptyResult,

    /// The page worker pool could not be created.
    #[error("worker pool error: {0}")]
    Pool(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Errors raised while serializing a workbook.
#[derive(Error, Debug)]
pub enum ExportError {
    /// A sheet could not be added to the workbook.
    #[error("failed to add sheet '{name}': {reason}")]
    Sheet { name: String, reason: String },

    /// The spreadsheet writer failed.
    #[error("failed to write workbook: {0}")]
    Write(String),
}

/// Why a candidate record block was discarded.
///
/// These never abort a page; the pipeline counts them per page.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseFailure {
    /// The block holds no token shaped like a confirmation number.
    #[error("invalid record: no confirmation-number anchor")]
    NoConfirmationAnchor,

    /// No UPC-shaped token follows the confirmation number.
    #[error("invalid record: no UPC anchor")]
    NoUpcAnchor,

    /// The block contained no tokens at all.
    #[error("invalid record: empty block")]
    EmptyRecord,
}

/// Result type for the shrink library.
pub type Result<T> = std::result::Result<T, ShrinkError>;
