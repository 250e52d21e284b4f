//! PDF input layer.

mod extractor;

pub use extractor::LopdfSource;

use crate::error::PdfError;
use crate::models::report::PositionedFragment;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Text content of one page, in whichever form the backend produced.
#[derive(Debug, Clone)]
pub enum PageContent {
    /// Positioned text runs that still need grouping into lines.
    Fragments(Vec<PositionedFragment>),
    /// Pre-joined lines in reading order.
    Lines(Vec<String>),
}

impl PageContent {
    pub fn is_empty(&self) -> bool {
        match self {
            PageContent::Fragments(f) => f.iter().all(|f| f.text.trim().is_empty()),
            PageContent::Lines(l) => l.iter().all(|l| l.trim().is_empty()),
        }
    }
}

/// One page handed to the parser.
#[derive(Debug, Clone)]
pub struct PageInput {
    /// Page number (1-indexed).
    pub number: u32,
    /// Page text.
    pub content: PageContent,
}

/// Trait for PDF text extraction backends.
pub trait PdfSource: Send + Sync {
    /// Read every page of the document, in page order.
    ///
    /// Fails only when the document itself is unreadable.
    fn load_pages(&self, data: &[u8]) -> Result<Vec<PageInput>>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}
