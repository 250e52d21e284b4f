//! Shrink report data models.

use std::fmt;

use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// One run of text at a page location, as delivered by the PDF layer.
///
/// Coordinates are top-down: a larger `y` is further down the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedFragment {
    /// Text content of the run.
    pub text: String,
    /// Left edge of the run.
    pub x: f32,
    /// Baseline of the run, measured from the top of the page.
    pub y: f32,
}

impl PositionedFragment {
    pub fn new(text: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
        }
    }
}

/// A physical text line: fragments sharing a rounded y, ordered by x.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// Rounded y shared by every fragment of the line.
    pub y: f32,
    /// Fragments in left-to-right order.
    pub fragments: Vec<PositionedFragment>,
}

impl Line {
    /// Build a line from pre-joined text (the text-line input form).
    pub fn from_text(text: impl Into<String>, y: f32) -> Self {
        Self {
            y,
            fragments: vec![PositionedFragment::new(text, 0.0, y)],
        }
    }

    /// Fragments joined with single spaces.
    pub fn text(&self) -> String {
        self.fragments
            .iter()
            .map(|f| f.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// The lines of one page, ready for parsing.
#[derive(Debug, Clone)]
pub struct PageLines {
    /// Page number (1-indexed).
    pub number: u32,
    /// Lines in top-to-bottom order.
    pub lines: Vec<Line>,
    /// Whether the lines carry real x/y geometry (false for text-line input).
    pub positioned: bool,
}

/// How a page's department name was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepartmentSource {
    /// Explicit `Department:` marker line.
    Marker,
    /// A known department name found somewhere on the page.
    Vocabulary,
    /// Nothing recognizable; synthesized as `Page_<n>`.
    PageOrdinal,
}

/// Page-level metadata scanned from marker lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub store: String,
    pub report: String,
    pub page_label: String,
    pub printed_at: String,
    /// Never empty; the sheet key for this page.
    pub department: String,
    pub department_source: DepartmentSource,
}

impl PageMetadata {
    /// Metadata for a page where no marker matched.
    pub fn fallback(page_number: u32) -> Self {
        Self {
            store: String::new(),
            report: String::new(),
            page_label: String::new(),
            printed_at: String::new(),
            department: format!("Page_{page_number}"),
            department_source: DepartmentSource::PageOrdinal,
        }
    }
}

/// Columns of a transaction record, in sheet order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Conf,
    Date,
    User,
    Upc,
    Description,
    Size,
    Reason,
    Vendor,
    Price,
    Weight,
    Units,
    Retail,
    Total,
}

impl Field {
    /// Every field in sheet order.
    pub const ALL: [Field; 13] = [
        Field::Conf,
        Field::Date,
        Field::User,
        Field::Upc,
        Field::Description,
        Field::Size,
        Field::Reason,
        Field::Vendor,
        Field::Price,
        Field::Weight,
        Field::Units,
        Field::Retail,
        Field::Total,
    ];

    /// Column header text.
    pub fn name(self) -> &'static str {
        match self {
            Field::Conf => "Conf #",
            Field::Date => "Date",
            Field::User => "User",
            Field::Upc => "UPC",
            Field::Description => "Description",
            Field::Size => "Size",
            Field::Reason => "Reason",
            Field::Vendor => "Vendor",
            Field::Price => "Price",
            Field::Weight => "Weight",
            Field::Units => "Units/Scans",
            Field::Retail => "Retail/Avg",
            Field::Total => "Total",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Number of columns in a transaction record.
pub const RECORD_WIDTH: usize = Field::ALL.len();

/// Header row for department sheets.
pub fn record_header() -> Vec<String> {
    Field::ALL.iter().map(|f| f.name().to_string()).collect()
}

/// One shrink entry. Always exactly [`RECORD_WIDTH`] string fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionRecord {
    values: [String; RECORD_WIDTH],
}

impl TransactionRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from positional values, padding with empty strings or
    /// dropping extras so the width is always 13.
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut record = Self::new();
        for (slot, value) in record.values.iter_mut().zip(values) {
            *slot = value.into();
        }
        record
    }

    pub fn get(&self, field: Field) -> &str {
        &self.values[field.index()]
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.values[field.index()] = value.into();
    }

    /// Append text to a field, space-separated.
    pub fn append(&mut self, field: Field, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let slot = &mut self.values[field.index()];
        if !slot.is_empty() {
            slot.push(' ');
        }
        slot.push_str(text);
    }

    pub fn conf(&self) -> &str {
        self.get(Field::Conf)
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Values as an owned sheet row.
    pub fn to_row(&self) -> Vec<String> {
        self.values.to_vec()
    }
}

impl Serialize for TransactionRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(RECORD_WIDTH))?;
        for field in Field::ALL {
            map.serialize_entry(field.name(), self.get(field))?;
        }
        map.end()
    }
}

/// Row type within the summary table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryKind {
    /// Parsed from a report line.
    Detail,
    /// Synthesized per-department subtotal.
    SubTotal,
    /// Synthesized grand total.
    Total,
}

/// One row of the department/reason summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryLine {
    pub department: String,
    pub reason: String,
    pub items: u64,
    pub total_retail: Decimal,
    pub kind: SummaryKind,
}

impl SummaryLine {
    pub fn detail(
        department: impl Into<String>,
        reason: impl Into<String>,
        items: u64,
        total_retail: Decimal,
    ) -> Self {
        Self {
            department: department.into(),
            reason: reason.into(),
            items,
            total_retail,
            kind: SummaryKind::Detail,
        }
    }

    /// Sheet row: Department, Reason, Items, Total Retail.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.department.clone(),
            self.reason.clone(),
            self.items.to_string(),
            format!("{:.2}", self.total_retail),
        ]
    }
}

/// Aggregated summary page content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryTable {
    /// Detail lines grouped by department, each group followed by its
    /// subtotal, closed by the grand total.
    pub lines: Vec<SummaryLine>,
    /// The value printed on the report's own total line, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported_total: Option<Decimal>,
}

impl SummaryTable {
    pub fn grand_total(&self) -> Option<&SummaryLine> {
        self.lines.iter().rfind(|l| l.kind == SummaryKind::Total)
    }

    pub fn subtotals(&self) -> impl Iterator<Item = &SummaryLine> {
        self.lines.iter().filter(|l| l.kind == SummaryKind::SubTotal)
    }
}
