//! Configuration structures for the conversion pipeline.

use serde::{Deserialize, Serialize};

/// Main configuration for the shrink pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShrinkConfig {
    /// PDF input configuration.
    pub pdf: PdfConfig,

    /// Report parsing configuration.
    pub report: ReportConfig,

    /// Workbook output configuration.
    pub output: OutputConfig,

    /// Page processing configuration.
    pub pipeline: PipelineConfig,
}

/// How page text is pulled out of the PDF.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// Positioned fragments, falling back to plain text for pages without any.
    #[default]
    Auto,
    /// Positioned fragments only.
    Positioned,
    /// Plain per-page text lines only.
    Text,
}

/// PDF input configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Extraction mode.
    pub mode: ExtractionMode,

    /// Decimal places kept when bucketing fragments into lines by y.
    pub y_precision: u32,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            mode: ExtractionMode::Auto,
            y_precision: 1,
        }
    }
}

/// Record reconstruction strategy for detail pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutPreference {
    /// Sniff each page's header row.
    #[default]
    Auto,
    /// Always use confirmation/UPC anchors.
    Anchor,
    /// Always use fixed x-coordinate column bands.
    Bands,
}

/// Report parsing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Substring identifying the store name line.
    pub store_marker: String,

    /// Substring identifying the report name line.
    pub report_marker: String,

    /// Substring identifying the page label line.
    pub page_marker: String,

    /// Substring identifying the department line.
    pub department_marker: String,

    /// Department names recognized when no department marker is present.
    pub departments: Vec<String>,

    /// Detail page strategy.
    pub layout: LayoutPreference,

    /// Upper x bound of each column band except the last, in column order.
    pub column_bands: Vec<f32>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            store_marker: "Piggly".to_string(),
            report_marker: "Report".to_string(),
            page_marker: "Page".to_string(),
            department_marker: "Department".to_string(),
            departments: [
                "Bakery",
                "Deli",
                "Produce",
                "Meat",
                "Seafood",
                "Grocery",
                "Dairy",
                "Frozen",
                "Floral",
                "Health & Beauty",
                "General Merchandise",
                "Pharmacy",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            layout: LayoutPreference::Auto,
            column_bands: vec![
                50.0, 80.0, 120.0, 220.0, 400.0, 440.0, 500.0, 560.0, 600.0, 640.0, 680.0, 720.0,
            ],
        }
    }
}

/// Workbook output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// First line of every department sheet.
    pub title: String,

    /// Second line of every department sheet.
    pub subtitle: String,

    /// Name of the summary sheet.
    pub summary_sheet: String,

    /// First line of the summary sheet.
    pub summary_title: String,

    /// Appended to the input file stem to name the workbook.
    pub file_suffix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            title: "Grocery Order Tracking".to_string(),
            subtitle: "Shrink".to_string(),
            summary_sheet: "Summary".to_string(),
            summary_title: "Shrink Summary".to_string(),
            file_suffix: "_converted".to_string(),
        }
    }
}

/// Page processing configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Worker threads for page parsing (0 = one per CPU).
    pub workers: usize,
}

impl ShrinkConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Check values the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), String> {
        if self.report.column_bands.len() != crate::models::report::RECORD_WIDTH - 1 {
            return Err(format!(
                "report.column_bands needs {} bounds, got {}",
                crate::models::report::RECORD_WIDTH - 1,
                self.report.column_bands.len()
            ));
        }
        if self.report.column_bands.windows(2).any(|w| w[0] >= w[1]) {
            return Err("report.column_bands must be strictly ascending".to_string());
        }
        if self.pdf.y_precision > 4 {
            return Err("pdf.y_precision must be at most 4".to_string());
        }
        if self.output.summary_sheet.trim().is_empty() {
            return Err("output.summary_sheet must not be empty".to_string());
        }
        Ok(())
    }
}
