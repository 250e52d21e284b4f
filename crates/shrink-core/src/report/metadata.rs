//! Page metadata scan.
//!
//! Each metadata field is described by one [`MarkerRule`]: a predicate that
//! picks candidate lines and an extractor that pulls the value out of a
//! candidate. A field takes the value of the first line, top to bottom, for
//! which both succeed.

use tracing::trace;

use crate::models::config::ReportConfig;
use crate::models::report::{DepartmentSource, Line, PageMetadata};

/// Metadata slot filled by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Store,
    Report,
    PageLabel,
    PrintedAt,
    Department,
}

/// One row of the marker table.
struct MarkerRule {
    slot: Slot,
    matches: fn(&str, &ReportConfig) -> bool,
    extract: fn(&str, &ReportConfig) -> Option<String>,
}

fn whole_line(text: &str, _: &ReportConfig) -> Option<String> {
    Some(text.trim().to_string())
}

fn after_last_colon(text: &str, _: &ReportConfig) -> Option<String> {
    let (_, value) = text.rsplit_once(':')?;
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn has_store_marker(text: &str, config: &ReportConfig) -> bool {
    text.contains(config.store_marker.as_str())
}

fn has_report_marker(text: &str, config: &ReportConfig) -> bool {
    text.contains(config.report_marker.as_str())
}

fn has_page_marker(text: &str, config: &ReportConfig) -> bool {
    text.contains(config.page_marker.as_str())
}

fn has_department_marker(text: &str, config: &ReportConfig) -> bool {
    text.contains(config.department_marker.as_str())
}

fn looks_like_timestamp(text: &str, _: &ReportConfig) -> bool {
    text.contains('/') && text.contains(':')
}

const RULES: [MarkerRule; 5] = [
    MarkerRule {
        slot: Slot::Store,
        matches: has_store_marker,
        extract: whole_line,
    },
    MarkerRule {
        slot: Slot::Report,
        matches: has_report_marker,
        extract: whole_line,
    },
    MarkerRule {
        slot: Slot::PrintedAt,
        matches: looks_like_timestamp,
        extract: whole_line,
    },
    MarkerRule {
        slot: Slot::Department,
        matches: has_department_marker,
        extract: after_last_colon,
    },
    MarkerRule {
        slot: Slot::PageLabel,
        matches: has_page_marker,
        extract: whole_line,
    },
];

/// Scans page lines for metadata markers.
pub struct MetadataExtractor<'a> {
    config: &'a ReportConfig,
}

impl<'a> MetadataExtractor<'a> {
    pub fn new(config: &'a ReportConfig) -> Self {
        Self { config }
    }

    /// Extract metadata from one page.
    ///
    /// The department falls back to a known department name found anywhere on
    /// the page, then to `Page_<page_number>`.
    pub fn extract(&self, lines: &[Line], page_number: u32) -> PageMetadata {
        let texts: Vec<String> = lines.iter().map(Line::text).collect();
        let mut meta = PageMetadata::fallback(page_number);
        let mut department = None;

        for rule in &RULES {
            let value = texts
                .iter()
                .filter(|text| (rule.matches)(text, self.config))
                .find_map(|text| (rule.extract)(text, self.config));

            let Some(value) = value else { continue };
            trace!("Page {} {:?}: {}", page_number, rule.slot, value);
            match rule.slot {
                Slot::Store => meta.store = value,
                Slot::Report => meta.report = value,
                Slot::PageLabel => meta.page_label = value,
                Slot::PrintedAt => meta.printed_at = value,
                Slot::Department => department = Some(value),
            }
        }

        if let Some(name) = department {
            meta.department = name;
            meta.department_source = DepartmentSource::Marker;
        } else if let Some(name) = self.find_known_department(&texts) {
            meta.department = name;
            meta.department_source = DepartmentSource::Vocabulary;
        }

        meta
    }

    /// First known department name appearing in the page text, case-insensitively.
    fn find_known_department(&self, texts: &[String]) -> Option<String> {
        let vocabulary: Vec<(String, &String)> = self
            .config
            .departments
            .iter()
            .filter(|name| !name.trim().is_empty())
            .map(|name| (name.to_lowercase(), name))
            .collect();

        texts.iter().find_map(|text| {
            let lower = text.to_lowercase();
            vocabulary
                .iter()
                .filter_map(|(needle, name)| lower.find(needle.as_str()).map(|pos| (pos, *name)))
                .min_by_key(|(pos, _)| *pos)
                .map(|(_, name)| name.clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(texts: &[&str]) -> Vec<Line> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Line::from_text(*t, i as f32))
            .collect()
    }

    #[test]
    fn test_marker_lines() {
        let config = ReportConfig::default();
        let page = lines(&[
            "Piggly Wiggly #42",
            "Shrink Report",
            "Page 1 of 3",
            "Printed 03/14/2024 10:22",
            "Department: Deli",
            "Conf # Date User UPC",
        ]);
        let meta = MetadataExtractor::new(&config).extract(&page, 1);

        assert_eq!(meta.store, "Piggly Wiggly #42");
        assert_eq!(meta.report, "Shrink Report");
        assert_eq!(meta.page_label, "Page 1 of 3");
        assert_eq!(meta.printed_at, "Printed 03/14/2024 10:22");
        assert_eq!(meta.department, "Deli");
        assert_eq!(meta.department_source, DepartmentSource::Marker);
    }

    #[test]
    fn test_first_matching_line_wins() {
        let config = ReportConfig::default();
        let page = lines(&["Department: Bakery", "Department: Produce"]);
        let meta = MetadataExtractor::new(&config).extract(&page, 2);
        assert_eq!(meta.department, "Bakery");
    }

    #[test]
    fn test_department_value_after_last_colon() {
        let config = ReportConfig::default();
        let page = lines(&["Store Department: 12 : Seafood "]);
        let meta = MetadataExtractor::new(&config).extract(&page, 1);
        assert_eq!(meta.department, "Seafood");
    }

    #[test]
    fn test_empty_department_value_is_skipped() {
        let config = ReportConfig::default();
        let page = lines(&["Department:", "Department: Meat"]);
        let meta = MetadataExtractor::new(&config).extract(&page, 1);
        assert_eq!(meta.department, "Meat");
    }

    #[test]
    fn test_vocabulary_fallback() {
        let config = ReportConfig::default();
        let page = lines(&["Weekly loss", "PRODUCE DEPT"]);
        let meta = MetadataExtractor::new(&config).extract(&page, 5);
        assert_eq!(meta.department, "Produce");
        assert_eq!(meta.department_source, DepartmentSource::Vocabulary);
    }

    #[test]
    fn test_page_ordinal_fallback() {
        let config = ReportConfig::default();
        let page = lines(&["nothing useful here"]);
        let meta = MetadataExtractor::new(&config).extract(&page, 7);
        assert_eq!(meta, PageMetadata::fallback(7));
    }
}
