//! Summary page aggregation.

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, trace};

use super::classify::is_summary_header;
use super::patterns::{FIRST_NUMBER, SUMMARY_LINE};
use super::tokenizer::is_total_line;
use crate::models::report::{Line, SummaryKind, SummaryLine, SummaryTable};

/// Reason text of synthesized per-department rows.
pub const SUB_TOTAL: &str = "Sub Total";

/// Department text of the synthesized grand total row.
pub const GRAND_TOTAL: &str = "Total";

/// Parsed but not yet aggregated summary content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SummaryLines {
    pub lines: Vec<SummaryLine>,
    /// First numeric value of the report's own total line.
    pub reported_total: Option<Decimal>,
}

impl SummaryLines {
    /// Append another page's lines, keeping the first reported total.
    pub fn merge(&mut self, other: SummaryLines) {
        self.lines.extend(other.lines);
        if self.reported_total.is_none() {
            self.reported_total = other.reported_total;
        }
    }
}

/// Parse one summary line: items, reason, retail total, department.
pub fn parse_summary_line(text: &str) -> Option<SummaryLine> {
    let caps = SUMMARY_LINE.captures(text.trim())?;
    let items = caps[1].parse::<u64>().ok()?;
    let retail = Decimal::from_str(&caps[3]).ok()?;
    let department = caps[4].trim();
    if department.is_empty() {
        return None;
    }
    Some(SummaryLine::detail(department, caps[2].trim(), items, retail))
}

/// Collect summary lines from one page, after its header row when present.
pub fn collect(lines: &[Line]) -> SummaryLines {
    let texts: Vec<String> = lines.iter().map(Line::text).collect();
    let start = texts
        .iter()
        .position(|t| is_summary_header(t))
        .map_or(0, |i| i + 1);

    let mut out = SummaryLines::default();
    for text in &texts[start..] {
        if is_total_line(text) {
            let value = FIRST_NUMBER
                .find(text)
                .and_then(|m| Decimal::from_str(m.as_str()).ok());
            if out.reported_total.is_none() {
                out.reported_total = value;
            }
        } else if let Some(line) = parse_summary_line(text) {
            out.lines.push(line);
        } else {
            trace!("Skipping summary line: {}", text);
        }
    }
    out
}

/// Group lines by department in first-seen order, closing each group with
/// its subtotal and the table with the grand total.
pub fn aggregate(collected: SummaryLines) -> SummaryTable {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<SummaryLine>> = HashMap::new();

    for line in collected.lines {
        if !groups.contains_key(&line.department) {
            order.push(line.department.clone());
        }
        groups.entry(line.department.clone()).or_default().push(line);
    }

    let mut lines = Vec::new();
    let mut grand_items = 0u64;
    let mut grand_retail = Decimal::ZERO;

    for department in order {
        let Some(group) = groups.remove(&department) else {
            continue;
        };
        let items: u64 = group.iter().map(|l| l.items).sum();
        let retail: Decimal = group.iter().map(|l| l.total_retail).sum::<Decimal>().round_dp(2);
        lines.extend(group);
        lines.push(SummaryLine {
            department,
            reason: SUB_TOTAL.to_string(),
            items,
            total_retail: retail,
            kind: SummaryKind::SubTotal,
        });
        grand_items += items;
        grand_retail += retail;
    }

    lines.push(SummaryLine {
        department: GRAND_TOTAL.to_string(),
        reason: String::new(),
        items: grand_items,
        total_retail: grand_retail,
        kind: SummaryKind::Total,
    });

    if let Some(reported) = collected.reported_total {
        if reported != grand_retail {
            debug!(
                "Reported summary total {} differs from computed {}",
                reported, grand_retail
            );
        }
    }

    SummaryTable {
        lines,
        reported_total: collected.reported_total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn lines(texts: &[&str]) -> Vec<Line> {
        texts.iter().map(|t| Line::from_text(*t, 0.0)).collect()
    }

    #[test]
    fn test_parse_line() {
        let line = parse_summary_line("  3 Out of Date 12.50 BAKERY ").unwrap();
        assert_eq!(line, SummaryLine::detail("BAKERY", "Out of Date", 3, dec!(12.50)));
        assert!(parse_summary_line("Department Reason Items Total").is_none());
        assert!(parse_summary_line("3 Damaged 1.00 bakery").is_none());
    }

    #[test]
    fn test_subtotals_in_first_seen_order() {
        let page = lines(&[
            "Shrink Summary",
            "Department Reason Items Total",
            "2 Damaged 4.00 DELI",
            "1 Expired 1.255 BAKERY",
            "3 Expired 6.50 DELI",
            "1 Damaged 2.00 BAKERY",
            "Total 13.76",
        ]);
        let table = aggregate(collect(&page));

        let rows: Vec<(String, String, u64, Decimal)> = table
            .lines
            .iter()
            .map(|l| (l.department.clone(), l.reason.clone(), l.items, l.total_retail))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("DELI".into(), "Damaged".into(), 2, dec!(4.00)),
                ("DELI".into(), "Expired".into(), 3, dec!(6.50)),
                ("DELI".into(), "Sub Total".into(), 5, dec!(10.50)),
                ("BAKERY".into(), "Expired".into(), 1, dec!(1.255)),
                ("BAKERY".into(), "Damaged".into(), 1, dec!(2.00)),
                ("BAKERY".into(), "Sub Total".into(), 2, dec!(3.26)),
                ("Total".into(), "".into(), 7, dec!(13.76)),
            ]
        );
        assert_eq!(table.reported_total, Some(dec!(13.76)));
        assert_eq!(table.subtotals().count(), 2);
        assert_eq!(table.grand_total().map(|l| l.items), Some(7));
    }

    #[test]
    fn test_grand_total_ignores_reported_value() {
        let page = lines(&["Department Reason Items Total", "1 Damaged 2.00 DELI", "TOTAL 99.99"]);
        let table = aggregate(collect(&page));
        assert_eq!(table.grand_total().map(|l| l.total_retail), Some(dec!(2.00)));
        assert_eq!(table.reported_total, Some(dec!(99.99)));
    }

    #[test]
    fn test_reaggregating_subtotals_is_stable() {
        let page = lines(&["1 Damaged 2.00 DELI", "2 Expired 3.00 MEAT"]);
        let first = aggregate(collect(&page));
        let details: Vec<SummaryLine> = first
            .lines
            .iter()
            .filter(|l| l.kind == SummaryKind::Detail)
            .cloned()
            .collect();
        let second = aggregate(SummaryLines {
            lines: details,
            reported_total: None,
        });
        assert_eq!(first.lines, second.lines);
    }

    #[test]
    fn test_pages_merge_in_order() {
        let mut collected = collect(&lines(&["1 Damaged 2.00 DELI"]));
        collected.merge(collect(&lines(&["2 Expired 3.00 DELI", "Total 5.00"])));
        let table = aggregate(collected);
        assert_eq!(table.lines.len(), 4);
        assert_eq!(table.lines[2].items, 3);
        assert_eq!(table.reported_total, Some(dec!(5.00)));
    }
}
