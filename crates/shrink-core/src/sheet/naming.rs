//! Sheet name sanitizing and collision handling.

use std::collections::HashSet;

use tracing::info;

/// Longest sheet name a workbook accepts.
pub const MAX_SHEET_NAME: usize = 31;

const FORBIDDEN: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Name the spreadsheet application keeps for itself.
const RESERVED: &str = "History";

fn truncate(name: &str, max: usize) -> String {
    name.chars().take(max).collect()
}

/// Replace characters workbooks reject and cap the length.
///
/// An apostrophe may not open or close a name, and `History` is reserved.
pub fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if FORBIDDEN.contains(&c) { '_' } else { c })
        .collect();
    let truncated = truncate(&cleaned, MAX_SHEET_NAME);

    let last = truncated.chars().count().saturating_sub(1);
    let edged: String = truncated
        .chars()
        .enumerate()
        .map(|(i, c)| if c == '\'' && (i == 0 || i == last) { '_' } else { c })
        .collect();

    if edged.eq_ignore_ascii_case(RESERVED) {
        format!("{edged}_")
    } else {
        edged
    }
}

/// Hands out unique sheet names; names compare case-insensitively.
#[derive(Debug, Default)]
pub struct SheetNamer {
    taken: HashSet<String>,
}

impl SheetNamer {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_taken(&self, name: &str) -> bool {
        self.taken.contains(&name.to_lowercase())
    }

    fn claim(&mut self, name: String) -> String {
        self.taken.insert(name.to_lowercase());
        name
    }

    /// Reserve a fixed name (the summary sheet) ahead of the departments.
    pub fn reserve(&mut self, name: &str) -> String {
        self.assign(name, None)
    }

    /// Unique name for a sheet.
    ///
    /// Collisions try `<base>_<page>` first, then `<base>_2`, `<base>_3` and
    /// so on, shortening the base so the whole name fits.
    pub fn assign(&mut self, wanted: &str, page: Option<u32>) -> String {
        let base = sanitize(wanted);
        let base = if base.is_empty() {
            format!("Sheet_{}", page.unwrap_or(1))
        } else {
            base
        };
        if !self.is_taken(&base) {
            return self.claim(base);
        }

        let with_suffix = |suffix: String| {
            let keep = MAX_SHEET_NAME.saturating_sub(suffix.chars().count());
            format!("{}{}", truncate(&base, keep), suffix)
        };

        if let Some(page) = page {
            let candidate = with_suffix(format!("_{page}"));
            if !self.is_taken(&candidate) {
                info!("Sheet name '{}' taken, using '{}'", base, candidate);
                return self.claim(candidate);
            }
        }

        let mut k = 2u32;
        loop {
            let candidate = with_suffix(format!("_{k}"));
            if !self.is_taken(&candidate) {
                info!("Sheet name '{}' taken, using '{}'", base, candidate);
                return self.claim(candidate);
            }
            k += 1;
        }
    }
}
