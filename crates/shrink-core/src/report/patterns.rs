//! Token and line patterns of the shrink report format.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Record anchors
    pub static ref CONF_NUMBER: Regex = Regex::new(r"^\d{5,}-\d{2}$").unwrap();

    pub static ref CONF_PREFIX: Regex = Regex::new(r"^\d{5,}-\d{2}").unwrap();

    pub static ref LONG_NUMBER: Regex = Regex::new(r"^\d{5,}$").unwrap();

    pub static ref UPC: Regex = Regex::new(r"^\d{11,}$").unwrap();

    // Plain numeric field, one optional decimal point
    pub static ref NUMERIC: Regex = Regex::new(r"^(?:\d+\.?\d*|\.\d+)$").unwrap();

    pub static ref FIRST_NUMBER: Regex = Regex::new(r"\d+(?:\.\d+)?").unwrap();

    // Summary page
    pub static ref SUMMARY_HEADER: Regex =
        Regex::new(r"(?i)Department\s+Reason\s+Items\s+Total").unwrap();

    pub static ref SUMMARY_LINE: Regex =
        Regex::new(r"^(\d+)\s+(.+?)\s+(\d+(?:\.\d+)?)\s+([A-Z][A-Z ]*)$").unwrap();
}

/// Whether a token is a plain number (digits with at most one decimal point).
pub fn is_numeric(token: &str) -> bool {
    NUMERIC.is_match(token)
}

/// Whether a token is a confirmation number (`NNNNN-NN`).
pub fn is_conf_number(token: &str) -> bool {
    CONF_NUMBER.is_match(token)
}

/// Whether a token is a UPC (11 or more digits).
pub fn is_upc(token: &str) -> bool {
    UPC.is_match(token)
}
