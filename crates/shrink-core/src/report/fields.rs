//! Anchor-offset field splitter.
//!
//! A record's tokens are resolved in three stages:
//!
//! 1. [`locate_anchors`] finds the confirmation number and the UPC.
//! 2. [`assign_offsets`] reads the fields at fixed offsets from the anchors.
//! 3. [`disambiguate_reason`] decides whether the reason is one or two words,
//!    which fixes where the price group starts.
//!
//! Every read is bounds-checked; a missing token is an empty field.

use super::patterns::{is_conf_number, is_numeric, is_upc};
use crate::error::ParseFailure;
use crate::models::report::{Field, TransactionRecord};

/// Token indices of the two record anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchors {
    pub conf: usize,
    pub upc: usize,
}

/// Find the confirmation number, then the first UPC at least three tokens after it.
pub fn locate_anchors(tokens: &[&str]) -> Result<Anchors, ParseFailure> {
    if tokens.is_empty() {
        return Err(ParseFailure::EmptyRecord);
    }
    let conf = tokens
        .iter()
        .position(|t| is_conf_number(t))
        .ok_or(ParseFailure::NoConfirmationAnchor)?;
    let upc = tokens
        .iter()
        .enumerate()
        .skip(conf + 3)
        .find(|(_, t)| is_upc(t))
        .map(|(i, _)| i)
        .ok_or(ParseFailure::NoUpcAnchor)?;
    Ok(Anchors { conf, upc })
}

fn token(tokens: &[&str], index: usize) -> String {
    tokens.get(index).map_or_else(String::new, |t| t.to_string())
}

/// Fill every field up to and including the one-word reason.
pub fn assign_offsets(tokens: &[&str], anchors: Anchors) -> TransactionRecord {
    let Anchors { conf, upc } = anchors;
    let mut record = TransactionRecord::new();

    record.set(Field::Conf, token(tokens, conf));
    record.set(Field::Date, token(tokens, conf + 1));
    record.set(Field::User, token(tokens, conf + 2));
    record.set(Field::Upc, token(tokens, upc));

    // Size is left empty when the UPC directly follows the user, so it never repeats User.
    let description_start = conf + 3;
    if upc > description_start {
        record.set(Field::Size, token(tokens, upc - 1));
        if upc - 1 > description_start {
            record.set(Field::Description, tokens[description_start..upc - 1].join(" "));
        }
    }

    let vendor = format!("{} {}", token(tokens, upc + 1), token(tokens, upc + 2));
    record.set(Field::Vendor, vendor.trim());
    record.set(Field::Units, token(tokens, upc + 3));
    record.set(Field::Reason, token(tokens, upc + 4));
    record
}

/// Take a non-numeric token after the reason as its second word.
///
/// Returns the index where the price group starts.
pub fn disambiguate_reason(
    tokens: &[&str],
    anchors: Anchors,
    record: &mut TransactionRecord,
) -> usize {
    let next = anchors.upc + 5;
    match tokens.get(next) {
        Some(t) if !is_numeric(t) => {
            record.append(Field::Reason, t);
            next + 1
        }
        _ => next,
    }
}

/// Fill price, retail, total and the optional trailing weight.
pub fn assign_price_group(tokens: &[&str], price: usize, record: &mut TransactionRecord) {
    record.set(Field::Price, token(tokens, price));
    record.set(Field::Retail, token(tokens, price + 1));
    record.set(Field::Total, token(tokens, price + 2));
    if let Some(weight) = tokens.get(price + 3).filter(|t| !is_numeric(t)) {
        record.set(Field::Weight, *weight);
    }
}

/// Split one record's tokens into the 13-field schema.
pub fn split_record(tokens: &[&str]) -> Result<TransactionRecord, ParseFailure> {
    let anchors = locate_anchors(tokens)?;
    let mut record = assign_offsets(tokens, anchors);
    let price = disambiguate_reason(tokens, anchors, &mut record);
    assign_price_group(tokens, price, &mut record);
    Ok(record)
}
