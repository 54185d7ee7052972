use crate::error::{AmortizationError, Result};
use crate::schema::Transaction;
use chrono::NaiveDate;
use log::debug;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Source tag of amortizable rows in the payment export.
pub const DEFAULT_SOURCE_TAG: &str = "SBS";

fn parse_date(field: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(field.trim(), "%Y-%m-%d")
        .map_err(|_| AmortizationError::UnparsableDate(field.to_string()))
}

fn parse_amount(field: &str) -> Result<f64> {
    field
        .trim()
        .parse::<f64>()
        .map_err(|_| AmortizationError::UnparsableAmount(field.to_string()))
}

fn parse_id(field: &str) -> Result<u64> {
    field
        .trim()
        .parse::<u64>()
        .map_err(|_| AmortizationError::UnparsableId(field.to_string()))
}

/// Parses a semicolon-delimited record stream into transactions, keeping
/// only rows whose source tag matches. Columns: id, activation date,
/// source tag, amount, since date, till date; dates are ISO `YYYY-MM-DD`.
///
/// Any malformed kept row aborts the whole run: a partially loaded ledger
/// would silently corrupt the totals downstream. Duplicate ids keep the
/// last row. The result is sorted ascending by id.
pub fn load_ledger<R: Read>(reader: R, source_tag: &str) -> Result<Vec<Transaction>> {
    let mut document = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut transactions: BTreeMap<u64, Transaction> = BTreeMap::new();
    for record in document.records() {
        let record = record?;

        if record.get(2).map(str::trim) != Some(source_tag) {
            continue;
        }

        let id = parse_id(record.get(0).unwrap_or_default())?;
        let transaction = Transaction {
            id,
            activated: parse_date(record.get(1).unwrap_or_default())?,
            money: parse_amount(record.get(3).unwrap_or_default())?,
            since: parse_date(record.get(4).unwrap_or_default())?,
            till: parse_date(record.get(5).unwrap_or_default())?,
        };
        transactions.insert(id, transaction);
    }

    debug!("Loaded {} '{}' transactions", transactions.len(), source_tag);
    Ok(transactions.into_values().collect())
}

pub fn load_ledger_file<P: AsRef<Path>>(path: P, source_tag: &str) -> Result<Vec<Transaction>> {
    let file = File::open(path)?;
    load_ledger(file, source_tag)
}
