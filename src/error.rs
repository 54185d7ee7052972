use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AmortizationError {
    #[error("No transactions to allocate: the ledger is empty")]
    EmptyLedger,

    #[error("Header anchor {anchor} postdates the earliest required month {required}: the existing header cannot represent that month")]
    HeaderTooLate {
        anchor: NaiveDate,
        required: NaiveDate,
    },

    #[error("Unparsable date in ledger row: {0}")]
    UnparsableDate(String),

    #[error("Unparsable amount in ledger row: {0}")]
    UnparsableAmount(String),

    #[error("Unparsable transaction id in ledger row: {0}")]
    UnparsableId(String),

    #[error("Transaction {id} has an invalid interval: since {since} is after till {till}")]
    InvalidInterval {
        id: u64,
        since: NaiveDate,
        till: NaiveDate,
    },

    #[error("Totals marker '{0}' not found in a non-empty grid; refusing to pick an insertion row")]
    MarkerNotFound(String),

    #[error("Ledger read error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AmortizationError>;
