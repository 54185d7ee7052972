use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One amortizable financial event. Constructed once when the ledger is
/// parsed and immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique key within a ledger batch.
    pub id: u64,
    /// Calendar date the transaction was recorded.
    pub activated: NaiveDate,
    /// Total value to be amortized over `[since, till]`.
    pub money: f64,
    /// First day of the validity interval (inclusive).
    pub since: NaiveDate,
    /// Last day of the validity interval (inclusive). Invariant: `since <= till`.
    pub till: NaiveDate,
}

/// Inclusive range of calendar months touched by the union of all
/// transaction intervals. Derived as the min/max of `since`/`till`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthSpan {
    pub since: NaiveDate,
    pub till: NaiveDate,
}

/// Snapshot of the month-header row as read from the grid. Month anchors
/// are first-of-month dates, one per column, strictly increasing by one
/// calendar month per column step.
#[derive(Debug, Clone, Default)]
pub struct DateHeader {
    /// 1-based column of the first month slot.
    pub anchor_column: u32,
    /// Populated month slots, keyed by column.
    pub months: BTreeMap<u32, NaiveDate>,
}

impl DateHeader {
    pub fn new(anchor_column: u32) -> Self {
        Self {
            anchor_column,
            months: BTreeMap::new(),
        }
    }

    /// The anchor month, if the header has been seeded.
    pub fn anchor(&self) -> Option<NaiveDate> {
        self.months.get(&self.anchor_column).copied()
    }

    pub fn last_column(&self) -> Option<u32> {
        self.months.keys().next_back().copied()
    }
}

/// Value alphabet of the external grid store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl CellValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

/// A month slot the header is missing and the writer will fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderWrite {
    pub column: u32,
    pub month: NaiveDate,
}

/// One matrix cell the writer will populate, with a numeric preview of what
/// the emitted formula computes. The preview exists for the confirmation
/// step; the grid receives the formula, never the number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedCell {
    pub row: u32,
    pub column: u32,
    /// First day of the calendar month this column represents.
    pub month: NaiveDate,
    pub transaction_id: u64,
    /// Days of the transaction's interval falling inside this month.
    pub usage_days: i64,
    pub amount: f64,
}

/// Everything a run will write, computed up front so the caller can confirm
/// (or log, or serialize) the placement before any cell is touched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationPlan {
    pub locale: String,
    pub span: MonthSpan,
    /// Anchor month of the header (first day of month).
    pub anchor: NaiveDate,
    pub anchor_column: u32,
    /// Row of the first transaction.
    pub first_row: u32,
    /// Outer-result row of the previous block, when one exists.
    pub previous_total_row: Option<u32>,
    pub inner_result_row: u32,
    pub outer_result_row: u32,
    /// Rightmost month column any transaction occupies.
    pub last_month_column: u32,
    pub header_writes: Vec<HeaderWrite>,
    pub cells: Vec<PlannedCell>,
    /// Transactions in placement order: row `first_row + index`.
    pub transactions: Vec<Transaction>,
}

impl AllocationPlan {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Sum of the numeric previews, for sanity-checking against the ledger
    /// total before committing.
    pub fn previewed_total(&self) -> f64 {
        self.cells.iter().map(|c| c.amount).sum()
    }
}
