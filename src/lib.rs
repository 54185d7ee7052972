//! # Revenue Amortization Builder
//!
//! A library for projecting time-bounded monetary transactions onto a
//! month-by-month amortization matrix inside a spreadsheet-like grid,
//! emitting locale-aware formulas that compute pro-rated monthly revenue
//! recognition.
//!
//! ## Core Concepts
//!
//! - **Transaction**: an amount valid over an inclusive `[since, till]`
//!   date interval, amortized proportionally to the days active per month
//! - **Month span**: the calendar-month range the matrix must cover, the
//!   union of all transaction intervals
//! - **Date header**: one month-anchor date per matrix column, extended
//!   forward month by month and never rewritten
//! - **Proration formulas**: each matrix cell receives a formula
//!   referencing its own row and column header, so the grid recomputes the
//!   split when the source row is edited; the engine never embeds literals
//! - **Plan/commit**: a run first computes everything it would write (with
//!   numeric previews for confirmation), then performs the writes
//!
//! ## Example
//!
//! ```rust,ignore
//! use revenue_amortization_builder::*;
//!
//! let transactions = load_ledger_file("payments.csv", DEFAULT_SOURCE_TAG)?;
//! let mut grid = MemoryGrid::new();
//!
//! let processor = AmortizationProcessor::new("ru");
//! let plan = processor.plan(&grid, &transactions)?;
//! println!("{}", plan.to_json()?);
//!
//! let (span, anchor) = processor.process(&mut grid, &transactions)?;
//! ```

pub mod engine;
pub mod error;
pub mod formula;
pub mod grid;
pub mod ingestion;
pub mod schema;
pub mod utils;
pub mod writer;

pub use engine::{build_plan, compute_span, ensure_header, month_usage, prorated_amount};
pub use error::{AmortizationError, Result};
pub use formula::{annotate, render_formula};
pub use grid::{GridStore, MemoryGrid};
pub use ingestion::{load_ledger, load_ledger_file, DEFAULT_SOURCE_TAG};
pub use schema::*;
pub use utils::*;
pub use writer::{InsertionPoint, MatrixLayout, MatrixWriter, DEFAULT_TOTALS_MARKER};

use log::{debug, info};

/// Checks the per-transaction interval invariant before any placement
/// happens. A reversed interval would make the proration denominator
/// nonsensical, so the whole run is refused.
pub fn validate_ledger(transactions: &[Transaction]) -> Result<()> {
    if transactions.is_empty() {
        return Err(AmortizationError::EmptyLedger);
    }

    for transaction in transactions {
        if transaction.since > transaction.till {
            return Err(AmortizationError::InvalidInterval {
                id: transaction.id,
                since: transaction.since,
                till: transaction.till,
            });
        }
    }

    Ok(())
}

/// Entry point tying validation, planning, and writing together.
pub struct AmortizationProcessor {
    writer: MatrixWriter,
}

impl AmortizationProcessor {
    pub fn new(locale: &str) -> Self {
        Self {
            writer: MatrixWriter::new(locale),
        }
    }

    pub fn with_writer(writer: MatrixWriter) -> Self {
        Self { writer }
    }

    /// Dry run: validates the ledger and computes the full placement
    /// without touching the grid. The caller confirms on the plan.
    pub fn plan<G: GridStore>(
        &self,
        grid: &G,
        transactions: &[Transaction],
    ) -> Result<AllocationPlan> {
        validate_ledger(transactions)?;

        debug!("Planning allocation of {} transactions", transactions.len());
        let plan = self.writer.plan(grid, transactions)?;

        info!(
            "Planned span {}..{} anchored at {} (previewed total {:.2})",
            plan.span.since,
            plan.span.till,
            plan.anchor,
            plan.previewed_total()
        );
        Ok(plan)
    }

    /// Full run: plan, then write. Returns the covered span and the header
    /// anchor month.
    pub fn process<G: GridStore>(
        &self,
        grid: &mut G,
        transactions: &[Transaction],
    ) -> Result<(MonthSpan, chrono::NaiveDate)> {
        let plan = self.plan(grid, transactions)?;
        self.writer.commit(grid, &plan)?;
        Ok((plan.span, plan.anchor))
    }
}

/// Convenience wrapper over [`AmortizationProcessor::process`].
pub fn run_allocation<G: GridStore>(
    locale: &str,
    transactions: &[Transaction],
    grid: &mut G,
) -> Result<(MonthSpan, chrono::NaiveDate)> {
    AmortizationProcessor::new(locale).process(grid, transactions)
}
