use crate::error::{AmortizationError, Result};
use crate::schema::{AllocationPlan, DateHeader, HeaderWrite, MonthSpan, PlannedCell, Transaction};
use crate::utils::{add_months, days_in_period, last_day_of_month, month_diff, month_start};
use chrono::{Datelike, NaiveDate};
use log::debug;

/// Minimum and maximum of all transaction `since`/`till` values.
pub fn compute_span(transactions: &[Transaction]) -> Result<MonthSpan> {
    let since = transactions
        .iter()
        .map(|t| t.since)
        .min()
        .ok_or(AmortizationError::EmptyLedger)?;
    let till = transactions
        .iter()
        .map(|t| t.till)
        .max()
        .ok_or(AmortizationError::EmptyLedger)?;

    Ok(MonthSpan { since, till })
}

/// Resolves the header anchor and the month slots that still need filling.
///
/// A missing anchor is seeded at the first month of `span`. An anchor that
/// postdates `span.since` cannot represent the earliest required month, so
/// the run fails instead of silently truncating. Existing month labels are
/// never overwritten: re-running against a partially built header only
/// fills gaps.
pub fn ensure_header(
    header: &DateHeader,
    span: &MonthSpan,
) -> Result<(NaiveDate, Vec<HeaderWrite>)> {
    let anchor = match header.anchor() {
        Some(existing) => {
            if existing > span.since {
                return Err(AmortizationError::HeaderTooLate {
                    anchor: existing,
                    required: span.since,
                });
            }
            existing
        }
        None => month_start(span.since),
    };

    let last_column = header.anchor_column + month_diff(anchor, span.till).max(0) as u32;
    let mut writes = Vec::new();
    for column in header.anchor_column..=last_column {
        if !header.months.contains_key(&column) {
            writes.push(HeaderWrite {
                column,
                month: add_months(anchor, (column - header.anchor_column) as i32),
            });
        }
    }

    Ok((anchor, writes))
}

/// Days of the interval `[since, till]` falling inside the calendar month
/// containing `month`. This is the numeric model of the cell formula; the
/// two must agree.
pub fn month_usage(month: NaiveDate, since: NaiveDate, till: NaiveDate) -> i64 {
    let is_first = month_diff(since, month) == 0;
    let is_last = month_diff(month, till) == 0;

    // A single-month interval is both first and last month; neither
    // partial-month expression alone counts its days correctly, so this
    // case is resolved before the boundary checks.
    if is_first && is_last {
        return (till.day() - since.day() + 1) as i64;
    }
    if month_diff(month, since) > 0 || month_diff(till, month) > 0 {
        return 0;
    }

    let month_end = last_day_of_month(month.year(), month.month());
    if is_first {
        (month_end.day() - since.day() + 1) as i64
    } else if is_last {
        till.day() as i64
    } else {
        month_end.day() as i64
    }
}

/// The amount the cell formula will compute for `month`: daily rate times
/// the month's usage.
pub fn prorated_amount(month: NaiveDate, transaction: &Transaction) -> f64 {
    let days = days_in_period(transaction.since, transaction.till);
    transaction.money / days as f64 * month_usage(month, transaction.since, transaction.till) as f64
}

/// Assembles the full placement for one block of transactions: header
/// fills, per-cell previews, and the totals rows. Pure with respect to the
/// grid; the writer performs the reads that produce `header` and the
/// writes the plan describes.
pub fn build_plan(
    locale: &str,
    transactions: &[Transaction],
    header: &DateHeader,
    first_row: u32,
    previous_total_row: Option<u32>,
) -> Result<AllocationPlan> {
    let span = compute_span(transactions)?;
    let (anchor, header_writes) = ensure_header(header, &span)?;

    let mut ordered: Vec<Transaction> = transactions.to_vec();
    ordered.sort_by_key(|t| t.id);

    let mut cells = Vec::new();
    let mut last_month_column = header.anchor_column;

    for (index, transaction) in ordered.iter().enumerate() {
        let row = first_row + index as u32;
        let offset = month_diff(anchor, transaction.since);
        let months = month_diff(transaction.since, transaction.till) + 1;

        for step in 0..months {
            let column = header.anchor_column + (offset + step) as u32;
            let month = add_months(anchor, offset + step);
            last_month_column = last_month_column.max(column);

            cells.push(PlannedCell {
                row,
                column,
                month,
                transaction_id: transaction.id,
                usage_days: month_usage(month, transaction.since, transaction.till),
                amount: prorated_amount(month, transaction),
            });
        }
    }

    let inner_result_row = first_row + ordered.len() as u32;
    let outer_result_row = inner_result_row + 2;

    debug!(
        "Planned {} matrix cells over columns {}..={} for {} transactions",
        cells.len(),
        header.anchor_column,
        last_month_column,
        ordered.len()
    );

    Ok(AllocationPlan {
        locale: locale.to_string(),
        span,
        anchor,
        anchor_column: header.anchor_column,
        first_row,
        previous_total_row,
        inner_result_row,
        outer_result_row,
        last_month_column,
        header_writes,
        cells,
        transactions: ordered,
    })
}
