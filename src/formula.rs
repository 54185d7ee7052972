//! Locale-aware rendering of the small formula language the matrix cells
//! are written in.
//!
//! Formulas are built in a neutral function-name set (`SUM`, `IF`,
//! `EOMONTH`, ...) and rendered into the target locale's names just before
//! emission. Rendering is textual substitution only: no evaluation happens
//! here, and substitution is done on whole identifier tokens so a neutral
//! name that is a substring of another identifier is never corrupted.
//!
//! Every numeric sub-expression carries a comment annotation: a leading
//! `MARKER("label") +` term whose marker function coerces text to zero, so
//! the cell displays its computed value while keeping a human-readable
//! audit label inside the formula.

use crate::writer::MatrixLayout;

const RU_FUNCTIONS: &[(&str, &str)] = &[
    ("DATEVALUE", "ДАТАЗНАЧ"),
    ("INDIRECT", "ДВССЫЛ"),
    ("DATEDIF", "РАЗНДАТ"),
    ("EOMONTH", "КОНМЕСЯЦА"),
    ("ISBLANK", "ЕПУСТО"),
    ("ADDRESS", "АДРЕС"),
    ("COLUMN", "СТОЛБЕЦ"),
    ("ROW", "СТРОКА"),
    ("DAY", "ДЕНЬ"),
    ("SUM", "СУММ"),
    ("AND", "И"),
    ("IF", "ЕСЛИ"),
];

fn substitutions(locale: &str) -> &'static [(&'static str, &'static str)] {
    match locale {
        "ru" => RU_FUNCTIONS,
        _ => &[],
    }
}

fn comment_marker(locale: &str) -> &'static str {
    match locale {
        "ru" => "Ч",
        _ => "N",
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Renders a neutral fragment into `locale`'s function names. Unregistered
/// locales pass through unchanged. Only whole identifier tokens are
/// substituted.
pub fn render_formula(locale: &str, fragment: &str) -> String {
    let table = substitutions(locale);
    if table.is_empty() {
        return fragment.to_string();
    }

    let mut out = String::with_capacity(fragment.len());
    let mut rest = fragment;
    while let Some(start) = rest.find(is_identifier_char) {
        out.push_str(&rest[..start]);
        let end = rest[start..]
            .find(|c: char| !is_identifier_char(c))
            .map(|e| start + e)
            .unwrap_or(rest.len());
        let token = &rest[start..end];
        match table.iter().find(|(neutral, _)| *neutral == token) {
            Some((_, localized)) => out.push_str(localized),
            None => out.push_str(token),
        }
        rest = &rest[end..];
    }
    out.push_str(rest);
    out
}

/// Prefixes `expression` with a locale-specific comment call, so the cell
/// shows a human label alongside its computed value.
pub fn annotate(locale: &str, label: &str, expression: &str) -> String {
    format!("{}(\"{}\") + {}", comment_marker(locale), label, expression)
}

/// Reference to a cell in the formula's own row (column absolute).
fn row_cell(column: u32) -> String {
    format!("INDIRECT(ADDRESS(ROW(); {column}; 3))")
}

/// Reference to a fixed row in the formula's own column (row absolute).
fn column_cell(row: u32) -> String {
    format!("INDIRECT(ADDRESS({row}; COLUMN(); 2))")
}

/// The per-cell proration formula. References the transaction's own row
/// cells and the header cell of its own column, so the spreadsheet
/// recomputes the value whenever the source row is edited.
pub fn matrix_cell_formula(locale: &str, layout: &MatrixLayout) -> String {
    let cell_money = row_cell(layout.money_column);
    let cell_since = row_cell(layout.since_column);
    let cell_till = row_cell(layout.till_column);
    let cell_month = column_cell(layout.header_row);

    let condition_before = format!("{cell_month} < EOMONTH({cell_since}; -1)");
    let condition_first = format!("{cell_month} <= {cell_since}");
    let condition_last = format!("{cell_till} <= EOMONTH({cell_month}; 0)");
    let condition_after = format!("{cell_month} > EOMONTH({cell_till}; 0)");
    let condition_single = format!("AND({condition_first}; {condition_last})");

    let value_money = annotate(locale, "Invoice amount:", &cell_money);
    let value_duration = annotate(
        locale,
        "Days in period:",
        &format!("DATEDIF({cell_since}; {cell_till}; \"d\") + 1"),
    );
    let value_single = annotate(
        locale,
        "Single-month period, partial coverage:",
        &format!("DAY({cell_till}) - DAY({cell_since}) + 1"),
    );
    let value_before = annotate(locale, "Period not yet started:", "0");
    let value_first = annotate(
        locale,
        "First month of the period, partial coverage:",
        &format!("DAY(EOMONTH({cell_month}; 0)) - DAY({cell_since}) + 1"),
    );
    let value_middle = annotate(
        locale,
        "Middle month of the period, full coverage:",
        &format!("DAY(EOMONTH({cell_month}; 0))"),
    );
    let value_last = annotate(
        locale,
        "Last month of the period, partial coverage:",
        &format!("DAY({cell_till})"),
    );
    let value_after = annotate(locale, "Period already ended:", "0");

    // The single-month branch comes first: a transaction whose interval
    // lies within one month is both a first and a last month, and neither
    // partial-month expression alone counts its days correctly.
    let month_usage = annotate(
        locale,
        "Days of the period in this month:",
        &format!(
            "IF({condition_single}; {value_single}; \
             IF({condition_before}; {value_before}; \
             IF({condition_after}; {value_after}; \
             IF({condition_first}; {value_first}; \
             IF({condition_last}; {value_last}; {value_middle})))))"
        ),
    );

    render_formula(
        locale,
        &format!("= ({value_money}) / ({value_duration}) * ({month_usage})"),
    )
}

/// Per-transaction row total: sums the row's month cells across the full
/// header range from the anchor column to the widest column in use.
pub fn row_total_formula(locale: &str, layout: &MatrixLayout, last_month_column: u32) -> String {
    let first = row_cell(layout.anchor_column);
    let last = row_cell(last_month_column);
    render_formula(locale, &format!("= SUM({first}:{last})"))
}

/// Per-column inner result: sums the transaction-row range of the block.
pub fn inner_result_formula(locale: &str, first_row: u32, last_row: u32) -> String {
    let first = column_cell(first_row);
    let last = column_cell(last_row);
    render_formula(locale, &format!("= SUM({first}:{last})"))
}

/// Running grand total for the trailing summary row: the previous block's
/// total plus the current block's inner result, or 0 when the month header
/// of this column is blank (totals never extend into unallocated columns).
pub fn outer_result_formula(
    locale: &str,
    layout: &MatrixLayout,
    previous_total_row: Option<u32>,
    inner_result_row: u32,
) -> String {
    let cell_month = column_cell(layout.header_row);
    let cell_current = column_cell(inner_result_row);
    let sum = match previous_total_row {
        Some(previous) => {
            let cell_previous = column_cell(previous);
            format!("SUM({cell_previous}; {cell_current})")
        }
        None => format!("SUM({cell_current})"),
    };
    render_formula(
        locale,
        &format!("= IF(ISBLANK({cell_month}); 0; {sum})"),
    )
}
