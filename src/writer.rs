use crate::engine;
use crate::error::{AmortizationError, Result};
use crate::formula;
use crate::grid::GridStore;
use crate::schema::{AllocationPlan, CellValue, DateHeader, MonthSpan, Transaction};
use chrono::NaiveDate;
use log::{debug, info};

/// Label of the trailing grand-total row. The writer emits it and the next
/// run's insertion scan looks for it.
pub const DEFAULT_TOTALS_MARKER: &str = "TOTAL";

/// Fixed column/row layout of one matrix block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixLayout {
    /// Row holding the month-anchor dates.
    pub header_row: u32,
    /// Column of the first month slot.
    pub anchor_column: u32,
    pub activated_column: u32,
    pub id_column: u32,
    pub money_column: u32,
    pub since_column: u32,
    pub till_column: u32,
    /// Column receiving the per-transaction row total.
    pub row_total_column: u32,
    /// First transaction row when the grid is still empty.
    pub default_first_row: u32,
}

impl Default for MatrixLayout {
    fn default() -> Self {
        Self {
            header_row: 1,
            anchor_column: 7,
            activated_column: 1,
            id_column: 2,
            money_column: 3,
            since_column: 4,
            till_column: 5,
            row_total_column: 6,
            default_first_row: 3,
        }
    }
}

/// Where a new block of transactions lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertionPoint {
    /// Outer-result row of the previous block, when one exists.
    pub previous_total_row: Option<u32>,
    /// Row of the first transaction of the new block.
    pub first_row: u32,
}

/// Drives the external grid store: resolves the insertion point, reads the
/// existing header, and performs the writes an [`AllocationPlan`]
/// describes. Planning and committing are separate steps so a caller can
/// confirm the placement before any cell is touched.
pub struct MatrixWriter {
    locale: String,
    layout: MatrixLayout,
    totals_marker: String,
}

impl MatrixWriter {
    pub fn new(locale: &str) -> Self {
        Self {
            locale: locale.to_string(),
            layout: MatrixLayout::default(),
            totals_marker: DEFAULT_TOTALS_MARKER.to_string(),
        }
    }

    pub fn with_layout(mut self, layout: MatrixLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_totals_marker(mut self, marker: &str) -> Self {
        self.totals_marker = marker.to_string();
        self
    }

    /// Scans the first column bottom-up for the totals marker of the
    /// previous block. An empty grid seeds the default first row; a
    /// non-empty grid without a marker is refused rather than overwritten.
    pub fn find_insertion_point<G: GridStore>(&self, grid: &G) -> Result<InsertionPoint> {
        let last_row = grid.last_used_row();
        if last_row == 0 {
            return Ok(InsertionPoint {
                previous_total_row: None,
                first_row: self.layout.default_first_row,
            });
        }

        for row in (1..=last_row).rev() {
            let is_marker = grid
                .read(row, self.layout.activated_column)
                .as_ref()
                .and_then(CellValue::as_text)
                == Some(self.totals_marker.as_str());
            if is_marker {
                return Ok(InsertionPoint {
                    previous_total_row: Some(row),
                    first_row: row + 3,
                });
            }
        }

        Err(AmortizationError::MarkerNotFound(self.totals_marker.clone()))
    }

    /// Snapshot of the month-header row as currently stored.
    pub fn read_header<G: GridStore>(&self, grid: &G) -> DateHeader {
        let mut header = DateHeader::new(self.layout.anchor_column);
        for column in self.layout.anchor_column..=grid.last_used_column().max(self.layout.anchor_column) {
            if let Some(month) = grid
                .read(self.layout.header_row, column)
                .as_ref()
                .and_then(CellValue::as_date)
            {
                header.months.insert(column, month);
            }
        }
        header
    }

    /// Computes everything the run would write, without writing. The plan
    /// carries numeric previews for the caller's confirmation step.
    pub fn plan<G: GridStore>(
        &self,
        grid: &G,
        transactions: &[Transaction],
    ) -> Result<AllocationPlan> {
        let insertion = self.find_insertion_point(grid)?;
        let header = self.read_header(grid);

        debug!(
            "Planning block at row {} (previous totals row: {:?})",
            insertion.first_row, insertion.previous_total_row
        );

        engine::build_plan(
            &self.locale,
            transactions,
            &header,
            insertion.first_row,
            insertion.previous_total_row,
        )
    }

    /// Performs the writes of a previously computed plan, in order:
    /// transaction rows, header fill, proration formulas, row totals,
    /// inner-result row, outer-result row.
    pub fn commit<G: GridStore>(&self, grid: &mut G, plan: &AllocationPlan) -> Result<()> {
        let layout = &self.layout;

        for (index, transaction) in plan.transactions.iter().enumerate() {
            let row = plan.first_row + index as u32;
            grid.write_value(row, layout.activated_column, CellValue::Date(transaction.activated));
            grid.write_value(row, layout.id_column, CellValue::Number(transaction.id as f64));
            grid.write_value(row, layout.money_column, CellValue::Number(transaction.money));
            grid.write_value(row, layout.since_column, CellValue::Date(transaction.since));
            grid.write_value(row, layout.till_column, CellValue::Date(transaction.till));
        }

        for write in &plan.header_writes {
            grid.write_value(layout.header_row, write.column, CellValue::Date(write.month));
        }

        let cell_formula = formula::matrix_cell_formula(&plan.locale, layout);
        for cell in &plan.cells {
            grid.write_formula(cell.row, cell.column, &cell_formula);
        }

        let row_total = formula::row_total_formula(&plan.locale, layout, plan.last_month_column);
        for index in 0..plan.transactions.len() {
            grid.write_formula(
                plan.first_row + index as u32,
                layout.row_total_column,
                &row_total,
            );
        }

        let last_transaction_row = plan.inner_result_row - 1;
        let inner =
            formula::inner_result_formula(&plan.locale, plan.first_row, last_transaction_row);
        grid.write_value(
            plan.inner_result_row,
            layout.activated_column,
            CellValue::Text("Subtotal".to_string()),
        );
        grid.write_formula(plan.inner_result_row, layout.money_column, &inner);
        for column in layout.anchor_column..=plan.last_month_column {
            grid.write_formula(plan.inner_result_row, column, &inner);
        }

        let outer = formula::outer_result_formula(
            &plan.locale,
            layout,
            plan.previous_total_row,
            plan.inner_result_row,
        );
        grid.write_value(
            plan.outer_result_row,
            layout.activated_column,
            CellValue::Text(self.totals_marker.clone()),
        );
        let last_outer_column = plan.last_month_column.max(grid.last_used_column());
        for column in layout.anchor_column..=last_outer_column {
            grid.write_formula(plan.outer_result_row, column, &outer);
        }

        info!(
            "Wrote {} transactions and {} matrix cells into rows {}..={}",
            plan.transactions.len(),
            plan.cells.len(),
            plan.first_row,
            plan.outer_result_row
        );
        Ok(())
    }

    /// Plan and commit in one step. Returns the covered span and the header
    /// anchor for the caller's logging.
    pub fn run_allocation<G: GridStore>(
        &self,
        grid: &mut G,
        transactions: &[Transaction],
    ) -> Result<(MonthSpan, NaiveDate)> {
        let plan = self.plan(grid, transactions)?;
        self.commit(grid, &plan)?;
        Ok((plan.span, plan.anchor))
    }
}
