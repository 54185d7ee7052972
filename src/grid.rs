use crate::schema::CellValue;
use std::collections::BTreeMap;

/// The external spreadsheet-like surface the matrix is written into.
/// Addressing is 1-based in both dimensions. Formulas are stored as text;
/// evaluation is the backing store's concern, never ours.
pub trait GridStore {
    fn read(&self, row: u32, column: u32) -> Option<CellValue>;

    fn write_value(&mut self, row: u32, column: u32, value: CellValue);

    fn write_formula(&mut self, row: u32, column: u32, formula: &str);

    /// Highest row index holding any content, 0 when the grid is empty.
    fn last_used_row(&self) -> u32;

    /// Highest column index holding any content, 0 when the grid is empty.
    fn last_used_column(&self) -> u32;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Value(CellValue),
    Formula(String),
}

/// In-memory grid, used by the tests and as a dry-run target.
#[derive(Debug, Clone, Default)]
pub struct MemoryGrid {
    cells: BTreeMap<(u32, u32), Cell>,
}

impl MemoryGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn formula(&self, row: u32, column: u32) -> Option<&str> {
        match self.cells.get(&(row, column)) {
            Some(Cell::Formula(text)) => Some(text),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }
}

impl GridStore for MemoryGrid {
    fn read(&self, row: u32, column: u32) -> Option<CellValue> {
        match self.cells.get(&(row, column)) {
            Some(Cell::Value(value)) => Some(value.clone()),
            // Formula cells read back as their text, mirroring a store
            // that exposes uncomputed formula bodies.
            Some(Cell::Formula(text)) => Some(CellValue::Text(text.clone())),
            None => None,
        }
    }

    fn write_value(&mut self, row: u32, column: u32, value: CellValue) {
        self.cells.insert((row, column), Cell::Value(value));
    }

    fn write_formula(&mut self, row: u32, column: u32, formula: &str) {
        self.cells
            .insert((row, column), Cell::Formula(formula.to_string()));
    }

    fn last_used_row(&self) -> u32 {
        self.cells.keys().map(|(row, _)| *row).max().unwrap_or(0)
    }

    fn last_used_column(&self) -> u32 {
        self.cells.keys().map(|(_, col)| *col).max().unwrap_or(0)
    }
}
