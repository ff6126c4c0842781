use crate::model::Value;
use crate::Result;
use anyhow::Context;
use calamine::{open_workbook, Data, Reader, Xlsx};
use std::path::Path;

/// One cell of a sheet. A cell can carry a cached value, a formula, or both (calamine
/// reports the last calculated value alongside the formula text).
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Cell {
    pub(crate) value: Option<Value>,
    pub(crate) formula: Option<String>,
}

impl Cell {
    pub(crate) fn value(value: Value) -> Self {
        Self {
            value: Some(value),
            formula: None,
        }
    }

    /// True when the cell contributes nothing: no formula and no value beyond
    /// whitespace. Zero and `false` are real values and do not count as blank.
    pub(crate) fn is_blank(&self) -> bool {
        self.formula.is_none()
            && match &self.value {
                None => true,
                Some(Value::Text(s)) => s.trim().is_empty(),
                Some(_) => false,
            }
    }
}

/// A single sheet as a dense row-major grid. Rows may be ragged; absent cells are blank.
#[derive(Debug, Clone, Default)]
pub(crate) struct SheetGrid {
    name: String,
    rows: Vec<Vec<Cell>>,
}

impl SheetGrid {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    #[cfg(test)]
    pub(crate) fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Places a cell, growing the grid as needed.
    pub(crate) fn set_cell(&mut self, row: usize, col: usize, cell: Cell) {
        while self.rows.len() <= row {
            self.rows.push(Vec::new());
        }
        let r = &mut self.rows[row];
        while r.len() <= col {
            r.push(Cell::default());
        }
        r[col] = cell;
    }

    pub(crate) fn set_formula(&mut self, row: usize, col: usize, formula: String) {
        while self.rows.len() <= row {
            self.rows.push(Vec::new());
        }
        let r = &mut self.rows[row];
        while r.len() <= col {
            r.push(Cell::default());
        }
        r[col].formula = Some(formula);
    }

    pub(crate) fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    /// Deletes rows from the bottom up until only `keep` remain.
    pub(crate) fn truncate_rows(&mut self, keep: usize) {
        while self.rows.len() > keep {
            self.rows.pop();
        }
    }

    /// Column labels from the header row, in column order. Blank cells yield empty labels
    /// so positions line up with column indexes.
    pub(crate) fn header_labels(&self) -> Vec<String> {
        match self.rows.first() {
            None => Vec::new(),
            Some(row) => row
                .iter()
                .map(|cell| {
                    cell.value
                        .as_ref()
                        .map(|v| v.as_text().trim().to_string())
                        .unwrap_or_default()
                })
                .collect(),
        }
    }
}

/// Full contents of a workbook, sheet order preserved.
#[derive(Debug, Clone, Default)]
pub(crate) struct Book {
    sheets: Vec<SheetGrid>,
}

impl Book {
    #[cfg(test)]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Loads an existing workbook from disk, capturing both cached values and formula
    /// text for every occupied cell.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let mut workbook: Xlsx<_> = open_workbook(path)
            .with_context(|| format!("Unable to open workbook at '{}'", path.display()))?;
        let names = workbook.sheet_names().to_vec();
        let mut sheets = Vec::with_capacity(names.len());
        for name in names {
            let range = workbook
                .worksheet_range(&name)
                .with_context(|| format!("Unable to read the sheet '{name}'"))?;
            let mut sheet = SheetGrid::new(&name);
            // Ranges are anchored at the first occupied cell, not A1.
            let (top, left) = range.start().unwrap_or((0, 0));
            for (r, row) in range.rows().enumerate() {
                for (c, data) in row.iter().enumerate() {
                    if let Some(value) = convert(data) {
                        sheet.set_cell(top as usize + r, left as usize + c, Cell::value(value));
                    }
                }
            }
            let formulas = workbook
                .worksheet_formula(&name)
                .with_context(|| format!("Unable to read formulas of the sheet '{name}'"))?;
            let (top, left) = formulas.start().unwrap_or((0, 0));
            for (r, row) in formulas.rows().enumerate() {
                for (c, formula) in row.iter().enumerate() {
                    if !formula.is_empty() {
                        sheet.set_formula(top as usize + r, left as usize + c, formula.clone());
                    }
                }
            }
            sheets.push(sheet);
        }
        Ok(Self { sheets })
    }

    pub(crate) fn sheets(&self) -> &[SheetGrid] {
        &self.sheets
    }

    pub(crate) fn sheet(&self, name: &str) -> Option<&SheetGrid> {
        self.sheets.iter().find(|s| s.name() == name)
    }

    pub(crate) fn sheet_mut(&mut self, name: &str) -> Option<&mut SheetGrid> {
        self.sheets.iter_mut().find(|s| s.name() == name)
    }

    #[cfg(test)]
    pub(crate) fn add_sheet(&mut self, sheet: SheetGrid) {
        self.sheets.push(sheet);
    }
}

fn convert(data: &Data) -> Option<Value> {
    match data {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => Some(Value::Text(s.clone())),
        Data::Float(f) => Some(Value::Number(*f)),
        Data::Int(i) => Some(Value::Number(*i as f64)),
        Data::Bool(b) => Some(Value::Bool(*b)),
        Data::DateTime(dt) => Some(Value::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(Value::Text(s.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_cells() {
        assert!(Cell::default().is_blank());
        assert!(Cell::value(Value::text("   ")).is_blank());
        assert!(!Cell::value(Value::Number(0.0)).is_blank());
        assert!(!Cell::value(Value::Bool(false)).is_blank());
        assert!(!Cell {
            value: None,
            formula: Some("A1+B1".to_string()),
        }
        .is_blank());
    }

    #[test]
    fn grid_grows_on_demand() {
        let mut sheet = SheetGrid::new("Sheet1");
        sheet.set_cell(2, 3, Cell::value(Value::Number(7.0)));
        assert_eq!(sheet.rows().len(), 3);
        assert_eq!(sheet.cell(2, 3), Some(&Cell::value(Value::Number(7.0))));
        assert_eq!(sheet.cell(0, 0), None);
        assert!(sheet.cell(2, 2).map(Cell::is_blank).unwrap_or(true));
    }

    #[test]
    fn truncate_removes_rows_bottom_up() {
        let mut sheet = SheetGrid::new("Sheet1");
        for i in 0..6 {
            sheet.push_row(vec![Cell::value(Value::Number(i as f64))]);
        }
        sheet.truncate_rows(3);
        assert_eq!(sheet.rows().len(), 3);
        assert_eq!(sheet.cell(2, 0), Some(&Cell::value(Value::Number(2.0))));
    }

    #[test]
    fn header_labels_align_with_columns() {
        let mut sheet = SheetGrid::new("Sheet1");
        sheet.set_cell(0, 0, Cell::value(Value::text("Date")));
        sheet.set_cell(0, 2, Cell::value(Value::text(" Amount ")));
        assert_eq!(sheet.header_labels(), vec!["Date", "", "Amount"]);
    }
}
