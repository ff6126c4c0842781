//! Rewrites the data region of category sheets and renders the workbook back to disk.

use crate::model::{Category, Dataset, FieldMap, Record, Value, ValueClass, Warning};
use crate::workbook::{scaffold, Book, Cell, SheetGrid, FIRST_DATA_ROW, SCAFFOLD_ROWS};
use crate::Result;
use anyhow::Context;
use rust_xlsxwriter::{Format, Formula, Workbook, Worksheet};
use std::collections::HashSet;
use std::path::Path;

/// Replaces the data region of every category sheet with the dataset's records. The three
/// scaffold rows stay untouched; stale data rows are deleted from the bottom up before the
/// new rows go in. Attributes with no matching column are dropped and reported once.
pub(crate) fn write_dataset(book: &mut Book, dataset: &Dataset) -> Vec<Warning> {
    let mut warnings = Vec::new();
    for category in Category::ALL {
        write_category(book, category, dataset.records(category), &mut warnings);
    }
    warnings
}

fn write_category(
    book: &mut Book,
    category: Category,
    records: &[Record],
    warnings: &mut Vec<Warning>,
) {
    let Some(sheet) = book.sheet_mut(category.sheet_title()) else {
        warnings.push(Warning::SheetMissing { category });
        return;
    };
    let field_map = FieldMap::of(category);
    let headers = sheet.header_labels();
    sheet.truncate_rows(SCAFFOLD_ROWS);
    // Data always starts at row 4, even on a sheet with a stripped-down scaffold.
    while sheet.rows().len() < SCAFFOLD_ROWS {
        sheet.push_row(Vec::new());
    }
    let mut dropped: HashSet<String> = HashSet::new();
    for record in records {
        let mut row = vec![Cell::default(); headers.len()];
        for (attr, value) in record.iter() {
            let col = field_map
                .by_attr(attr)
                .and_then(|field| headers.iter().position(|h| h.as_str() == field.label()));
            match col {
                Some(col) => row[col] = Cell::value(value.clone()),
                None => {
                    if dropped.insert(attr.clone()) {
                        warnings.push(Warning::UnmappedAttribute {
                            category,
                            attr: attr.clone(),
                        });
                    }
                }
            }
        }
        sheet.push_row(row);
    }
}

/// Renders the full in-memory workbook to disk. Category sheets get the scaffold styling
/// for their top rows and value-class formats for data cells, the dashboard is rebuilt
/// from its template, and any other sheet is carried over plain.
pub(crate) fn save_book(book: &Book, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    for sheet in book.sheets() {
        let ws = workbook.add_worksheet();
        ws.set_name(sheet.name())?;
        if sheet.name() == scaffold::DASHBOARD_TITLE {
            scaffold::render_dashboard(ws)?;
        } else if let Some(category) = Category::from_sheet_title(sheet.name()) {
            render_category_sheet(ws, category, sheet)?;
        } else {
            render_plain_sheet(ws, sheet)?;
        }
    }
    workbook
        .save(path)
        .with_context(|| format!("Unable to write workbook at '{}'", path.display()))
}

fn render_category_sheet(ws: &mut Worksheet, category: Category, sheet: &SheetGrid) -> Result<()> {
    let field_map = FieldMap::of(category);
    let headers = sheet.header_labels();
    let classes: Vec<Option<ValueClass>> = headers
        .iter()
        .map(|label| field_map.by_label(label).map(|f| f.class()))
        .collect();

    let header_format = scaffold::header_format();
    let note_format = scaffold::note_format();
    let currency_format = scaffold::currency_format();
    let centered_format = scaffold::centered_format();
    let running_format = scaffold::layout(category)
        .formula
        .map(|f| scaffold::running_formula_format(f.fill));

    for (row_idx, row) in sheet.rows().iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            let r = row_idx as u32;
            let c = col_idx as u16;
            if row_idx == 0 {
                if let Some(value) = &cell.value {
                    ws.write_string_with_format(r, c, value.as_text(), &header_format)?;
                }
            } else if row_idx < FIRST_DATA_ROW {
                if let Some(formula) = &cell.formula {
                    match &running_format {
                        Some(format) => {
                            ws.write_formula_with_format(r, c, Formula::new(formula), format)?
                        }
                        None => ws.write_formula(r, c, Formula::new(formula))?,
                    };
                } else if let Some(value) = &cell.value {
                    if row_idx == 2 && col_idx == 0 {
                        ws.write_string_with_format(r, c, value.as_text(), &note_format)?;
                    } else {
                        write_value(ws, r, c, value, None)?;
                    }
                }
            } else if let Some(formula) = &cell.formula {
                ws.write_formula(r, c, Formula::new(formula))?;
            } else if let Some(value) = &cell.value {
                let format = match classes.get(col_idx).copied().flatten() {
                    Some(ValueClass::Currency) => Some(&currency_format),
                    Some(ValueClass::Boolean) => Some(&centered_format),
                    _ => None,
                };
                write_value(ws, r, c, value, format)?;
            }
        }
    }
    scaffold::apply_sheet_chrome(ws, category)
}

fn render_plain_sheet(ws: &mut Worksheet, sheet: &SheetGrid) -> Result<()> {
    for (row_idx, row) in sheet.rows().iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            if let Some(formula) = &cell.formula {
                ws.write_formula(row_idx as u32, col_idx as u16, Formula::new(formula))?;
            } else if let Some(value) = &cell.value {
                write_value(ws, row_idx as u32, col_idx as u16, value, None)?;
            }
        }
    }
    Ok(())
}

/// Writes one typed cell. Empty text is skipped entirely so cleared cells stay blank in
/// the file and read back as blank.
fn write_value(
    ws: &mut Worksheet,
    row: u32,
    col: u16,
    value: &Value,
    format: Option<&Format>,
) -> Result<()> {
    match (value, format) {
        (Value::Text(s), _) if s.is_empty() => {}
        (Value::Text(s), Some(f)) => {
            ws.write_string_with_format(row, col, s, f)?;
        }
        (Value::Text(s), None) => {
            ws.write_string(row, col, s)?;
        }
        (Value::Number(n), Some(f)) => {
            ws.write_number_with_format(row, col, *n, f)?;
        }
        (Value::Number(n), None) => {
            ws.write_number(row, col, *n)?;
        }
        (Value::Bool(b), Some(f)) => {
            ws.write_boolean_with_format(row, col, *b, f)?;
        }
        (Value::Bool(b), None) => {
            ws.write_boolean(row, col, *b)?;
        }
    }
    Ok(())
}
