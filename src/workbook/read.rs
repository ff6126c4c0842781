//! Extracts category records from a loaded workbook.

use crate::model::{coerce, Category, Dataset, FieldMap, Record, Warning};
use crate::workbook::{Book, Cell, SheetGrid, FIRST_DATA_ROW};

/// Reads every category sheet of the workbook into a dataset. A missing sheet is not an
/// error: the category comes back empty and a warning records the gap.
pub(crate) fn read_dataset(book: &Book) -> (Dataset, Vec<Warning>) {
    let mut dataset = Dataset::new();
    let mut warnings = Vec::new();
    for category in Category::ALL {
        match book.sheet(category.sheet_title()) {
            None => warnings.push(Warning::SheetMissing { category }),
            Some(sheet) => {
                let records = read_sheet(category, sheet, &mut warnings);
                dataset.set_records(category, records);
            }
        }
    }
    (dataset, warnings)
}

/// Reads the data region of one sheet. Columns are matched by the labels actually present
/// in the header row, so a reordered sheet still reads correctly; unmapped columns are
/// ignored. Rows where every cell is blank are skipped without disturbing row order.
fn read_sheet(category: Category, sheet: &SheetGrid, warnings: &mut Vec<Warning>) -> Vec<Record> {
    let field_map = FieldMap::of(category);
    let headers = sheet.header_labels();
    let mut records = Vec::new();
    for row in sheet.rows().iter().skip(FIRST_DATA_ROW) {
        if row.iter().all(Cell::is_blank) {
            continue;
        }
        let mut record = Record::new();
        for (col, label) in headers.iter().enumerate() {
            let Some(field) = field_map.by_label(label) else {
                continue;
            };
            let raw = row.get(col).and_then(|cell| cell.value.as_ref());
            let (value, fallback) = coerce(field.class(), raw);
            if let Some(raw_text) = fallback {
                warnings.push(Warning::CoercionFallback {
                    category,
                    attr: field.attr().to_string(),
                    raw: raw_text,
                });
            }
            record.set(field.attr(), value);
        }
        records.push(record);
    }
    records
}
