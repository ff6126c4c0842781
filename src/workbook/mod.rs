//! Reading, rewriting and scaffolding the xlsx workbook.
//!
//! The workbook is never patched in place: [`Book`] holds the full contents in memory, the
//! reader and writer operate on that grid, and saving re-renders every sheet. Rows 1-3 of a
//! category sheet are scaffolding (header, running-total formula, usage note) and survive a
//! rewrite untouched; data rows start at row 4.

mod book;
mod read;
pub(crate) mod scaffold;
mod write;

pub(crate) use book::{Book, Cell, SheetGrid};
pub(crate) use read::read_dataset;
pub(crate) use write::{save_book, write_dataset};

/// Zero-based index of the first data row (row 4 in spreadsheet terms).
pub(crate) const FIRST_DATA_ROW: usize = 3;

/// Number of scaffold rows preserved at the top of every category sheet.
pub(crate) const SCAFFOLD_ROWS: usize = 3;
