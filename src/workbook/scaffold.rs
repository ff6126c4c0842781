//! The workbook template: sheet layouts, cell formats and the one-shot scaffolder used by
//! `init`. The writer reuses the formats and layouts here when it re-renders a workbook.

use crate::model::{Category, FieldMap};
use crate::Result;
use anyhow::Context;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Formula, Url, Workbook, Worksheet};
use std::path::Path;

pub(crate) const DASHBOARD_TITLE: &str = "Dashboard";
pub(crate) const NOTE_TEXT: &str = "Enter records starting at row 4";

const HEADER_FILL: u32 = 0x4472C4;
const RUNNING_FILL: u32 = 0xE7E6E6;
const TAX_FILL: u32 = 0xFFF2CC;
const GROUP_FILL: u32 = 0xD9E1F2;
const NOTE_COLOR: u32 = 0x666666;

/// A running-total (or balance) formula seeded into row 2 of a category sheet. Users copy
/// it down; sync leaves the row alone.
pub(crate) struct RunningFormula {
    pub(crate) col: u16,
    pub(crate) text: &'static str,
    pub(crate) fill: u32,
}

/// Per-category sheet layout: extra columns that exist only in the workbook, column
/// widths, and the optional seeded formula.
pub(crate) struct SheetLayout {
    pub(crate) extra_labels: &'static [&'static str],
    pub(crate) widths: &'static [f64],
    pub(crate) formula: Option<RunningFormula>,
}

pub(crate) fn layout(category: Category) -> SheetLayout {
    match category {
        Category::Deposit => SheetLayout {
            extra_labels: &["Cumulative Deposits"],
            widths: &[18.0, 20.0, 18.0, 15.0, 18.0, 25.0, 15.0],
            formula: Some(RunningFormula {
                col: 6,
                text: "IF(D2=\"\",0,D2) + IF(ROW()>2,G1,0)",
                fill: RUNNING_FILL,
            }),
        },
        Category::Loan => SheetLayout {
            extra_labels: &["Cumulative Repayments"],
            widths: &[12.0, 15.0, 15.0, 15.0, 10.0, 15.0, 15.0, 25.0, 15.0],
            formula: Some(RunningFormula {
                col: 8,
                text: "IF(C2=\"\",0,C2) + IF(ROW()>2,I1,0)",
                fill: RUNNING_FILL,
            }),
        },
        Category::Tax => SheetLayout {
            extra_labels: &[],
            widths: &[12.0, 15.0, 15.0, 18.0, 15.0, 15.0, 15.0, 12.0, 18.0],
            formula: Some(RunningFormula {
                col: 6,
                text: "IF(E2=\"\",0,E2) - IF(F2=\"\",0,F2)",
                fill: TAX_FILL,
            }),
        },
        Category::Tfsa => SheetLayout {
            extra_labels: &[],
            widths: &[20.0, 18.0, 15.0, 15.0, 18.0, 15.0, 15.0, 15.0, 12.0],
            formula: Some(RunningFormula {
                col: 6,
                text: "D2",
                fill: RUNNING_FILL,
            }),
        },
        Category::Education => SheetLayout {
            extra_labels: &[],
            widths: &[15.0, 20.0, 18.0, 15.0, 15.0, 15.0, 12.0, 15.0, 25.0],
            formula: None,
        },
        Category::Expense => SheetLayout {
            extra_labels: &[],
            widths: &[15.0, 12.0, 15.0, 15.0, 18.0, 20.0, 25.0, 15.0, 12.0, 10.0],
            formula: None,
        },
    }
}

/// Header-row labels of a freshly scaffolded sheet: the mapped columns followed by the
/// workbook-only extras.
pub(crate) fn column_labels(category: Category) -> Vec<&'static str> {
    let mut labels: Vec<&'static str> = FieldMap::of(category)
        .fields()
        .iter()
        .map(|f| f.label())
        .collect();
    labels.extend(layout(category).extra_labels);
    labels
}

pub(crate) fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_font_size(12)
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
}

pub(crate) fn running_formula_format(fill: u32) -> Format {
    Format::new()
        .set_font_size(10)
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center)
        .set_background_color(Color::RGB(fill))
}

pub(crate) fn note_format() -> Format {
    Format::new()
        .set_font_size(9)
        .set_italic()
        .set_font_color(Color::RGB(NOTE_COLOR))
}

pub(crate) fn currency_format() -> Format {
    Format::new().set_num_format("#,##0.00")
}

pub(crate) fn centered_format() -> Format {
    Format::new().set_align(FormatAlign::Center)
}

/// Applies the non-content parts of a category sheet: column widths, the note row height
/// and the frozen header row.
pub(crate) fn apply_sheet_chrome(ws: &mut Worksheet, category: Category) -> Result<()> {
    for (col, width) in layout(category).widths.iter().enumerate() {
        ws.set_column_width(col as u16, *width)?;
    }
    ws.set_row_height(2, 30)?;
    ws.set_freeze_panes(1, 0)?;
    Ok(())
}

/// Renders the three scaffold rows of a fresh category sheet.
fn render_category_scaffold(ws: &mut Worksheet, category: Category) -> Result<()> {
    let header = header_format();
    for (col, label) in column_labels(category).iter().enumerate() {
        ws.write_string_with_format(0, col as u16, *label, &header)?;
    }
    if let Some(formula) = layout(category).formula {
        ws.write_formula_with_format(
            1,
            formula.col,
            Formula::new(formula.text),
            &running_formula_format(formula.fill),
        )?;
    }
    ws.write_string_with_format(2, 0, NOTE_TEXT, &note_format())?;
    apply_sheet_chrome(ws, category)
}

/// Renders the dashboard sheet: one jump-link row per category plus a block of summary
/// metrics, all formula-driven so the workbook recalculates them itself.
pub(crate) fn render_dashboard(ws: &mut Worksheet) -> Result<()> {
    let title_format = Format::new()
        .set_bold()
        .set_font_size(16)
        .set_font_color(Color::RGB(HEADER_FILL))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);
    ws.merge_range(0, 0, 0, 2, "Family Finance Overview", &title_format)?;

    let group_format = Format::new()
        .set_bold()
        .set_font_size(11)
        .set_background_color(Color::RGB(GROUP_FILL))
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);
    let link_format = Format::new()
        .set_font_size(10)
        .set_font_color(Color::RGB(HEADER_FILL))
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);
    let count_format = Format::new()
        .set_font_size(10)
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);

    let groups = [
        ("Inflows", Category::Deposit),
        ("Liabilities", Category::Loan),
        ("Taxes", Category::Tax),
        ("Tax-Free Savings", Category::Tfsa),
        ("Education Fund", Category::Education),
        ("Cash Flow", Category::Expense),
    ];
    let mut row = 2;
    for (group, category) in groups {
        let title = category.sheet_title();
        ws.write_string_with_format(row, 0, group, &group_format)?;
        let link = Url::new(format!("internal:'{title}'!A1")).set_text("View details");
        ws.write_url_with_format(row, 1, link, &link_format)?;
        // COUNTA sees the header and note rows, so those two are subtracted off.
        let count = Formula::new(format!("COUNTA('{title}'!A:A)-2"));
        ws.write_formula_with_format(row, 2, count, &count_format)?;
        row += 1;
    }

    row += 2;
    let summary_format = Format::new()
        .set_bold()
        .set_font_size(12)
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);
    ws.merge_range(row, 0, row, 2, "Key Metrics", &summary_format)?;
    row += 1;

    let name_format = Format::new()
        .set_font_size(10)
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Left)
        .set_align(FormatAlign::VerticalCenter);
    let value_format = Format::new()
        .set_bold()
        .set_font_size(10)
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);
    let blank_format = Format::new().set_border(FormatBorder::Thin);

    let metrics = [
        ("Total Deposits", "SUM('Account Deposits'!D:D)"),
        ("Total Loan Repayments", "SUM('Loan Repayments'!C:C)"),
        ("Total Tax Assessed", "SUM('Tax Filings'!E:E)"),
        ("Total Tax Paid", "SUM('Tax Filings'!F:F)"),
        ("TFSA Balance", "SUM('TFSA Accounts'!D:D)"),
        ("Education Balance", "SUM('Education Accounts'!D:D)"),
    ];
    for (name, formula) in metrics {
        ws.write_string_with_format(row, 0, name, &name_format)?;
        ws.write_formula_with_format(row, 1, Formula::new(formula), &value_format)?;
        ws.write_blank(row, 2, &blank_format)?;
        row += 1;
    }

    for r in 0..row {
        ws.set_row_height(r, 25)?;
    }
    ws.set_column_width(0, 25)?;
    ws.set_column_width(1, 20)?;
    ws.set_column_width(2, 25)?;
    Ok(())
}

/// Creates a fresh workbook at `path`: the dashboard first, then one scaffolded sheet per
/// category. Overwrites whatever is at the path.
pub(crate) fn create_workbook(path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let dashboard = workbook.add_worksheet();
    dashboard.set_name(DASHBOARD_TITLE)?;
    render_dashboard(dashboard)?;
    for category in Category::ALL {
        let ws = workbook.add_worksheet();
        ws.set_name(category.sheet_title())?;
        render_category_scaffold(ws, category)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("Unable to write workbook at '{}'", path.display()))
}
