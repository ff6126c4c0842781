//! Reading and rewriting the `financeData` literal embedded in the dashboard page.
//!
//! The literal is located by a fixed prefix and terminated at the first `};` after it.
//! Reader and writer share that one rule, so a page the writer produced is always
//! re-readable and a second write is byte-identical. The rule breaks only when a text
//! value itself contains `};`, which is an accepted restriction on the page format.

use crate::model::{coerce, Category, Dataset, FieldMap, Record, Warning};
use crate::Result;
use anyhow::{bail, Context};
use std::ops::Range;

pub(crate) const LITERAL_PREFIX: &str = "let financeData = ";

/// Locates the literal: from the start of the prefix through the terminating `};`.
pub(crate) fn literal_span(page: &str) -> Result<Range<usize>> {
    let Some(start) = page.find(LITERAL_PREFIX) else {
        bail!("The page has no '{}' assignment", LITERAL_PREFIX.trim_end());
    };
    let body = start + LITERAL_PREFIX.len();
    let Some(close) = page[body..].find("};") else {
        bail!("The financeData assignment is never closed with '}};'");
    };
    Ok(start..body + close + 2)
}

/// Parses the page's literal into a Dataset. Values of mapped attributes are coerced per
/// their class, with a warning for every numeric fallback; unmapped attributes pass
/// through untouched (the tabular writer decides their fate).
pub(crate) fn extract(page: &str) -> Result<(Dataset, Vec<Warning>)> {
    let span = literal_span(page)?;
    let json = &page[span.start + LITERAL_PREFIX.len()..span.end - 1];
    let raw: Dataset = serde_json::from_str(json.trim())
        .context("Unable to parse the financeData literal as JSON")?;
    Ok(canonicalize(&raw))
}

/// Renders the full assignment text for a dataset.
pub(crate) fn render_literal(dataset: &Dataset) -> Result<String> {
    let json = serde_json::to_string_pretty(dataset)
        .context("Unable to serialize the dataset as JSON")?;
    Ok(format!("{LITERAL_PREFIX}{json};"))
}

/// Produces new page text with the literal replaced by the dataset. Everything outside
/// the literal span is byte-identical; a page without the literal is an error, never a
/// silent no-op.
pub(crate) fn replace(page: &str, dataset: &Dataset) -> Result<String> {
    let span = literal_span(page)?;
    let mut out = String::with_capacity(page.len());
    out.push_str(&page[..span.start]);
    out.push_str(&render_literal(dataset)?);
    out.push_str(&page[span.end..]);
    Ok(out)
}

fn canonicalize(raw: &Dataset) -> (Dataset, Vec<Warning>) {
    let mut dataset = Dataset::new();
    let mut warnings = Vec::new();
    for category in Category::ALL {
        let field_map = FieldMap::of(category);
        let mut records = Vec::with_capacity(raw.records(category).len());
        for record in raw.records(category) {
            let mut canonical = Record::new();
            for (attr, value) in record.iter() {
                match field_map.by_attr(attr) {
                    Some(field) => {
                        let (value, fallback) = coerce(field.class(), Some(value));
                        if let Some(raw_text) = fallback {
                            warnings.push(Warning::CoercionFallback {
                                category,
                                attr: attr.clone(),
                                raw: raw_text,
                            });
                        }
                        canonical.set(attr.clone(), value);
                    }
                    None => canonical.set(attr.clone(), value.clone()),
                }
            }
            records.push(canonical);
        }
        dataset.set_records(category, records);
    }
    (dataset, warnings)
}

/// The page written by `init`: a static dashboard shell whose embedded literal starts
/// empty and whose buttons drive the HTTP API. The literal below is byte-for-byte what
/// [`replace`] renders for an empty dataset, so the very first rewrite is a no-op.
pub(crate) const STARTER_PAGE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Family Finance Dashboard</title>
<style>
body { font-family: -apple-system, "Segoe UI", Roboto, sans-serif; margin: 2rem; background: #f5f6fa; color: #222; }
h1 { color: #4472c4; margin-top: 0; }
.toolbar { margin-bottom: 1.5rem; }
.toolbar button { background: #4472c4; color: #fff; border: 0; border-radius: 4px; padding: 0.5rem 1rem; margin-right: 0.5rem; cursor: pointer; font-size: 0.9rem; }
.toolbar button:hover { background: #365a9d; }
#status { margin-left: 0.5rem; color: #4472c4; font-size: 0.9rem; }
section { background: #fff; border-radius: 6px; padding: 1rem 1.5rem; margin-bottom: 1.5rem; box-shadow: 0 1px 3px rgba(0, 0, 0, 0.1); }
h2 { font-size: 1.05rem; margin: 0 0 0.75rem; }
h2 .count { color: #888; font-weight: normal; font-size: 0.85rem; }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid #d0d4dc; padding: 0.4rem 0.6rem; font-size: 0.85rem; text-align: left; }
th { background: #4472c4; color: #fff; font-weight: 600; }
tr:nth-child(even) td { background: #f7f9fc; }
</style>
</head>
<body>
<h1>Family Finance Overview</h1>
<div class="toolbar">
<button onclick="refreshData()">Refresh</button>
<button onclick="saveData()">Save</button>
<button onclick="loadFromWorkbook()">Load from workbook</button>
<button onclick="sendToWorkbook()">Send to workbook</button>
<span id="status"></span>
</div>
<div id="sections"></div>
<script>
let financeData = {
  "deposit": [],
  "loan": [],
  "tax": [],
  "tfsa": [],
  "education": [],
  "expense": []
};

const SECTIONS = [
  { key: "deposit", title: "Account Deposits", columns: [["date", "Date"], ["source", "Source"], ["bank", "Bank"], ["amount", "Amount"], ["hasDocument", "Document"], ["note", "Note"]] },
  { key: "loan", title: "Loan Repayments", columns: [["type", "Type"], ["date", "Date"], ["amount", "Amount"], ["loanType", "Loan"], ["period", "Period"], ["interest", "Interest"], ["principal", "Principal"], ["note", "Note"]] },
  { key: "tax", title: "Tax Filings", columns: [["year", "Year"], ["date", "Filed"], ["income", "Income"], ["taxableIncome", "Taxable"], ["taxAmount", "Assessed"], ["paidAmount", "Paid"], ["diff", "Balance"], ["status", "Status"], ["attachment", "Attachment"]] },
  { key: "tfsa", title: "TFSA Accounts", columns: [["accountName", "Account"], ["bank", "Bank"], ["accountType", "Type"], ["balance", "Balance"], ["annualReturn", "Return"], ["annualWithdrawal", "Withdrawals"], ["remaining", "Room"], ["openDate", "Opened"], ["status", "Status"]] },
  { key: "education", title: "Education Accounts", columns: [["studentName", "Student"], ["accountName", "Account"], ["bank", "Bank"], ["balance", "Balance"], ["annualDeposit", "Deposits"], ["annualWithdrawal", "Withdrawals"], ["educationStage", "Stage"], ["openDate", "Opened"], ["note", "Note"]] },
  { key: "expense", title: "Income &amp; Expenses", columns: [["date", "Date"], ["type", "Type"], ["category", "Category"], ["amount", "Amount"], ["account", "Account"], ["counterparty", "Counterparty"], ["description", "Description"], ["attachment", "Attachment"], ["isInstallment", "Installment"], ["installments", "Count"]] }
];

function formatCell(value) {
  if (value === undefined || value === null) return "";
  if (typeof value === "boolean") return value ? "yes" : "no";
  if (typeof value === "number") return value.toLocaleString();
  return String(value);
}

function renderAll() {
  const root = document.getElementById("sections");
  root.innerHTML = "";
  for (const section of SECTIONS) {
    const records = financeData[section.key] || [];
    const el = document.createElement("section");
    const head = section.columns.map(c => "<th>" + c[1] + "</th>").join("");
    const rows = records.map(r =>
      "<tr>" + section.columns.map(c => "<td>" + formatCell(r[c[0]]) + "</td>").join("") + "</tr>"
    ).join("");
    el.innerHTML = "<h2>" + section.title + " <span class=\"count\">(" + records.length + ")</span></h2>"
      + "<table><thead><tr>" + head + "</tr></thead><tbody>" + rows + "</tbody></table>";
    root.appendChild(el);
  }
}

let statusTimer = null;
function note(text) {
  const el = document.getElementById("status");
  el.textContent = text;
  clearTimeout(statusTimer);
  statusTimer = setTimeout(() => { el.textContent = ""; }, 4000);
}

async function call(path, options) {
  try {
    const res = await fetch(path, options);
    return await res.json();
  } catch (err) {
    note("Request failed: " + err.message);
    return null;
  }
}

async function refreshData() {
  const body = await call("/api/data");
  if (body === null) return;
  if (body.success) { financeData = body.data; renderAll(); note("Refreshed"); }
  else note(body.error);
}

async function saveData() {
  const body = await call("/api/save", {
    method: "POST",
    headers: { "Content-Type": "application/json" },
    body: JSON.stringify(financeData)
  });
  if (body === null) return;
  note(body.success ? body.message : body.error);
}

async function loadFromWorkbook() {
  const body = await call("/api/export", { method: "POST" });
  if (body === null) return;
  if (body.success) { note(body.message); refreshData(); }
  else note(body.error);
}

async function sendToWorkbook() {
  const body = await call("/api/import", { method: "POST" });
  if (body === null) return;
  note(body.success ? body.message : body.error);
}

renderAll();
</script>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;

    fn one_deposit() -> Dataset {
        let mut dataset = Dataset::new();
        let record: Record = [
            ("date", Value::text("2024-01-05")),
            ("source", Value::text("salary")),
            ("bank", Value::text("X")),
            ("amount", Value::Number(5000.0)),
            ("hasDocument", Value::Bool(true)),
            ("note", Value::text("")),
        ]
        .into_iter()
        .collect();
        dataset.push(Category::Deposit, record);
        dataset
    }

    #[test]
    fn test_extract_empty_literal() {
        let page = "<script>\nlet financeData = {\"deposit\":[],\"loan\":[],\"tax\":[],\"tfsa\":[],\"education\":[],\"expense\":[]};\n</script>";
        let (dataset, warnings) = extract(page).unwrap();
        assert!(dataset.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_replace_touches_only_the_literal_span() {
        let page = "<html><script>\nlet financeData = {\"deposit\":[]};\nconsole.log(\"after\");\n</script></html>";
        let replaced = replace(page, &one_deposit()).unwrap();
        assert!(replaced.starts_with("<html><script>\nlet financeData = {"));
        assert!(replaced.ends_with("};\nconsole.log(\"after\");\n</script></html>"));
        assert!(replaced.contains("\"date\": \"2024-01-05\""));
        assert!(replaced.contains("\"amount\": 5000"));
    }

    #[test]
    fn test_replace_then_extract_round_trips() {
        let replaced = replace(STARTER_PAGE, &one_deposit()).unwrap();
        let (dataset, warnings) = extract(&replaced).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(dataset.records(Category::Deposit), one_deposit().records(Category::Deposit));
        assert_eq!(dataset.counts()[&Category::Deposit], 1);
    }

    #[test]
    fn test_replace_is_idempotent() {
        let first = replace(STARTER_PAGE, &one_deposit()).unwrap();
        let second = replace(&first, &one_deposit()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_starter_page_literal_is_canonical() {
        // The baked-in empty literal must match what the writer would produce, so that
        // the first sync against a fresh page leaves everything but the data untouched.
        assert_eq!(replace(STARTER_PAGE, &Dataset::new()).unwrap(), STARTER_PAGE);
    }

    #[test]
    fn test_second_literal_is_left_alone() {
        let page = "let financeData = {\"deposit\":[]};\nlet financeData = {\"loan\":[]};";
        let replaced = replace(page, &Dataset::new()).unwrap();
        assert!(replaced.ends_with("let financeData = {\"loan\":[]};"));
        let span = literal_span(&replaced).unwrap();
        assert_eq!(span.start, 0);
    }

    #[test]
    fn test_missing_literal_is_an_error() {
        assert!(extract("<html>no data here</html>").is_err());
        assert!(replace("<html>no data here</html>", &Dataset::new()).is_err());
    }

    #[test]
    fn test_unterminated_literal_is_an_error() {
        assert!(extract("let financeData = { \"deposit\": [] ").is_err());
    }

    #[test]
    fn test_malformed_literal_is_an_error() {
        assert!(extract("let financeData = {not json};").is_err());
    }

    #[test]
    fn test_extract_coerces_mapped_values() {
        let page = "let financeData = {\"deposit\":[{\"date\":\"2024-01-05\",\"amount\":\"abc\",\"hasDocument\":\"\",\"extra\":\"kept\"}]};";
        let (dataset, warnings) = extract(page).unwrap();
        let records = dataset.records(Category::Deposit);
        assert_eq!(records[0].get("amount"), Some(&Value::Number(0.0)));
        assert_eq!(records[0].get("hasDocument"), Some(&Value::Bool(false)));
        assert_eq!(records[0].get("extra"), Some(&Value::text("kept")));
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            &warnings[0],
            Warning::CoercionFallback { category: Category::Deposit, attr, raw }
                if attr == "amount" && raw == "abc"
        ));
    }

    #[test]
    fn test_closing_brace_inside_a_value_is_fine() {
        // A lone '}' in text does not terminate the literal; only '};' does.
        let mut dataset = Dataset::new();
        let record: Record = [("note", Value::text("a } b"))].into_iter().collect();
        dataset.push(Category::Deposit, record.clone());
        let page = replace(STARTER_PAGE, &dataset).unwrap();
        let (back, _) = extract(&page).unwrap();
        assert_eq!(back.records(Category::Deposit)[0].get("note"), record.get("note"));
    }
}
