use serde::{Deserialize, Serialize};

/// The six financial record categories. Each one owns a workbook sheet and a key in the
/// dashboard's `financeData` object.
///
/// The declaration order is the canonical order: it is the order of sheets in a scaffolded
/// workbook and the order of keys in the serialized dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Deposit,
    Loan,
    Tax,
    Tfsa,
    Education,
    Expense,
}

serde_plain::derive_display_from_serialize!(Category);
serde_plain::derive_fromstr_from_deserialize!(Category);

impl Category {
    /// All categories in canonical order.
    pub const ALL: [Category; 6] = [
        Category::Deposit,
        Category::Loan,
        Category::Tax,
        Category::Tfsa,
        Category::Education,
        Category::Expense,
    ];

    /// The title of this category's sheet in the workbook.
    pub fn sheet_title(&self) -> &'static str {
        match self {
            Category::Deposit => "Account Deposits",
            Category::Loan => "Loan Repayments",
            Category::Tax => "Tax Filings",
            Category::Tfsa => "TFSA Accounts",
            Category::Education => "Education Accounts",
            Category::Expense => "Income & Expenses",
        }
    }

    /// The key under which this category appears in the `financeData` object.
    pub fn key(&self) -> &'static str {
        match self {
            Category::Deposit => "deposit",
            Category::Loan => "loan",
            Category::Tax => "tax",
            Category::Tfsa => "tfsa",
            Category::Education => "education",
            Category::Expense => "expense",
        }
    }

    /// Finds the category whose sheet title matches `title`, if any.
    pub fn from_sheet_title(title: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.sheet_title() == title)
    }
}
