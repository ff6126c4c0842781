//! The per-category field maps relating workbook column labels to the canonical attribute
//! names used by the dashboard's `financeData` object.
//!
//! Each map is a bijection: every mapped column label corresponds to exactly one attribute
//! and vice versa. Workbook columns that are not in the map (for example the cumulative
//! formula columns) are ignored by sync.

use crate::model::Category;
use serde::{Deserialize, Serialize};

/// How values of a field are coerced on read and styled on write.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueClass {
    /// Passed through as text, empty cells become the empty string.
    #[default]
    Text,
    /// Parsed as a floating point number, `0.0` on empty or unparseable input.
    Currency,
    /// False on empty, zero or `"0"`, true otherwise.
    Boolean,
}

serde_plain::derive_display_from_serialize!(ValueClass);
serde_plain::derive_fromstr_from_deserialize!(ValueClass);

/// One field of a category: a workbook column label, its canonical attribute name, and its
/// value class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    label: &'static str,
    attr: &'static str,
    class: ValueClass,
}

impl FieldSpec {
    const fn new(label: &'static str, attr: &'static str, class: ValueClass) -> Self {
        Self { label, attr, class }
    }

    /// The column label as it appears in the sheet's header row.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// The canonical attribute name used in the dataset.
    pub fn attr(&self) -> &'static str {
        self.attr
    }

    pub fn class(&self) -> ValueClass {
        self.class
    }
}

const DEPOSIT_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("Deposit Date", "date", ValueClass::Text),
    FieldSpec::new("Funding Source", "source", ValueClass::Text),
    FieldSpec::new("Deposit Bank", "bank", ValueClass::Text),
    FieldSpec::new("Amount", "amount", ValueClass::Currency),
    FieldSpec::new("Has Supporting Document", "hasDocument", ValueClass::Boolean),
    FieldSpec::new("Notes", "note", ValueClass::Text),
];

const LOAN_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("Repayment Type", "type", ValueClass::Text),
    FieldSpec::new("Repayment Date", "date", ValueClass::Text),
    FieldSpec::new("Repayment Amount", "amount", ValueClass::Currency),
    FieldSpec::new("Loan Type", "loanType", ValueClass::Text),
    FieldSpec::new("Installment Period", "period", ValueClass::Text),
    FieldSpec::new("Monthly Interest", "interest", ValueClass::Text),
    FieldSpec::new("Monthly Principal", "principal", ValueClass::Text),
    FieldSpec::new("Notes", "note", ValueClass::Text),
];

const TAX_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("Tax Year", "year", ValueClass::Text),
    FieldSpec::new("Filing Date", "date", ValueClass::Text),
    FieldSpec::new("Reported Income", "income", ValueClass::Currency),
    FieldSpec::new("Taxable Income", "taxableIncome", ValueClass::Text),
    FieldSpec::new("Tax Assessed", "taxAmount", ValueClass::Currency),
    FieldSpec::new("Tax Paid", "paidAmount", ValueClass::Currency),
    FieldSpec::new("Balance Due", "diff", ValueClass::Text),
    FieldSpec::new("Filing Status", "status", ValueClass::Text),
    FieldSpec::new("Attachment", "attachment", ValueClass::Text),
];

const TFSA_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("Account Name", "accountName", ValueClass::Text),
    FieldSpec::new("Bank", "bank", ValueClass::Text),
    FieldSpec::new("Account Type", "accountType", ValueClass::Text),
    FieldSpec::new("Account Balance", "balance", ValueClass::Currency),
    FieldSpec::new("Annual Return", "annualReturn", ValueClass::Currency),
    FieldSpec::new("Annual Withdrawal", "annualWithdrawal", ValueClass::Currency),
    FieldSpec::new("Contribution Room", "remaining", ValueClass::Text),
    FieldSpec::new("Open Date", "openDate", ValueClass::Text),
    FieldSpec::new("Status", "status", ValueClass::Text),
];

const EDUCATION_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("Student Name", "studentName", ValueClass::Text),
    FieldSpec::new("Account Name", "accountName", ValueClass::Text),
    FieldSpec::new("Bank", "bank", ValueClass::Text),
    FieldSpec::new("Account Balance", "balance", ValueClass::Currency),
    FieldSpec::new("Annual Deposit", "annualDeposit", ValueClass::Currency),
    FieldSpec::new("Annual Withdrawal", "annualWithdrawal", ValueClass::Currency),
    FieldSpec::new("Education Stage", "educationStage", ValueClass::Text),
    FieldSpec::new("Open Date", "openDate", ValueClass::Text),
    FieldSpec::new("Notes", "note", ValueClass::Text),
];

const EXPENSE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("Transaction Date", "date", ValueClass::Text),
    FieldSpec::new("Transaction Type", "type", ValueClass::Text),
    FieldSpec::new("Category", "category", ValueClass::Text),
    FieldSpec::new("Amount", "amount", ValueClass::Currency),
    FieldSpec::new("Account", "account", ValueClass::Text),
    FieldSpec::new("Counterparty", "counterparty", ValueClass::Text),
    FieldSpec::new("Description", "description", ValueClass::Text),
    FieldSpec::new("Attachment", "attachment", ValueClass::Text),
    FieldSpec::new("Is Installment", "isInstallment", ValueClass::Boolean),
    FieldSpec::new("Installments", "installments", ValueClass::Text),
];

/// The field map of one category. Lookup is linear; the largest map has ten fields.
#[derive(Debug, Clone, Copy)]
pub struct FieldMap {
    fields: &'static [FieldSpec],
}

impl FieldMap {
    pub fn of(category: Category) -> Self {
        let fields = match category {
            Category::Deposit => DEPOSIT_FIELDS,
            Category::Loan => LOAN_FIELDS,
            Category::Tax => TAX_FIELDS,
            Category::Tfsa => TFSA_FIELDS,
            Category::Education => EDUCATION_FIELDS,
            Category::Expense => EXPENSE_FIELDS,
        };
        Self { fields }
    }

    /// The fields in column order.
    pub fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    /// Looks up a field by its workbook column label.
    pub fn by_label(&self, label: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.label == label)
    }

    /// Looks up a field by its canonical attribute name.
    pub fn by_attr(&self, attr: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.attr == attr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Every category's map must be a bijection: unique labels, unique attributes, and
    /// round-trip lookups in both directions.
    #[test]
    fn test_field_maps_are_bijective() {
        for category in Category::ALL {
            let map = FieldMap::of(category);
            let labels: HashSet<&str> = map.fields().iter().map(|f| f.label()).collect();
            let attrs: HashSet<&str> = map.fields().iter().map(|f| f.attr()).collect();
            assert_eq!(labels.len(), map.fields().len(), "{category}: duplicate label");
            assert_eq!(attrs.len(), map.fields().len(), "{category}: duplicate attr");
            for field in map.fields() {
                assert_eq!(map.by_label(field.label()).unwrap().attr(), field.attr());
                assert_eq!(map.by_attr(field.attr()).unwrap().label(), field.label());
            }
        }
    }

    #[test]
    fn test_deposit_fields() {
        let map = FieldMap::of(Category::Deposit);
        let attrs: Vec<&str> = map.fields().iter().map(|f| f.attr()).collect();
        assert_eq!(
            attrs,
            vec!["date", "source", "bank", "amount", "hasDocument", "note"]
        );
        assert_eq!(map.by_attr("amount").unwrap().class(), ValueClass::Currency);
        assert_eq!(
            map.by_attr("hasDocument").unwrap().class(),
            ValueClass::Boolean
        );
        assert_eq!(map.by_attr("date").unwrap().class(), ValueClass::Text);
    }

    #[test]
    fn test_currency_fields_per_category() {
        let currency_count = |category: Category| {
            FieldMap::of(category)
                .fields()
                .iter()
                .filter(|f| f.class() == ValueClass::Currency)
                .count()
        };
        assert_eq!(currency_count(Category::Deposit), 1);
        assert_eq!(currency_count(Category::Loan), 1);
        assert_eq!(currency_count(Category::Tax), 3);
        assert_eq!(currency_count(Category::Tfsa), 3);
        assert_eq!(currency_count(Category::Education), 3);
        assert_eq!(currency_count(Category::Expense), 1);
    }

    #[test]
    fn test_boolean_fields() {
        assert_eq!(
            FieldMap::of(Category::Deposit)
                .by_label("Has Supporting Document")
                .unwrap()
                .attr(),
            "hasDocument"
        );
        assert_eq!(
            FieldMap::of(Category::Expense)
                .by_label("Is Installment")
                .unwrap()
                .attr(),
            "isInstallment"
        );
    }

    #[test]
    fn test_unmapped_label() {
        assert!(FieldMap::of(Category::Deposit)
            .by_label("Cumulative Deposits")
            .is_none());
    }
}
