use crate::model::Category;
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// A recoverable problem observed during a sync. Warnings never abort an operation; they are
/// collected and returned with the sync report so lossy outcomes stay visible.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// A category's sheet is absent from the workbook; the category reads as empty.
    SheetMissing { category: Category },
    /// A currency field held non-numeric text and was defaulted to zero.
    CoercionFallback {
        category: Category,
        attr: String,
        raw: String,
    },
    /// A record attribute had no matching workbook column and was dropped on write.
    UnmappedAttribute { category: Category, attr: String },
    /// The pre-write backup could not be taken and the sync continued without one.
    BackupFailure { message: String },
}

impl Display for Warning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::SheetMissing { category } => {
                write!(
                    f,
                    "sheet '{}' is missing from the workbook, {category} has no records",
                    category.sheet_title()
                )
            }
            Warning::CoercionFallback {
                category,
                attr,
                raw,
            } => {
                write!(f, "{category}.{attr}: '{raw}' is not a number, using 0")
            }
            Warning::UnmappedAttribute { category, attr } => {
                write!(f, "{category}.{attr}: no matching column, value dropped")
            }
            Warning::BackupFailure { message } => write!(f, "backup failed: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_display() {
        let warning = Warning::CoercionFallback {
            category: Category::Deposit,
            attr: "amount".to_string(),
            raw: "abc".to_string(),
        };
        assert_eq!(
            warning.to_string(),
            "deposit.amount: 'abc' is not a number, using 0"
        );
    }

    #[test]
    fn test_warning_serialize_tagged() {
        let warning = Warning::SheetMissing {
            category: Category::Tfsa,
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["kind"], "sheet_missing");
        assert_eq!(json["category"], "tfsa");
    }
}
