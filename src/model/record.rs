use crate::model::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One financial record: canonical attribute names mapped to scalar values. A record has no
/// identity of its own; its position within its category's sequence is its only identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, attr: &str) -> Option<&Value> {
        self.0.get(attr)
    }

    pub fn set(&mut self, attr: impl Into<String>, value: Value) {
        self.0.insert(attr.into(), value);
    }

    /// Iterates attributes in alphabetical order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (S, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_set_get() {
        let mut record = Record::new();
        record.set("date", Value::text("2024-01-05"));
        record.set("amount", Value::Number(5000.0));
        assert_eq!(record.get("date"), Some(&Value::text("2024-01-05")));
        assert_eq!(record.get("missing"), None);
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn test_record_serde_transparent() {
        let record: Record = [
            ("amount", Value::Number(5000.0)),
            ("source", Value::text("salary")),
        ]
        .into_iter()
        .collect();
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"amount":5000,"source":"salary"}"#);
        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
