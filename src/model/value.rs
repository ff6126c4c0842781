//! The scalar value type stored in records, and the lenient coercion rules that both the
//! workbook reader and the page reader apply to raw input.

use crate::model::ValueClass;
use serde::de::{Error as SerdeError, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::Formatter;

/// A scalar record value: text, number or boolean. Nothing nested.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// The textual form of the value: numbers in their shortest decimal form, booleans as
    /// `true`/`false`.
    pub fn as_text(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
        }
    }

    /// Truthiness: empty text, `"0"` text, numeric zero and `false` are falsy, everything
    /// else is truthy.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Text(s) => truthy_str(s),
            Value::Number(n) => *n != 0.0,
            Value::Bool(b) => *b,
        }
    }

    /// The numeric form of the value, or `None` for non-empty text that does not parse.
    /// Empty text is zero, booleans are one and zero.
    pub fn as_currency(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    Some(0.0)
                } else {
                    trimmed.parse::<f64>().ok()
                }
            }
        }
    }
}

fn truthy_str(s: &str) -> bool {
    let trimmed = s.trim();
    !trimmed.is_empty() && trimmed != "0"
}

/// Coerces one raw value to its field's class. `raw` is `None` for an empty cell or an
/// absent attribute. The second element of the return value is the raw text of a currency
/// value that failed to parse and was defaulted to zero; the caller turns it into a warning.
pub(crate) fn coerce(class: ValueClass, raw: Option<&Value>) -> (Value, Option<String>) {
    match class {
        ValueClass::Boolean => {
            let truthy = raw.map(Value::truthy).unwrap_or(false);
            (Value::Bool(truthy), None)
        }
        ValueClass::Currency => match raw {
            None => (Value::Number(0.0), None),
            Some(v) => match v.as_currency() {
                Some(n) => (Value::Number(n), None),
                None => (Value::Number(0.0), Some(v.as_text())),
            },
        },
        ValueClass::Text => {
            let text = raw.map(Value::as_text).unwrap_or_default();
            (Value::Text(text), None)
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Text(s) => serializer.serialize_str(s),
            // Whole numbers serialize without a fractional part, matching the way the
            // dashboard page writes them.
            Value::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() && n.abs() < 9.0e15 {
                    serializer.serialize_i64(*n as i64)
                } else {
                    serializer.serialize_f64(*n)
                }
            }
            Value::Bool(b) => serializer.serialize_bool(*b),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str("a string, number, boolean or null")
            }

            fn visit_bool<E: SerdeError>(self, v: bool) -> Result<Value, E> {
                Ok(Value::Bool(v))
            }

            fn visit_i64<E: SerdeError>(self, v: i64) -> Result<Value, E> {
                Ok(Value::Number(v as f64))
            }

            fn visit_u64<E: SerdeError>(self, v: u64) -> Result<Value, E> {
                Ok(Value::Number(v as f64))
            }

            fn visit_f64<E: SerdeError>(self, v: f64) -> Result<Value, E> {
                Ok(Value::Number(v))
            }

            fn visit_str<E: SerdeError>(self, v: &str) -> Result<Value, E> {
                Ok(Value::Text(v.to_string()))
            }

            fn visit_string<E: SerdeError>(self, v: String) -> Result<Value, E> {
                Ok(Value::Text(v))
            }

            fn visit_unit<E: SerdeError>(self) -> Result<Value, E> {
                Ok(Value::Text(String::new()))
            }

            fn visit_none<E: SerdeError>(self) -> Result<Value, E> {
                Ok(Value::Text(String::new()))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}
