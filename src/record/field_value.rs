//! Scalar values held by flattened records.
//!
//! Extraction never produces nested values: objects and arrays are turned
//! into their canonical JSON text and stored as [`FieldValue::Text`].
//!
//! ```
//! use affinity::record::FieldValue;
//!
//! let value = FieldValue::Integer(42);
//! assert_eq!(value.as_integer(), Some(42));
//! assert_eq!(value.to_key_string(), "42");
//!
//! let text = FieldValue::Text("17".to_string());
//! assert_eq!(text.as_integer(), Some(17));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A scalar field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Text value, also used for serialized nested structures
    Text(String),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// Boolean value
    Boolean(bool),
    /// Null value
    Null,
}

impl FieldValue {
    /// Convert a resolved JSON value into a scalar field value.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Boolean(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FieldValue::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    FieldValue::Float(f)
                } else {
                    // u64 beyond i64::MAX
                    FieldValue::Text(n.to_string())
                }
            }
            Value::String(s) => FieldValue::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => FieldValue::Text(canonical_json(value)),
        }
    }

    /// Convert to text if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret the value as an integer.
    ///
    /// Integers pass through and text holding a base-10 integer is parsed.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            FieldValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// The string form used as an external key.
    pub fn to_key_string(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{s}"),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Boolean(b) => write!(f, "{b}"),
            FieldValue::Null => write!(f, "null"),
        }
    }
}

/// Serialize a JSON value with object keys in sorted order at every level.
///
/// `serde_json::Map` is a `BTreeMap` without the `preserve_order` feature, so
/// compact serialization is already canonical.
pub fn canonical_json(value: &Value) -> String {
    value.to_string()
}
