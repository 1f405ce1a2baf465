//! Path-based flattening of nested records.

use serde_json::Value;

use crate::error::{AffinityError, Result};
use crate::record::field_path::{FieldPath, FieldPaths};
use crate::record::field_value::FieldValue;
use crate::record::flat_record::FlatRecord;

/// Flattens raw JSON records into [`FlatRecord`]s using a fixed set of paths.
///
/// # Example
///
/// ```
/// use affinity::record::{FieldPath, FieldPaths, FieldValue, PathExtractor};
///
/// let mut paths = FieldPaths::new();
/// paths.insert("user_id".to_string(), FieldPath::parse("user.id").unwrap());
/// paths.insert("app_id".to_string(), FieldPath::parse("app").unwrap());
///
/// let extractor = PathExtractor::new(paths);
/// let record = serde_json::json!({"user": {"id": 5}, "app": "maps"});
/// let flat = extractor.flatten(&record).unwrap();
///
/// assert_eq!(flat.get_field("user_id"), Some(&FieldValue::Integer(5)));
/// assert_eq!(flat.get_field("app_id"), Some(&FieldValue::Text("maps".to_string())));
/// ```
#[derive(Debug, Clone)]
pub struct PathExtractor {
    paths: FieldPaths,
}

impl PathExtractor {
    /// Create an extractor for the given field paths.
    pub fn new(paths: FieldPaths) -> Self {
        PathExtractor { paths }
    }

    /// The configured field paths.
    pub fn paths(&self) -> &FieldPaths {
        &self.paths
    }

    /// Resolve every configured path against `record`.
    ///
    /// Fails with [`AffinityError::MissingField`] on the first path that cannot
    /// be resolved; no partial record is returned.
    pub fn flatten(&self, record: &Value) -> Result<FlatRecord> {
        let mut flat = FlatRecord::new();
        for (field, path) in &self.paths {
            let value = resolve(record, path).map_err(|segment| {
                AffinityError::missing_field(field.as_str(), path.to_string(), segment)
            })?;
            flat.add_field(field.as_str(), FieldValue::from_json(value));
        }
        Ok(flat)
    }

    /// Parse one JSON line and flatten it.
    pub fn flatten_line(&self, line: &str) -> Result<FlatRecord> {
        self.flatten_slice(line.as_bytes())
    }

    /// Parse one undecoded JSON line and flatten it.
    ///
    /// Bytes that are not valid UTF-8 fail as a JSON error, like any other
    /// malformed line.
    pub fn flatten_slice(&self, line: &[u8]) -> Result<FlatRecord> {
        let record: Value = serde_json::from_slice(line)?;
        self.flatten(&record)
    }
}

/// Walk `path` down from `record`, returning the segment that failed.
fn resolve<'a>(record: &'a Value, path: &FieldPath) -> std::result::Result<&'a Value, String> {
    let mut current = record;
    for segment in path.segments() {
        current = match current {
            Value::Object(map) => map.get(segment).ok_or_else(|| segment.clone())?,
            _ => return Err(segment.clone()),
        };
    }
    Ok(current)
}
