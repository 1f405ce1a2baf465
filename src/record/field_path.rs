//! Declarative paths into nested records.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AffinityError, Result};

/// Maximum number of segments a field path may have.
pub const MAX_PATH_DEPTH: usize = 64;

/// Logical field name mapped to the path that locates it.
///
/// A `BTreeMap` keeps extraction order stable across runs.
pub type FieldPaths = BTreeMap<String, FieldPath>;

/// An ordered sequence of object keys locating a value inside a record.
///
/// Paths are written in configuration either as an array of keys or as a
/// dotted string:
///
/// ```
/// use affinity::record::FieldPath;
///
/// let from_array: FieldPath = serde_json::from_str(r#"["payload", "app"]"#).unwrap();
/// let from_dotted: FieldPath = serde_json::from_str(r#""payload.app""#).unwrap();
/// assert_eq!(from_array, from_dotted);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawFieldPath", into = "Vec<String>")]
pub struct FieldPath {
    segments: Vec<String>,
}

/// Accepted configuration spellings of a path.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawFieldPath {
    Dotted(String),
    Segments(Vec<String>),
}

impl FieldPath {
    /// Create a path from its key segments.
    pub fn new<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();

        if segments.is_empty() {
            return Err(AffinityError::invalid_config("field path must not be empty"));
        }
        if segments.len() > MAX_PATH_DEPTH {
            return Err(AffinityError::invalid_config(format!(
                "field path has {} segments, maximum is {MAX_PATH_DEPTH}",
                segments.len()
            )));
        }
        if segments.iter().any(|s| s.is_empty()) {
            return Err(AffinityError::invalid_config(format!(
                "field path '{}' contains an empty segment",
                segments.join(".")
            )));
        }

        Ok(FieldPath { segments })
    }

    /// Parse a dotted path such as `payload.app.name`.
    pub fn parse(dotted: &str) -> Result<Self> {
        Self::new(dotted.split('.'))
    }

    /// The key segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Paths are never empty; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl TryFrom<RawFieldPath> for FieldPath {
    type Error = AffinityError;

    fn try_from(raw: RawFieldPath) -> Result<Self> {
        match raw {
            RawFieldPath::Dotted(dotted) => FieldPath::parse(&dotted),
            RawFieldPath::Segments(segments) => FieldPath::new(segments),
        }
    }
}

impl From<FieldPath> for Vec<String> {
    fn from(path: FieldPath) -> Self {
        path.segments
    }
}
