//! Event records and field extraction.
//!
//! Raw input lines are JSON documents of arbitrary shape. A configured set of
//! [`FieldPath`]s picks the logical fields out of each document and the
//! [`PathExtractor`] flattens them into a [`FlatRecord`] of scalar values.

pub mod extractor;
pub mod field_path;
pub mod field_value;
pub mod flat_record;
pub mod jsonl;

pub use extractor::PathExtractor;
pub use field_path::{FieldPath, FieldPaths, MAX_PATH_DEPTH};
pub use field_value::FieldValue;
pub use flat_record::FlatRecord;
pub use jsonl::JsonlLines;

/// Logical field holding the external user key.
pub const USER_ID_FIELD: &str = "user_id";

/// Logical field holding the external item key.
pub const APP_ID_FIELD: &str = "app_id";
