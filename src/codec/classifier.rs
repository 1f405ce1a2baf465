//! Keep/discard classification and item coding of flattened records.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codec::item_codes::ItemCodeTable;
use crate::codec::{ItemCode, UserId};
use crate::error::{AffinityError, Result};
use crate::record::{APP_ID_FIELD, FieldValue, FlatRecord, USER_ID_FIELD};

/// A record whose item key has been replaced by its code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodedRecord {
    pub user_id: UserId,
    pub item_code: ItemCode,
    /// Per-occurrence weight, always 1 for a freshly coded record.
    pub rating: u32,
}

impl CodedRecord {
    /// A single occurrence of `(user_id, item_code)`.
    pub fn occurrence(user_id: UserId, item_code: ItemCode) -> Self {
        CodedRecord {
            user_id,
            item_code,
            rating: 1,
        }
    }
}

/// Why a record was dropped from the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiscardReason {
    /// The line was not a JSON document.
    Unparseable { message: String },
    /// A configured field path did not resolve.
    MissingField { field: String },
    /// The user key is not an integer.
    InvalidUserKey { value: String },
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscardReason::Unparseable { message } => write!(f, "unparseable record: {message}"),
            DiscardReason::MissingField { field } => write!(f, "missing field '{field}'"),
            DiscardReason::InvalidUserKey { value } => {
                write!(f, "user key '{value}' is not an integer")
            }
        }
    }
}

impl From<AffinityError> for DiscardReason {
    fn from(error: AffinityError) -> Self {
        match error {
            AffinityError::MissingField { field, .. } => DiscardReason::MissingField { field },
            other => DiscardReason::Unparseable {
                message: other.to_string(),
            },
        }
    }
}

/// Outcome of classifying one record.
#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    Kept(CodedRecord),
    Discarded(DiscardReason),
}

impl Classified {
    /// The coded record, if kept.
    pub fn kept(self) -> Option<CodedRecord> {
        match self {
            Classified::Kept(record) => Some(record),
            Classified::Discarded(_) => None,
        }
    }

    /// Check if the record was discarded.
    pub fn is_discarded(&self) -> bool {
        matches!(self, Classified::Discarded(_))
    }
}

/// Assigns item codes to flattened records in the order they are presented.
///
/// Code assignment depends on presentation order, so classification must run
/// on a single thread over records in input order.
#[derive(Debug, Default)]
pub struct IdentifierCodec {
    table: ItemCodeTable,
}

impl IdentifierCodec {
    /// Create a codec with an empty code table.
    pub fn new() -> Self {
        IdentifierCodec {
            table: ItemCodeTable::new(),
        }
    }

    /// Continue coding on top of an existing table.
    pub fn with_table(table: ItemCodeTable) -> Self {
        IdentifierCodec { table }
    }

    /// Classify the result of flattening one record.
    ///
    /// Extraction failures become [`Classified::Discarded`] and never touch the
    /// code table. Only an exhausted code space is reported as an error.
    pub fn classify(&mut self, flattened: Result<FlatRecord>) -> Result<Classified> {
        let record = match flattened {
            Ok(record) => record,
            Err(e) => return Ok(Classified::Discarded(DiscardReason::from(e))),
        };

        let user_id = match record.get_field(USER_ID_FIELD) {
            Some(value) => match parse_user_id(value) {
                Some(user_id) => user_id,
                None => {
                    return Ok(Classified::Discarded(DiscardReason::InvalidUserKey {
                        value: value.to_key_string(),
                    }));
                }
            },
            None => return Ok(Classified::Discarded(missing(USER_ID_FIELD))),
        };

        let item_key = match record.get_field(APP_ID_FIELD) {
            Some(value) => value.to_key_string(),
            None => return Ok(Classified::Discarded(missing(APP_ID_FIELD))),
        };

        let item_code = self.table.get_or_assign(&item_key)?;
        Ok(Classified::Kept(CodedRecord::occurrence(user_id, item_code)))
    }

    /// The code table built so far.
    pub fn table(&self) -> &ItemCodeTable {
        &self.table
    }

    /// Finish coding and take the table.
    pub fn into_table(self) -> ItemCodeTable {
        self.table
    }
}

fn parse_user_id(value: &FieldValue) -> Option<UserId> {
    value.as_integer()
}

fn missing(field: &str) -> DiscardReason {
    DiscardReason::MissingField {
        field: field.to_string(),
    }
}
