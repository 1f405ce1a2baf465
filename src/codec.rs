//! Identifier encoding.
//!
//! Matrix factorization needs dense integer item indices. The
//! [`ItemCodeTable`] hands out codes in first-seen order and keeps the reverse
//! mapping needed to turn ranked codes back into item names. The
//! [`IdentifierCodec`] applies it to flattened records and decides which
//! records are kept.

pub mod classifier;
pub mod item_codes;

pub use classifier::{Classified, CodedRecord, DiscardReason, IdentifierCodec};
pub use item_codes::ItemCodeTable;

/// Dense zero-based item code.
pub type ItemCode = u32;

/// Numeric user identifier.
pub type UserId = i64;
