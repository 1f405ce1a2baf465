//! Bidirectional item key ↔ code table.

use ahash::AHashMap;

use crate::codec::ItemCode;
use crate::error::{AffinityError, Result};

/// Bijection between external item keys and dense integer codes.
///
/// Codes are assigned in first-seen order starting at 0 and are never reused.
/// The reverse direction is a vector indexed by code, so every code below
/// [`len`](Self::len) has exactly one key.
///
/// ```
/// use affinity::codec::ItemCodeTable;
///
/// let mut table = ItemCodeTable::new();
/// assert_eq!(table.get_or_assign("maps").unwrap(), 0);
/// assert_eq!(table.get_or_assign("mail").unwrap(), 1);
/// assert_eq!(table.get_or_assign("maps").unwrap(), 0);
/// assert_eq!(table.key(1), Some("mail"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemCodeTable {
    forward: AHashMap<String, ItemCode>,
    reverse: Vec<String>,
}

impl ItemCodeTable {
    /// Create an empty table.
    pub fn new() -> Self {
        ItemCodeTable {
            forward: AHashMap::new(),
            reverse: Vec::new(),
        }
    }

    /// Look up `key`, assigning the next code if it has not been seen.
    pub fn get_or_assign(&mut self, key: &str) -> Result<ItemCode> {
        if let Some(&code) = self.forward.get(key) {
            return Ok(code);
        }

        let code = ItemCode::try_from(self.reverse.len())
            .map_err(|_| AffinityError::codec_integrity("item code space exhausted"))?;
        self.forward.insert(key.to_string(), code);
        self.reverse.push(key.to_string());
        Ok(code)
    }

    /// Code of an already-assigned key.
    pub fn code(&self, key: &str) -> Option<ItemCode> {
        self.forward.get(key).copied()
    }

    /// Key of an assigned code.
    pub fn key(&self, code: ItemCode) -> Option<&str> {
        self.reverse.get(code as usize).map(|s| s.as_str())
    }

    /// Key of a code that must exist.
    pub fn require_key(&self, code: ItemCode) -> Result<&str> {
        self.key(code).ok_or_else(|| {
            AffinityError::codec_integrity(format!(
                "item code {code} has no reverse mapping ({} codes assigned)",
                self.len()
            ))
        })
    }

    /// Number of assigned codes.
    pub fn len(&self) -> usize {
        self.reverse.len()
    }

    /// Check if no code has been assigned.
    pub fn is_empty(&self) -> bool {
        self.reverse.is_empty()
    }

    /// All assigned codes in ascending order.
    pub fn codes(&self) -> impl Iterator<Item = ItemCode> + '_ {
        (0..self.reverse.len()).map(|code| code as ItemCode)
    }

    /// `(code, key)` pairs in ascending code order.
    pub fn iter(&self) -> impl Iterator<Item = (ItemCode, &str)> + '_ {
        self.reverse
            .iter()
            .enumerate()
            .map(|(code, key)| (code as ItemCode, key.as_str()))
    }
}
