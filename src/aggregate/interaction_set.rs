//! The deduplicated (user, item) → rating collection.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::codec::{CodedRecord, ItemCode, UserId};

/// One aggregated (user, item, rating) triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interaction {
    pub user_id: UserId,
    pub item_code: ItemCode,
    /// Number of raw occurrences of the pair.
    pub rating: u32,
}

/// At most one rating per distinct (user, item) pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionSet {
    ratings: AHashMap<(UserId, ItemCode), u32>,
}

impl InteractionSet {
    /// Create an empty set.
    pub fn new() -> Self {
        InteractionSet {
            ratings: AHashMap::new(),
        }
    }

    /// Add `rating` to the pair's running total.
    pub fn add(&mut self, user_id: UserId, item_code: ItemCode, rating: u32) {
        let total = self.ratings.entry((user_id, item_code)).or_insert(0);
        *total = total.saturating_add(rating);
    }

    /// Add one coded record.
    pub fn add_record(&mut self, record: &CodedRecord) {
        self.add(record.user_id, record.item_code, record.rating);
    }

    /// Fold another partial set into this one.
    pub fn merge(&mut self, other: InteractionSet) {
        if self.ratings.len() < other.ratings.len() {
            let smaller = std::mem::replace(&mut self.ratings, other.ratings);
            for ((user_id, item_code), rating) in smaller {
                self.add(user_id, item_code, rating);
            }
        } else {
            for ((user_id, item_code), rating) in other.ratings {
                self.add(user_id, item_code, rating);
            }
        }
    }

    /// Rating of a pair, if the user interacted with the item.
    pub fn rating(&self, user_id: UserId, item_code: ItemCode) -> Option<u32> {
        self.ratings.get(&(user_id, item_code)).copied()
    }

    /// Items the user already interacted with.
    pub fn items_for_user(&self, user_id: UserId) -> AHashSet<ItemCode> {
        self.ratings
            .keys()
            .filter(|(user, _)| *user == user_id)
            .map(|(_, item)| *item)
            .collect()
    }

    /// Check if the user has any interaction.
    pub fn contains_user(&self, user_id: UserId) -> bool {
        self.ratings.keys().any(|(user, _)| *user == user_id)
    }

    /// Distinct users in ascending order.
    pub fn users(&self) -> Vec<UserId> {
        let mut users: Vec<UserId> = self.ratings.keys().map(|(user, _)| *user).collect();
        users.sort_unstable();
        users.dedup();
        users
    }

    /// Number of distinct pairs.
    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    /// Sum of all ratings, i.e. the number of aggregated occurrences.
    pub fn total_rating(&self) -> u64 {
        self.ratings.values().map(|&r| u64::from(r)).sum()
    }

    /// Iterate over the interactions in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = Interaction> + '_ {
        self.ratings
            .iter()
            .map(|(&(user_id, item_code), &rating)| Interaction {
                user_id,
                item_code,
                rating,
            })
    }

    /// All interactions sorted by (user, item), for reproducible training input.
    pub fn to_triples(&self) -> Vec<Interaction> {
        let mut triples: Vec<Interaction> = self.iter().collect();
        triples.sort_unstable_by_key(|t| (t.user_id, t.item_code));
        triples
    }
}

impl<'a> FromIterator<&'a CodedRecord> for InteractionSet {
    fn from_iter<I: IntoIterator<Item = &'a CodedRecord>>(iter: I) -> Self {
        let mut set = InteractionSet::new();
        for record in iter {
            set.add_record(record);
        }
        set
    }
}

impl FromIterator<Interaction> for InteractionSet {
    fn from_iter<I: IntoIterator<Item = Interaction>>(iter: I) -> Self {
        let mut set = InteractionSet::new();
        for interaction in iter {
            set.add(interaction.user_id, interaction.item_code, interaction.rating);
        }
        set
    }
}
