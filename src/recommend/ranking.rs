//! Deterministic top-N selection.

use std::cmp::Ordering;

use crate::codec::ItemCode;

/// A candidate item with its predicted score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredItem {
    pub item_code: ItemCode,
    pub score: f64,
}

impl ScoredItem {
    pub fn new(item_code: ItemCode, score: f64) -> Self {
        ScoredItem { item_code, score }
    }
}

/// Higher score first, then lower item code. NaN scores sort after every number.
fn ranking_order(a: &ScoredItem, b: &ScoredItem) -> Ordering {
    match (a.score.is_nan(), b.score.is_nan()) {
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        _ => b
            .score
            .total_cmp(&a.score)
            .then_with(|| a.item_code.cmp(&b.item_code)),
    }
}

/// Keep the `n` best candidates in ranking order.
pub fn rank_top_n(mut scored: Vec<ScoredItem>, n: usize) -> Vec<ScoredItem> {
    if n == 0 || scored.is_empty() {
        return Vec::new();
    }

    if n < scored.len() {
        scored.select_nth_unstable_by(n - 1, ranking_order);
        scored.truncate(n);
    }
    scored.sort_unstable_by(ranking_order);
    scored
}
