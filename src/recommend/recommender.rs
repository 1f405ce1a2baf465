//! Exclusion-filtered scoring of the item catalog for one user.

use ahash::AHashSet;
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::aggregate::InteractionSet;
use crate::codec::{ItemCode, ItemCodeTable, UserId};
use crate::error::Result;
use crate::model::Model;
use crate::recommend::ranking::{ScoredItem, rank_top_n};

/// One ranked item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedItem {
    /// External item key.
    pub key: String,
    pub code: ItemCode,
    pub score: f64,
}

/// Ranked unseen items for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub user_id: UserId,
    pub items: Vec<RecommendedItem>,
}

impl Recommendation {
    /// A recommendation with no items.
    pub fn empty(user_id: UserId) -> Self {
        Recommendation {
            user_id,
            items: Vec::new(),
        }
    }

    /// External item keys in rank order.
    pub fn keys(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.key.as_str()).collect()
    }

    /// Number of recommended items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if nothing was recommended.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Every catalog code the user has not interacted with, ascending.
pub fn candidate_codes(
    user_id: UserId,
    interactions: &InteractionSet,
    codes: &ItemCodeTable,
) -> Vec<ItemCode> {
    let seen: AHashSet<ItemCode> = interactions.items_for_user(user_id);
    codes.codes().filter(|code| !seen.contains(code)).collect()
}

/// Recommend up to `n` unseen items for `user_id`.
pub fn recommend<M: Model + ?Sized>(
    user_id: UserId,
    model: &M,
    interactions: &InteractionSet,
    codes: &ItemCodeTable,
    n: usize,
) -> Result<Recommendation> {
    Recommender::new(model, interactions, codes).recommend(user_id, n)
}

/// Recommends items from a trained model over a fixed catalog.
pub struct Recommender<'a, M: Model + ?Sized> {
    model: &'a M,
    interactions: &'a InteractionSet,
    codes: &'a ItemCodeTable,
}

impl<'a, M: Model + ?Sized> Recommender<'a, M> {
    pub fn new(model: &'a M, interactions: &'a InteractionSet, codes: &'a ItemCodeTable) -> Self {
        Recommender {
            model,
            interactions,
            codes,
        }
    }

    /// Ranked top-`n` unseen items for one user.
    ///
    /// Users unknown to the model get an empty recommendation. A selected code
    /// without a reverse mapping is a [`CodecIntegrity`] error.
    ///
    /// [`CodecIntegrity`]: crate::error::AffinityError::CodecIntegrity
    pub fn recommend(&self, user_id: UserId, n: usize) -> Result<Recommendation> {
        if n == 0 {
            return Ok(Recommendation::empty(user_id));
        }
        if !self.model.knows_user(user_id) {
            debug!("User {user_id} is unknown to the model");
            return Ok(Recommendation::empty(user_id));
        }

        let candidates = candidate_codes(user_id, self.interactions, self.codes);
        debug!(
            "User {user_id}: {} candidates out of {} items",
            candidates.len(),
            self.codes.len()
        );

        let scored = candidates
            .par_iter()
            .map(|&code| {
                self.model
                    .predict(user_id, code)
                    .map(|score| ScoredItem::new(code, score))
            })
            .collect::<Result<Vec<ScoredItem>>>()?;

        let items = rank_top_n(scored, n)
            .into_iter()
            .map(|scored| {
                Ok(RecommendedItem {
                    key: self.codes.require_key(scored.item_code)?.to_string(),
                    code: scored.item_code,
                    score: scored.score,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Recommendation { user_id, items })
    }

    /// Recommendations for several users, in the order given.
    pub fn recommend_all(&self, user_ids: &[UserId], n: usize) -> Result<Vec<Recommendation>> {
        user_ids
            .iter()
            .map(|&user_id| self.recommend(user_id, n))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use ahash::AHashMap;

    use super::*;
    use crate::error::AffinityError;

    /// Scores looked up from a table; unknown pairs score 0.
    struct TableModel {
        scores: AHashMap<ItemCode, f64>,
        users: Vec<UserId>,
    }

    impl TableModel {
        fn new(users: &[UserId], scores: &[(ItemCode, f64)]) -> Self {
            TableModel {
                scores: scores.iter().copied().collect(),
                users: users.to_vec(),
            }
        }
    }

    impl Model for TableModel {
        fn predict(&self, _user_id: UserId, item_code: ItemCode) -> Result<f64> {
            Ok(self.scores.get(&item_code).copied().unwrap_or(0.0))
        }

        fn knows_user(&self, user_id: UserId) -> bool {
            self.users.contains(&user_id)
        }
    }

    struct FailingModel;

    impl Model for FailingModel {
        fn predict(&self, _user_id: UserId, _item_code: ItemCode) -> Result<f64> {
            Err(AffinityError::model("prediction failed"))
        }
    }

    /// Catalog of `size` codes keyed "app0", "app1", ...
    fn catalog(size: u32) -> ItemCodeTable {
        let mut codes = ItemCodeTable::new();
        for code in 0..size {
            codes.get_or_assign(&format!("app{code}")).unwrap();
        }
        codes
    }

    #[test]
    fn test_candidates_exclude_seen_items() {
        // user 5 has used {2,7}
        let codes = catalog(10);
        let mut interactions = InteractionSet::new();
        interactions.add(5, 2, 1);
        interactions.add(5, 7, 4);
        interactions.add(6, 1, 1);

        let candidates = candidate_codes(5, &interactions, &codes);
        assert_eq!(candidates, vec![0, 1, 3, 4, 5, 6, 8, 9]);
    }

    #[test]
    fn test_ranking_with_tie_break() {
        let codes = catalog(10);
        let mut interactions = InteractionSet::new();
        for seen in [0, 2, 4, 5, 6, 7, 8] {
            interactions.add(5, seen, 1);
        }
        // candidates {1, 3, 9}
        let model = TableModel::new(&[5], &[(1, 0.9), (3, 0.5), (9, 0.9)]);

        let rec = recommend(5, &model, &interactions, &codes, 2).unwrap();
        assert_eq!(rec.keys(), vec!["app1", "app9"]);
        assert_eq!(rec.items[0].code, 1);
        assert_eq!(rec.items[0].score, 0.9);
    }

    #[test]
    fn test_never_recommends_seen_items() {
        let codes = catalog(10);
        let mut interactions = InteractionSet::new();
        interactions.add(5, 2, 1);
        interactions.add(5, 7, 1);
        // seen items have the highest scores
        let model = TableModel::new(&[5], &[(2, 10.0), (7, 9.0), (3, 1.0)]);

        let rec = recommend(5, &model, &interactions, &codes, 10).unwrap();
        assert_eq!(rec.len(), 8);
        assert!(rec.items.iter().all(|item| item.code != 2 && item.code != 7));
        assert_eq!(rec.items[0].code, 3);
    }

    #[test]
    fn test_top_n_bound() {
        let codes = catalog(6);
        let mut interactions = InteractionSet::new();
        interactions.add(1, 0, 1);
        let model = TableModel::new(&[1], &[]);

        for n in 0..10 {
            let rec = recommend(1, &model, &interactions, &codes, n).unwrap();
            assert_eq!(rec.len(), n.min(5));
        }
    }

    #[test]
    fn test_no_candidates() {
        let codes = catalog(2);
        let mut interactions = InteractionSet::new();
        interactions.add(1, 0, 1);
        interactions.add(1, 1, 1);
        let model = TableModel::new(&[1], &[]);

        let rec = recommend(1, &model, &interactions, &codes, 3).unwrap();
        assert!(rec.is_empty());
        assert_eq!(rec.user_id, 1);
    }

    #[test]
    fn test_unknown_user_gets_nothing() {
        let codes = catalog(3);
        let interactions = InteractionSet::new();
        let model = TableModel::new(&[1], &[(0, 1.0)]);

        let rec = recommend(42, &model, &interactions, &codes, 3).unwrap();
        assert!(rec.is_empty());
    }

    #[test]
    fn test_model_failure_is_fatal() {
        let codes = catalog(3);
        let interactions = InteractionSet::new();

        let result = recommend(1, &FailingModel, &interactions, &codes, 2);
        assert!(matches!(result, Err(AffinityError::Model(_))));
    }

    #[test]
    fn test_recommend_all_keeps_user_order() {
        let codes = catalog(4);
        let mut interactions = InteractionSet::new();
        interactions.add(2, 0, 1);
        interactions.add(1, 1, 1);
        let model = TableModel::new(&[1, 2], &[(0, 0.3), (1, 0.2), (2, 0.1)]);

        let recommender = Recommender::new(&model, &interactions, &codes);
        let recs = recommender.recommend_all(&[2, 1, 2], 1).unwrap();

        let users: Vec<UserId> = recs.iter().map(|r| r.user_id).collect();
        assert_eq!(users, vec![2, 1, 2]);
        assert_eq!(recs[0].keys(), vec!["app1"]);
        assert_eq!(recs[1].keys(), vec!["app0"]);
    }

    #[test]
    fn test_dyn_model() {
        let codes = catalog(3);
        let interactions = InteractionSet::new();
        let model: Box<dyn Model> = Box::new(TableModel::new(&[1], &[(2, 5.0)]));

        let rec = recommend(1, model.as_ref(), &interactions, &codes, 1).unwrap();
        assert_eq!(rec.keys(), vec!["app2"]);
    }
}
