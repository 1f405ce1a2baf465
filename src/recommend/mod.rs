//! Top-N recommendation.
//!
//! For one user the candidate set is every coded item the user has not
//! interacted with. Candidates are scored by the model in parallel, ranked by
//! descending score with ties broken by ascending item code, truncated to N
//! and mapped back to external item keys.

pub mod ranking;
pub mod recommender;

pub use ranking::{ScoredItem, rank_top_n};
pub use recommender::{RecommendedItem, Recommendation, Recommender, candidate_codes, recommend};
