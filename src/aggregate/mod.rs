//! Aggregation of coded records into implicit ratings.
//!
//! Every kept record is one occurrence of a (user, item) pair. Summing the
//! occurrences per pair gives the implicit rating used for training. The sum
//! is associative and commutative, so the input can be split into any number
//! of partitions, folded in parallel and merged.

pub mod aggregator;
pub mod interaction_set;

pub use aggregator::InteractionAggregator;
pub use interaction_set::{Interaction, InteractionSet};
