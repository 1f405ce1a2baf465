//! # Affinity
//!
//! Top-N app recommendations from a JSONL usage log.
//!
//! ## Pipeline
//!
//! - Extract configured fields from nested JSON events
//! - Code app keys into dense integers, discarding malformed records
//! - Aggregate `(user, item)` occurrence counts in parallel
//! - Fit an ALS latent-factor model
//! - Rank each user's unseen items by predicted score

pub mod aggregate;
pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod recommend;
pub mod record;

pub mod prelude {
    pub use crate::aggregate::{Interaction, InteractionAggregator, InteractionSet};
    pub use crate::codec::{
        Classified, CodedRecord, DiscardReason, IdentifierCodec, ItemCode, ItemCodeTable, UserId,
    };
    pub use crate::config::{AffinityConfig, ExecutionConfig, SourceConfig};
    pub use crate::error::{AffinityError, Result};
    pub use crate::model::{AlsConfig, AlsModel, AlsTrainer, Model, Trainer};
    pub use crate::pipeline::{IngestStats, Ingested, Pipeline, TrainedPipeline};
    pub use crate::recommend::{Recommendation, RecommendedItem, Recommender};
    pub use crate::record::{FieldPath, FieldValue, FlatRecord, PathExtractor};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
