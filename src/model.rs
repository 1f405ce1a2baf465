//! Latent-factor models.
//!
//! The ranking code only needs something that scores (user, item) pairs, so
//! the factorization algorithm sits behind the [`Model`] and [`Trainer`]
//! traits. [`als`] provides an alternating-least-squares implementation.

pub mod als;

use serde::{Deserialize, Serialize};

use crate::aggregate::Interaction;
use crate::codec::{ItemCode, UserId};
use crate::error::Result;

pub use als::{AlsConfig, AlsModel, AlsTrainer};

/// A trained model that predicts user/item affinity.
pub trait Model: Send + Sync {
    /// Predicted affinity of `user_id` for `item_code`.
    fn predict(&self, user_id: UserId, item_code: ItemCode) -> Result<f64>;

    /// Check if the model has learned anything about the user.
    ///
    /// Recommenders return nothing for users the model does not know.
    fn knows_user(&self, _user_id: UserId) -> bool {
        true
    }
}

/// Fits a [`Model`] to aggregated interactions.
pub trait Trainer: Sync {
    /// The model type produced by this trainer.
    type Model: Model;

    /// Train on `(user, item, rating)` triples.
    fn train(&self, interactions: &[Interaction]) -> Result<Self::Model>;
}

impl<M: Model + ?Sized> Model for Box<M> {
    fn predict(&self, user_id: UserId, item_code: ItemCode) -> Result<f64> {
        (**self).predict(user_id, item_code)
    }

    fn knows_user(&self, user_id: UserId) -> bool {
        (**self).knows_user(user_id)
    }
}

/// Training statistics and performance metrics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingStats {
    /// Training loss (RMSE over observed entries) after each iteration.
    pub training_losses: Vec<f64>,
    /// Number of training iterations completed.
    pub iterations: usize,
    /// Training time in milliseconds.
    pub training_time_ms: u64,
    /// Final training loss.
    pub final_training_loss: f64,
    /// Number of triples the model was trained on.
    pub training_examples: usize,
}
