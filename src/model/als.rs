//! Alternating least squares matrix factorization.
//!
//! Users and items are embedded in a `num_features`-dimensional space. Each
//! iteration holds the item factors fixed and solves a small regularized
//! least-squares problem per user, then does the same for items. The
//! regularization term is scaled by the number of ratings of the row being
//! solved (ALS-WR), so heavy and light users are shrunk comparably.
//!
//! Two objectives are supported:
//!
//! - **explicit** (default): fit the observed ratings only.
//! - **implicit** (`implicit_prefs`): every (user, item) cell is a binary
//!   preference, observed cells get confidence `1 + alpha * rating` and
//!   unobserved cells confidence 1.

use std::time::Instant;

use ahash::AHashMap;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::aggregate::Interaction;
use crate::codec::{ItemCode, UserId};
use crate::error::{AffinityError, Result};
use crate::model::{Model, Trainer, TrainingStats};

/// ALS hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlsConfig {
    /// Dimensionality of the latent factors.
    pub num_features: usize,
    /// Number of alternating sweeps.
    pub num_iterations: usize,
    /// Regularization strength (lambda).
    pub regularization: f64,
    /// Treat ratings as implicit confidence rather than explicit scores.
    pub implicit_prefs: bool,
    /// Confidence scaling for implicit feedback.
    pub alpha: f64,
    /// Seed for factor initialization.
    pub seed: u64,
}

impl Default for AlsConfig {
    fn default() -> Self {
        Self {
            num_features: 10,
            num_iterations: 10,
            regularization: 0.01,
            implicit_prefs: false,
            alpha: 1.0,
            seed: 42,
        }
    }
}

impl AlsConfig {
    /// Set the number of latent features.
    pub fn with_num_features(mut self, num_features: usize) -> Self {
        self.num_features = num_features;
        self
    }

    /// Set the number of iterations.
    pub fn with_num_iterations(mut self, num_iterations: usize) -> Self {
        self.num_iterations = num_iterations;
        self
    }

    /// Set the regularization strength.
    pub fn with_regularization(mut self, regularization: f64) -> Self {
        self.regularization = regularization;
        self
    }

    /// Switch to the implicit-feedback objective with the given alpha.
    pub fn with_implicit_prefs(mut self, alpha: f64) -> Self {
        self.implicit_prefs = true;
        self.alpha = alpha;
        self
    }

    /// Set the initialization seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check the hyperparameters.
    pub fn validate(&self) -> Result<()> {
        if self.num_features == 0 {
            return Err(AffinityError::invalid_config(
                "als.num_features must be at least 1",
            ));
        }
        if self.num_iterations == 0 {
            return Err(AffinityError::invalid_config(
                "als.num_iterations must be at least 1",
            ));
        }
        if !self.regularization.is_finite() || self.regularization < 0.0 {
            return Err(AffinityError::invalid_config(
                "als.regularization must be a non-negative number",
            ));
        }
        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(AffinityError::invalid_config(
                "als.alpha must be a non-negative number",
            ));
        }
        Ok(())
    }
}

/// Trains [`AlsModel`]s.
#[derive(Debug, Clone, Default)]
pub struct AlsTrainer {
    config: AlsConfig,
}

impl AlsTrainer {
    /// Create a trainer with the given hyperparameters.
    pub fn new(config: AlsConfig) -> Self {
        AlsTrainer { config }
    }

    /// The hyperparameters.
    pub fn config(&self) -> &AlsConfig {
        &self.config
    }

    /// Solve every row of one side given the factors of the other side.
    fn solve_side(&self, rows: &[Vec<(usize, f64)>], fixed: &[f64], k: usize) -> Result<Vec<f64>> {
        let gram = if self.config.implicit_prefs {
            Some(gram_matrix(fixed, k))
        } else {
            None
        };

        let solved = rows
            .par_iter()
            .map(|ratings| self.solve_row(ratings, fixed, k, gram.as_deref()))
            .collect::<Result<Vec<Vec<f64>>>>()?;

        Ok(solved.concat())
    }

    fn solve_row(
        &self,
        ratings: &[(usize, f64)],
        fixed: &[f64],
        k: usize,
        gram: Option<&[f64]>,
    ) -> Result<Vec<f64>> {
        if ratings.is_empty() {
            return Ok(vec![0.0; k]);
        }

        let mut a = match gram {
            Some(g) => g.to_vec(),
            None => vec![0.0; k * k],
        };
        let mut b = vec![0.0; k];

        for &(other, rating) in ratings {
            let y = &fixed[other * k..(other + 1) * k];
            let (weight, target) = if self.config.implicit_prefs {
                let confidence = 1.0 + self.config.alpha * rating;
                (confidence - 1.0, confidence)
            } else {
                (1.0, rating)
            };

            for r in 0..k {
                b[r] += target * y[r];
                for c in 0..k {
                    a[r * k + c] += weight * y[r] * y[c];
                }
            }
        }

        let lambda = self.config.regularization * ratings.len() as f64;
        for d in 0..k {
            a[d * k + d] += lambda;
        }

        cholesky_solve(a, b, k)
    }
}

impl Trainer for AlsTrainer {
    type Model = AlsModel;

    fn train(&self, interactions: &[Interaction]) -> Result<AlsModel> {
        self.config.validate()?;
        if interactions.is_empty() {
            return Err(AffinityError::model(
                "cannot train on an empty interaction set",
            ));
        }

        let start = Instant::now();
        let k = self.config.num_features;

        let mut users: Vec<UserId> = interactions.iter().map(|t| t.user_id).collect();
        users.sort_unstable();
        users.dedup();
        let user_index: AHashMap<UserId, usize> =
            users.iter().enumerate().map(|(row, &user)| (user, row)).collect();

        let num_items = interactions
            .iter()
            .map(|t| t.item_code as usize + 1)
            .max()
            .unwrap_or(0);

        let mut by_user: Vec<Vec<(usize, f64)>> = vec![Vec::new(); users.len()];
        let mut by_item: Vec<Vec<(usize, f64)>> = vec![Vec::new(); num_items];
        for t in interactions {
            let row = user_index[&t.user_id];
            let col = t.item_code as usize;
            by_user[row].push((col, f64::from(t.rating)));
            by_item[col].push((row, f64::from(t.rating)));
        }

        info!(
            "Training ALS: {} users, {num_items} items, {} ratings, rank {k}, {} iterations",
            users.len(),
            interactions.len(),
            self.config.num_iterations
        );

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let scale = 1.0 / (k as f64).sqrt();
        let mut item_factors: Vec<f64> = (0..num_items * k)
            .map(|_| rng.random::<f64>() * scale)
            .collect();
        let mut user_factors = vec![0.0; users.len() * k];

        let mut losses = Vec::with_capacity(self.config.num_iterations);
        for iteration in 0..self.config.num_iterations {
            user_factors = self.solve_side(&by_user, &item_factors, k)?;
            item_factors = self.solve_side(&by_item, &user_factors, k)?;

            let loss = training_rmse(&by_user, &user_factors, &item_factors, k, &self.config);
            debug!("ALS iteration {}: rmse {loss:.6}", iteration + 1);
            losses.push(loss);
        }

        let stats = TrainingStats {
            final_training_loss: losses.last().copied().unwrap_or(0.0),
            training_losses: losses,
            iterations: self.config.num_iterations,
            training_time_ms: start.elapsed().as_millis() as u64,
            training_examples: interactions.len(),
        };

        Ok(AlsModel {
            rank: k,
            user_index,
            user_factors,
            item_factors,
            num_items,
            stats,
        })
    }
}

/// User and item factor matrices produced by [`AlsTrainer`].
#[derive(Debug, Clone)]
pub struct AlsModel {
    rank: usize,
    user_index: AHashMap<UserId, usize>,
    /// Row-major, one row of `rank` values per user.
    user_factors: Vec<f64>,
    /// Row-major, one row of `rank` values per item code.
    item_factors: Vec<f64>,
    num_items: usize,
    stats: TrainingStats,
}

impl AlsModel {
    /// Dimensionality of the factors.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Number of users with factors.
    pub fn num_users(&self) -> usize {
        self.user_index.len()
    }

    /// Number of item rows (highest trained code + 1).
    pub fn num_items(&self) -> usize {
        self.num_items
    }

    /// Statistics collected while training.
    pub fn training_stats(&self) -> &TrainingStats {
        &self.stats
    }

    /// Latent vector of a user.
    pub fn user_factors(&self, user_id: UserId) -> Option<&[f64]> {
        self.user_index
            .get(&user_id)
            .map(|&row| &self.user_factors[row * self.rank..(row + 1) * self.rank])
    }

    /// Latent vector of an item.
    pub fn item_factors(&self, item_code: ItemCode) -> Option<&[f64]> {
        let row = item_code as usize;
        (row < self.num_items).then(|| &self.item_factors[row * self.rank..(row + 1) * self.rank])
    }
}

impl Model for AlsModel {
    fn predict(&self, user_id: UserId, item_code: ItemCode) -> Result<f64> {
        let user = self
            .user_factors(user_id)
            .ok_or_else(|| AffinityError::model(format!("user {user_id} has no factors")))?;
        let item = self
            .item_factors(item_code)
            .ok_or_else(|| AffinityError::model(format!("item {item_code} has no factors")))?;
        Ok(dot(user, item))
    }

    fn knows_user(&self, user_id: UserId) -> bool {
        self.user_index.contains_key(&user_id)
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// `YᵀY` for a row-major factor matrix with `k` columns.
fn gram_matrix(factors: &[f64], k: usize) -> Vec<f64> {
    let mut gram = vec![0.0; k * k];
    for y in factors.chunks_exact(k) {
        for r in 0..k {
            for c in 0..k {
                gram[r * k + c] += y[r] * y[c];
            }
        }
    }
    gram
}

/// Solve `A x = b` for a symmetric positive-definite `k × k` matrix.
fn cholesky_solve(mut a: Vec<f64>, mut b: Vec<f64>, k: usize) -> Result<Vec<f64>> {
    // Factor A = L Lᵀ, L stored in the lower triangle of `a`.
    for j in 0..k {
        let mut diag = a[j * k + j];
        for p in 0..j {
            diag -= a[j * k + p] * a[j * k + p];
        }
        if !diag.is_finite() || diag <= 0.0 {
            return Err(AffinityError::model(
                "normal equations are not positive definite; increase als.regularization",
            ));
        }
        let diag = diag.sqrt();
        a[j * k + j] = diag;

        for i in (j + 1)..k {
            let mut sum = a[i * k + j];
            for p in 0..j {
                sum -= a[i * k + p] * a[j * k + p];
            }
            a[i * k + j] = sum / diag;
        }
    }

    // L z = b
    for i in 0..k {
        let mut sum = b[i];
        for p in 0..i {
            sum -= a[i * k + p] * b[p];
        }
        b[i] = sum / a[i * k + i];
    }

    // Lᵀ x = z
    for i in (0..k).rev() {
        let mut sum = b[i];
        for p in (i + 1)..k {
            sum -= a[p * k + i] * b[p];
        }
        b[i] = sum / a[i * k + i];
    }

    Ok(b)
}

/// Root mean squared error over the observed cells.
fn training_rmse(
    by_user: &[Vec<(usize, f64)>],
    user_factors: &[f64],
    item_factors: &[f64],
    k: usize,
    config: &AlsConfig,
) -> f64 {
    let (sum, count) = by_user
        .par_iter()
        .enumerate()
        .map(|(row, ratings)| {
            let user = &user_factors[row * k..(row + 1) * k];
            ratings.iter().fold((0.0, 0usize), |(sum, count), &(col, rating)| {
                let item = &item_factors[col * k..(col + 1) * k];
                let target = if config.implicit_prefs { 1.0 } else { rating };
                let err = target - dot(user, item);
                (sum + err * err, count + 1)
            })
        })
        .reduce(|| (0.0, 0), |a, b| (a.0 + b.0, a.1 + b.1));

    if count == 0 {
        0.0
    } else {
        (sum / count as f64).sqrt()
    }
}
