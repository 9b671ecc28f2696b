//! Biased matrix factorization trained by stochastic gradient descent.
//!
//! ## Algorithm
//! Each known rating is modeled as
//!
//! ```text
//! r̂(u, i) = μ + b_u + b_i + p_u · q_i
//! ```
//!
//! with global mean μ, per-user/per-movie biases, and k-dimensional latent
//! vectors. SGD minimizes squared error with L2 regularization, sweeping
//! the ratings in their fixed table order each epoch. Factor
//! initialization comes from a seeded RNG, so the same (seed, table)
//! always yields bit-identical parameters.
//!
//! ## Prediction
//! Estimates are clipped to the rating scale captured at training time.
//! Unseen users or movies never fail: the estimate degrades to μ plus
//! whichever biases are known (the cold-start policy).

use crate::error::{Result, TrainError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rating_store::{MovieId, RatingScale, RatingTable, UserId};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Training hyperparameters.
///
/// Defaults match the classic biased-SVD setup: 100 factors, 20 epochs,
/// learning rate 0.005, regularization 0.02.
#[derive(Debug, Clone)]
pub struct SvdConfig {
    /// Latent vector dimensionality
    pub factors: usize,
    /// Full SGD sweeps over the ratings
    pub epochs: usize,
    pub learning_rate: f32,
    pub regularization: f32,
    /// Factors initialize uniformly in `[-init_spread, init_spread]`
    pub init_spread: f32,
    /// RNG seed for initialization; same seed + same data ⇒ same model
    pub seed: u64,
    /// Minimum rating count required to train at all
    pub min_ratings: usize,
}

impl Default for SvdConfig {
    fn default() -> Self {
        Self {
            factors: 100,
            epochs: 20,
            learning_rate: 0.005,
            regularization: 0.02,
            init_spread: 0.1,
            seed: 123,
            min_ratings: 10,
        }
    }
}

/// Trains [`LatentModel`]s from a rating table.
pub struct SvdTrainer {
    config: SvdConfig,
}

impl SvdTrainer {
    pub fn new(config: SvdConfig) -> Self {
        Self { config }
    }

    /// Fit a model over every known rating in the table.
    ///
    /// Fails with [`TrainError::InsufficientData`] when the table holds
    /// fewer than `min_ratings` ratings.
    #[instrument(skip(self, table), fields(version = table.version()))]
    pub fn train(&self, table: &RatingTable) -> Result<LatentModel> {
        let ratings = table.ratings();
        if ratings.len() < self.config.min_ratings {
            return Err(TrainError::InsufficientData {
                found: ratings.len(),
                required: self.config.min_ratings,
            });
        }

        let start = Instant::now();
        let k = self.config.factors;
        let lr = self.config.learning_rate;
        let reg = self.config.regularization;

        // Canonical (sorted) id order keeps index assignment deterministic
        let user_ids = table.user_ids();
        let movie_ids = table.movie_ids();
        let user_index: HashMap<UserId, usize> = user_ids
            .iter()
            .enumerate()
            .map(|(idx, &id)| (id, idx))
            .collect();
        let movie_index: HashMap<MovieId, usize> = movie_ids
            .iter()
            .enumerate()
            .map(|(idx, &id)| (id, idx))
            .collect();

        let global_mean =
            (ratings.iter().map(|r| r.rating as f64).sum::<f64>() / ratings.len() as f64) as f32;

        let mut user_bias = vec![0.0f32; user_ids.len()];
        let mut movie_bias = vec![0.0f32; movie_ids.len()];

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let spread = self.config.init_spread;
        let mut user_factors = vec![0.0f32; user_ids.len() * k];
        let mut movie_factors = vec![0.0f32; movie_ids.len() * k];
        for value in user_factors.iter_mut() {
            *value = rng.random_range(-spread..spread);
        }
        for value in movie_factors.iter_mut() {
            *value = rng.random_range(-spread..spread);
        }

        for epoch in 0..self.config.epochs {
            let mut squared_error = 0.0f64;

            for rating in ratings {
                let u = user_index[&rating.user_id];
                let i = movie_index[&rating.movie_id];
                let u_off = u * k;
                let i_off = i * k;

                let dot: f32 = user_factors[u_off..u_off + k]
                    .iter()
                    .zip(&movie_factors[i_off..i_off + k])
                    .map(|(p, q)| p * q)
                    .sum();
                let err = rating.rating - (global_mean + user_bias[u] + movie_bias[i] + dot);
                squared_error += (err as f64) * (err as f64);

                user_bias[u] += lr * (err - reg * user_bias[u]);
                movie_bias[i] += lr * (err - reg * movie_bias[i]);

                for f in 0..k {
                    let p = user_factors[u_off + f];
                    let q = movie_factors[i_off + f];
                    user_factors[u_off + f] += lr * (err * q - reg * p);
                    movie_factors[i_off + f] += lr * (err * p - reg * q);
                }
            }

            debug!(
                "SGD epoch {}: rmse = {:.4}",
                epoch,
                (squared_error / ratings.len() as f64).sqrt()
            );
        }

        info!(
            "Trained latent model: {} users x {} movies, {} factors, {} epochs in {:?}",
            user_ids.len(),
            movie_ids.len(),
            k,
            self.config.epochs,
            start.elapsed()
        );

        Ok(LatentModel {
            global_mean,
            user_index,
            movie_index,
            user_bias,
            movie_bias,
            user_factors,
            movie_factors,
            factors: k,
            scale: table.scale(),
            version: table.version(),
        })
    }
}

impl Default for SvdTrainer {
    fn default() -> Self {
        Self::new(SvdConfig::default())
    }
}

/// Trained factorization parameters, read-only after training.
#[derive(Debug)]
pub struct LatentModel {
    global_mean: f32,
    user_index: HashMap<UserId, usize>,
    movie_index: HashMap<MovieId, usize>,
    user_bias: Vec<f32>,
    movie_bias: Vec<f32>,
    /// Flat users×factors matrix
    user_factors: Vec<f32>,
    /// Flat movies×factors matrix
    movie_factors: Vec<f32>,
    factors: usize,
    scale: RatingScale,
    version: u64,
}

impl LatentModel {
    /// Estimate a rating, clipped to the training scale.
    ///
    /// Never fails: unseen users/movies fall back to the global mean plus
    /// whichever bias terms are known.
    pub fn predict(&self, user_id: UserId, movie_id: MovieId) -> f32 {
        let u = self.user_index.get(&user_id).copied();
        let i = self.movie_index.get(&movie_id).copied();

        let mut estimate = self.global_mean;
        if let Some(u) = u {
            estimate += self.user_bias[u];
        }
        if let Some(i) = i {
            estimate += self.movie_bias[i];
        }
        if let (Some(u), Some(i)) = (u, i) {
            let u_off = u * self.factors;
            let i_off = i * self.factors;
            let dot: f32 = self.user_factors[u_off..u_off + self.factors]
                .iter()
                .zip(&self.movie_factors[i_off..i_off + self.factors])
                .map(|(p, q)| p * q)
                .sum();
            estimate += dot;
        }

        self.scale.clip(estimate)
    }

    /// Mean of all training ratings
    pub fn global_mean(&self) -> f32 {
        self.global_mean
    }

    /// Whether the user appeared in training
    pub fn knows_user(&self, user_id: UserId) -> bool {
        self.user_index.contains_key(&user_id)
    }

    /// The scale estimates are clipped to
    pub fn scale(&self) -> RatingScale {
        self.scale
    }

    /// Table version this model was trained from
    pub fn version(&self) -> u64 {
        self.version
    }
}
