//! Error types for latent model training.

use thiserror::Error;

/// Errors raised while training a latent factor model.
///
/// Training failures are fatal to that training call only; a previously
/// trained model, if any, stays valid.
#[derive(Error, Debug)]
pub enum TrainError {
    /// Too few ratings to fit factors meaningfully
    #[error("Insufficient training data: {found} ratings, need at least {required}")]
    InsufficientData { found: usize, required: usize },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, TrainError>;
