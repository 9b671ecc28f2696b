//! # Latent Crate
//!
//! Matrix-factorization model and the personalized recommender built on it.
//!
//! ## Components
//!
//! ### Latent Factor Model
//! Biased SVD-style factorization trained by SGD over all known ratings:
//! - `r̂ = μ + b_u + b_i + p_u · q_i`
//! - Seeded initialization: same seed + same data ⇒ same model
//! - Predictions clipped to the training rating scale
//! - Cold-start: unseen ids degrade to mean/bias estimates, never an error
//!
//! ### Personalized Recommender
//! Ranks the movies a user has not rated by predicted rating.
//!
//! ## Example Usage
//!
//! ```ignore
//! use latent::{SvdConfig, SvdTrainer, recommend};
//!
//! let model = SvdTrainer::new(SvdConfig::default()).train(&table)?;
//! let estimate = model.predict(42, 1);
//! let picks = recommend(&model, &table, 42, 8);
//! ```

// Public modules
pub mod error;
pub mod model;
pub mod recommend;

// Re-export commonly used types
pub use error::{Result, TrainError};
pub use model::{LatentModel, SvdConfig, SvdTrainer};
pub use recommend::{Recommendation, recommend};
