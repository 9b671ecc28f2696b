//! # Rankers Crate
//!
//! This crate implements the two table-driven rankings of the engine.
//!
//! ## Components
//!
//! ### Popularity Ranker
//! "Our top rated movies":
//! - Groups ratings per movie, computes count and mean
//! - Orders by (count desc, mean desc), stable on ties
//!
//! ### Item Similarity Ranker
//! "Movies similar to this one":
//! - Dense user×movie matrix, missing ratings filled with 0
//! - Pairwise cosine similarity between movie columns
//! - Batch-built once per table version, then queried cheaply
//!
//! ## Example Usage
//!
//! ```ignore
//! use rankers::{PopularityRanker, SimilarityMatrix};
//! use rating_store::RatingTable;
//! use std::sync::Arc;
//!
//! let table = Arc::new(RatingTable::load(ratings, movies, links, scale)?);
//!
//! let shelf = PopularityRanker::new(table.clone()).top_n(8);
//!
//! let matrix = SimilarityMatrix::build(&table);
//! let similar = matrix.similar_to(&table, 1, 8)?;
//! ```

// Public modules
pub mod error;
pub mod popularity;
pub mod similarity;

// Re-export commonly used types
pub use error::{RankError, Result};
pub use popularity::{PopularMovie, PopularityRanker};
pub use similarity::{SimilarMovie, SimilarityMatrix};
