//! Error types for ranking queries.

use rating_store::MovieId;
use thiserror::Error;

/// Errors raised by ranking queries.
///
/// These are recoverable: a caller showing a "similar movies" shelf should
/// render a no-data state rather than fail the whole page.
#[derive(Error, Debug)]
pub enum RankError {
    /// The queried movie does not exist in the table the matrix was built from
    #[error("Unknown movie id {movie_id}")]
    UnknownItem { movie_id: MovieId },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, RankError>;
