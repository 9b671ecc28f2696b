//! Core domain types for the rating dataset.
//!
//! Everything the engine computes is derived from two entities: a [`Movie`]
//! (item metadata plus the optional external display-asset id) and a
//! [`Rating`] (one user's score for one movie). The [`RatingScale`] captures
//! the closed interval ratings are allowed to live in.

use serde::{Deserialize, Serialize};

/// Unique identifier for a user
pub type UserId = u32;

/// Unique identifier for a movie
pub type MovieId = u32;

/// A single rating given by a user to a movie.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub movie_id: MovieId,
    /// Rating value, within the table's [`RatingScale`]
    pub rating: f32,
    /// Unix timestamp of the rating event, when the source provides one
    pub timestamp: Option<i64>,
}

/// A movie with its display metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    /// Genre labels as they appear in the source (pipe-separated column)
    pub genres: Vec<String>,
    /// External id used by a presentation layer to resolve poster assets.
    ///
    /// `None` when the id-mapping source has no row for this movie; the
    /// engine never resolves assets itself, it only carries the id through.
    pub tmdb_id: Option<u32>,
}

/// Closed interval of admissible rating values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingScale {
    pub min: f32,
    pub max: f32,
}

impl RatingScale {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Whether a rating value lies within the scale
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamp an estimate back into the scale
    pub fn clip(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }
}

impl Default for RatingScale {
    /// MovieLens half-star scale
    fn default() -> Self {
        Self::new(0.5, 5.0)
    }
}
