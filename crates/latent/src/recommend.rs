//! Personalized ranking of a user's unrated movies.
//!
//! ## Algorithm
//! 1. Enumerate every movie the user has NOT rated (the anti-set)
//! 2. Predict a rating for each via the latent model
//! 3. Sort by estimate descending, ties by movie id ascending
//! 4. Return the top n
//!
//! A user who rated everything, or an n beyond the candidate count, yields
//! a short or empty list rather than an error; unknown users get
//! global-mean/bias estimates (cold start), so this never fails.

use crate::model::LatentModel;
use rating_store::{MovieId, RatingTable, UserId};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, instrument};

/// One personalized recommendation row.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub movie_id: MovieId,
    pub title: String,
    pub tmdb_id: Option<u32>,
    pub estimated_rating: f32,
}

/// Up to `n` unrated movies for `user_id`, best estimates first.
#[instrument(skip(model, table))]
pub fn recommend(
    model: &LatentModel,
    table: &RatingTable,
    user_id: UserId,
    n: usize,
) -> Vec<Recommendation> {
    let rated: HashSet<MovieId> = table
        .user_ratings(user_id)
        .iter()
        .map(|r| r.movie_id)
        .collect();

    // movie_ids() is sorted and unique, so ties already fall id-ascending
    // under a stable sort; the explicit tie-break keeps that guaranteed.
    let mut candidates: Vec<(MovieId, f32)> = table
        .movie_ids()
        .into_iter()
        .filter(|movie_id| !rated.contains(movie_id))
        .map(|movie_id| (movie_id, model.predict(user_id, movie_id)))
        .collect();

    candidates.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    candidates.truncate(n);

    debug!(
        "Recommending {} of {} unrated movies for user {}",
        candidates.len(),
        table.counts().1 - rated.len(),
        user_id
    );

    candidates
        .into_iter()
        .filter_map(|(movie_id, estimated_rating)| {
            let movie = table.movie(movie_id)?;
            Some(Recommendation {
                movie_id,
                title: movie.title.clone(),
                tmdb_id: movie.tmdb_id,
                estimated_rating,
            })
        })
        .collect()
}
