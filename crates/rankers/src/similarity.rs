//! Item-to-item similarity via cosine over user rating vectors.
//!
//! ## Algorithm
//! 1. Build a dense user×movie matrix with missing ratings filled as 0.
//!    Filling with zero treats "never rated" as a zero preference signal
//!    rather than "unknown" — a deliberate, documented approximation.
//! 2. For each pair of movie columns, compute
//!    `sim(i, j) = dot(vi, vj) / (||vi|| * ||vj||)`, defining `sim = 0`
//!    when either norm is 0.
//! 3. `similar_to` ranks all other movies by similarity descending.
//!
//! Building is O(movies² × users) and treated as a batch operation:
//! callers hold the matrix in a version-keyed cache and rebuild only when
//! the table changes. Pair computation is rayon-parallel.

use crate::error::{RankError, Result};
use rating_store::{MovieId, RatingTable};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// One row of a "movies similar to X" ranking.
#[derive(Debug, Clone, Serialize)]
pub struct SimilarMovie {
    pub movie_id: MovieId,
    pub title: String,
    pub tmdb_id: Option<u32>,
    pub score: f32,
}

/// Symmetric movie×movie cosine similarity matrix.
///
/// Valid for exactly one table version; the engine facade checks
/// [`SimilarityMatrix::version`] before serving cached queries.
pub struct SimilarityMatrix {
    /// Column order: movie ids ascending (the table's canonical ordering)
    movie_ids: Vec<MovieId>,
    index: HashMap<MovieId, usize>,
    /// Row-major movies×movies scores
    scores: Vec<f32>,
    version: u64,
}

impl SimilarityMatrix {
    /// Build the full pairwise matrix from a table.
    #[instrument(skip(table), fields(version = table.version()))]
    pub fn build(table: &RatingTable) -> Self {
        let start = Instant::now();

        let movie_ids = table.movie_ids();
        let user_ids = table.user_ids();
        let n_movies = movie_ids.len();
        let n_users = user_ids.len();

        let user_index: HashMap<_, _> = user_ids
            .iter()
            .enumerate()
            .map(|(idx, &id)| (id, idx))
            .collect();

        // Dense zero-filled rating column per movie
        let columns: Vec<Vec<f32>> = movie_ids
            .par_iter()
            .map(|&movie_id| {
                let mut column = vec![0.0f32; n_users];
                for rating in table.movie_ratings(movie_id) {
                    column[user_index[&rating.user_id]] = rating.rating;
                }
                column
            })
            .collect();

        let norms: Vec<f32> = columns
            .par_iter()
            .map(|column| column.iter().map(|v| v * v).sum::<f32>().sqrt())
            .collect();

        let scores: Vec<f32> = (0..n_movies)
            .into_par_iter()
            .flat_map_iter(|i| {
                let columns = &columns;
                let norms = &norms;
                (0..n_movies).map(move |j| {
                    if norms[i] == 0.0 || norms[j] == 0.0 {
                        return 0.0;
                    }
                    let dot: f32 = columns[i]
                        .iter()
                        .zip(columns[j].iter())
                        .map(|(a, b)| a * b)
                        .sum();
                    dot / (norms[i] * norms[j])
                })
            })
            .collect();

        info!(
            "Built {}x{} similarity matrix over {} users in {:?}",
            n_movies,
            n_movies,
            n_users,
            start.elapsed()
        );

        let index = movie_ids_index(&movie_ids);
        Self {
            movie_ids,
            index,
            scores,
            version: table.version(),
        }
    }

    /// Number of movies covered by the matrix
    pub fn len(&self) -> usize {
        self.movie_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movie_ids.is_empty()
    }

    /// Table version this matrix was built from
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Pairwise score, or None if either movie is outside the matrix
    pub fn score(&self, a: MovieId, b: MovieId) -> Option<f32> {
        let i = *self.index.get(&a)?;
        let j = *self.index.get(&b)?;
        Some(self.scores[i * self.movie_ids.len() + j])
    }

    /// Up to `n` movies most similar to `movie_id`, excluding itself.
    ///
    /// Ties are broken by movie id ascending so the ranking is
    /// deterministic. The `table` supplies display metadata and must be
    /// the one the matrix was built from.
    pub fn similar_to(
        &self,
        table: &RatingTable,
        movie_id: MovieId,
        n: usize,
    ) -> Result<Vec<SimilarMovie>> {
        let query = *self
            .index
            .get(&movie_id)
            .ok_or(RankError::UnknownItem { movie_id })?;

        let row = &self.scores[query * self.movie_ids.len()..(query + 1) * self.movie_ids.len()];
        let mut ranked: Vec<(MovieId, f32)> = self
            .movie_ids
            .iter()
            .zip(row.iter())
            .filter(|&(&other, _)| other != movie_id)
            .map(|(&other, &score)| (other, score))
            .collect();

        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(n);

        debug!("Found {} similar movies for {}", ranked.len(), movie_id);

        Ok(ranked
            .into_iter()
            .filter_map(|(other, score)| {
                let movie = table.movie(other)?;
                Some(SimilarMovie {
                    movie_id: other,
                    title: movie.title.clone(),
                    tmdb_id: movie.tmdb_id,
                    score,
                })
            })
            .collect())
    }
}

fn movie_ids_index(movie_ids: &[MovieId]) -> HashMap<MovieId, usize> {
    movie_ids
        .iter()
        .enumerate()
        .map(|(idx, &id)| (id, idx))
        .collect()
}
