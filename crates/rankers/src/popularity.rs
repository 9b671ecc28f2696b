//! Popularity ranking: top-N movies by rating volume and average.
//!
//! ## Algorithm
//! 1. Group ratings by movie; compute count and arithmetic mean per group
//! 2. Sort by (rating_count desc, avg_rating desc)
//! 3. Remaining ties keep the stable order in which each movie first
//!    appeared in the ratings stream
//!
//! No randomness anywhere; for a fixed table, `top_n` is idempotent and
//! `top_n(n)` is a prefix of `top_n(n + 1)`.

use rating_store::{MovieId, RatingTable};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// One row of the popularity ranking.
#[derive(Debug, Clone, Serialize)]
pub struct PopularMovie {
    pub movie_id: MovieId,
    pub title: String,
    pub tmdb_id: Option<u32>,
    pub avg_rating: f32,
    pub rating_count: u32,
}

/// Ranks movies by how many ratings they received, then how well they rated.
pub struct PopularityRanker {
    table: Arc<RatingTable>,
}

impl PopularityRanker {
    pub fn new(table: Arc<RatingTable>) -> Self {
        Self { table }
    }

    /// The top `n` movies, `min(n, distinct rated movies)` rows.
    #[instrument(skip(self))]
    pub fn top_n(&self, n: usize) -> Vec<PopularMovie> {
        // (sum, count) per movie, plus first-appearance order for stable ties
        let mut aggregates: HashMap<MovieId, (f64, u32)> = HashMap::new();
        let mut order: Vec<MovieId> = Vec::new();

        for rating in self.table.ratings() {
            let entry = aggregates.entry(rating.movie_id).or_insert_with(|| {
                order.push(rating.movie_id);
                (0.0, 0)
            });
            entry.0 += rating.rating as f64;
            entry.1 += 1;
        }

        let mut ranked: Vec<PopularMovie> = order
            .into_iter()
            .filter_map(|movie_id| {
                let (sum, count) = aggregates[&movie_id];
                let movie = self.table.movie(movie_id)?;
                Some(PopularMovie {
                    movie_id,
                    title: movie.title.clone(),
                    tmdb_id: movie.tmdb_id,
                    avg_rating: (sum / count as f64) as f32,
                    rating_count: count,
                })
            })
            .collect();

        // Stable sort: equal (count, avg) pairs stay in first-appearance order
        ranked.sort_by(|a, b| {
            b.rating_count
                .cmp(&a.rating_count)
                .then(b.avg_rating.total_cmp(&a.avg_rating))
        });
        ranked.truncate(n);

        debug!("Ranked {} popular movies", ranked.len());
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rating_store::{Movie, Rating, RatingScale};

    fn movie(id: MovieId, title: &str) -> Movie {
        Movie {
            id,
            title: title.to_string(),
            genres: vec![],
            tmdb_id: Some(id * 100),
        }
    }

    fn rating(user_id: u32, movie_id: MovieId, value: f32) -> Rating {
        Rating {
            user_id,
            movie_id,
            rating: value,
            timestamp: None,
        }
    }

    fn create_test_table() -> Arc<RatingTable> {
        // The worked example from the engine contract: movie 10 has three
        // ratings averaging 4.67, movie 20 has two averaging 1.5
        Arc::new(
            RatingTable::from_parts(
                vec![movie(10, "Alpha"), movie(20, "Beta")],
                vec![
                    rating(1, 10, 5.0),
                    rating(1, 20, 1.0),
                    rating(2, 10, 4.0),
                    rating(2, 20, 2.0),
                    rating(3, 10, 5.0),
                ],
                RatingScale::default(),
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_top_one_is_most_rated() {
        let ranker = PopularityRanker::new(create_test_table());
        let top = ranker.top_n(1);

        assert_eq!(top.len(), 1);
        assert_eq!(top[0].movie_id, 10);
        assert_eq!(top[0].rating_count, 3);
        assert!((top[0].avg_rating - 14.0 / 3.0).abs() < 1e-4);
        assert_eq!(top[0].tmdb_id, Some(1000));
    }

    #[test]
    fn test_ordering_count_then_avg() {
        let ranker = PopularityRanker::new(create_test_table());
        let top = ranker.top_n(10);

        assert_eq!(top.len(), 2);
        for pair in top.windows(2) {
            let better = (pair[0].rating_count, pair[0].avg_rating);
            let worse = (pair[1].rating_count, pair[1].avg_rating);
            assert!(
                better.0 > worse.0 || (better.0 == worse.0 && better.1 >= worse.1),
                "ranking out of order: {:?} before {:?}",
                better,
                worse
            );
        }
    }

    #[test]
    fn test_prefix_property() {
        let ranker = PopularityRanker::new(create_test_table());
        let one = ranker.top_n(1);
        let two = ranker.top_n(2);

        assert_eq!(one[0].movie_id, two[0].movie_id);
    }

    #[test]
    fn test_ties_keep_first_appearance_order() {
        // Movies 7 and 8 tie exactly on count and average; 7 appears first
        let table = Arc::new(
            RatingTable::from_parts(
                vec![movie(8, "Late"), movie(7, "Early")],
                vec![rating(1, 7, 3.0), rating(1, 8, 3.0), rating(2, 7, 3.0), rating(2, 8, 3.0)],
                RatingScale::default(),
            )
            .unwrap(),
        );
        let top = PopularityRanker::new(table).top_n(2);

        assert_eq!(top[0].movie_id, 7);
        assert_eq!(top[1].movie_id, 8);
    }

    #[test]
    fn test_n_larger_than_catalog() {
        let ranker = PopularityRanker::new(create_test_table());
        assert_eq!(ranker.top_n(50).len(), 2);
    }
}
