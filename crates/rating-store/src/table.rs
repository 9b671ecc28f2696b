//! The RatingTable: the engine's immutable, validated view of the dataset.
//!
//! A table is built once per dataset version (from files via
//! [`RatingTable::load`] or in memory via [`RatingTable::from_parts`]) and
//! never mutated afterwards. Every derived artifact (similarity matrix,
//! latent model) is keyed by the table's content [`RatingTable::version`],
//! so callers can tell whether a cached artifact still matches the data it
//! was computed from.

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use tracing::{debug, info};

/// Immutable snapshot of the joined rating/item data.
#[derive(Debug)]
pub struct RatingTable {
    movies: HashMap<MovieId, Movie>,

    /// Deduplicated ratings in first-appearance order.
    ///
    /// Duplicate (user, movie) pairs are resolved last-write-wins: the
    /// latest row's value replaces the earlier one in place, so the
    /// stream position of the first occurrence is preserved for stable
    /// tie-breaking downstream.
    ratings: Vec<Rating>,

    // Rating indices for fast lookups
    user_ratings: HashMap<UserId, Vec<Rating>>,
    movie_ratings: HashMap<MovieId, Vec<Rating>>,

    scale: RatingScale,
    version: u64,
}

impl RatingTable {
    /// Load and join the three delimited sources into a table.
    ///
    /// - movies ⟕ links: unmatched movies keep `tmdb_id = None`
    /// - ratings ⨝ movies: ratings referencing unknown movies are dropped
    ///   silently (logged at debug), per the loader contract
    ///
    /// The three files are parsed in parallel.
    pub fn load(
        ratings_path: &Path,
        movies_path: &Path,
        links_path: &Path,
        scale: RatingScale,
    ) -> Result<Self> {
        info!(
            "Loading rating dataset: {}, {}, {}",
            ratings_path.display(),
            movies_path.display(),
            links_path.display()
        );

        let ((ratings, movies), links) = rayon::join(
            || {
                rayon::join(
                    || parser::parse_ratings(ratings_path, scale),
                    || parser::parse_movies(movies_path),
                )
            },
            || parser::parse_links(links_path),
        );
        let ratings = ratings?;
        let mut movies = movies?;
        let links = links?;

        // Left join: movies keep a null external id when links has no row
        for movie in &mut movies {
            movie.tmdb_id = links.get(&movie.id).copied();
        }

        info!(
            "Parsed {} ratings, {} movies, {} external ids",
            ratings.len(),
            movies.len(),
            links.len()
        );

        Self::from_parts(movies, ratings, scale)
    }

    /// Build a table from already-parsed records.
    ///
    /// This is the single construction path: it validates the scale
    /// invariant, performs the ratings ⨝ movies inner join, deduplicates
    /// (user, movie) pairs last-write-wins, builds the per-user and
    /// per-movie indices, and fingerprints the content.
    pub fn from_parts(
        movies: Vec<Movie>,
        ratings: Vec<Rating>,
        scale: RatingScale,
    ) -> Result<Self> {
        let movies: HashMap<MovieId, Movie> = movies.into_iter().map(|m| (m.id, m)).collect();

        let mut deduped: Vec<Rating> = Vec::with_capacity(ratings.len());
        let mut seen: HashMap<(UserId, MovieId), usize> = HashMap::with_capacity(ratings.len());
        let mut dropped = 0usize;

        for rating in ratings {
            if !scale.contains(rating.rating) {
                return Err(DataLoadError::InvalidValue {
                    field: "rating".to_string(),
                    value: rating.rating.to_string(),
                });
            }
            // Inner join with movies: unknown items are dropped, not an error
            if !movies.contains_key(&rating.movie_id) {
                dropped += 1;
                continue;
            }
            match seen.entry((rating.user_id, rating.movie_id)) {
                std::collections::hash_map::Entry::Occupied(slot) => {
                    // Last write wins, first-appearance position kept
                    deduped[*slot.get()] = rating;
                }
                std::collections::hash_map::Entry::Vacant(slot) => {
                    slot.insert(deduped.len());
                    deduped.push(rating);
                }
            }
        }

        if dropped > 0 {
            debug!("Dropped {} ratings referencing unknown movies", dropped);
        }

        let mut user_ratings: HashMap<UserId, Vec<Rating>> = HashMap::new();
        let mut movie_ratings: HashMap<MovieId, Vec<Rating>> = HashMap::new();
        for rating in &deduped {
            user_ratings.entry(rating.user_id).or_default().push(*rating);
            movie_ratings.entry(rating.movie_id).or_default().push(*rating);
        }

        let version = fingerprint(&movies, &deduped, scale);

        Ok(Self {
            movies,
            ratings: deduped,
            user_ratings,
            movie_ratings,
            scale,
            version,
        })
    }

    /// Get a movie by id
    pub fn movie(&self, id: MovieId) -> Option<&Movie> {
        self.movies.get(&id)
    }

    /// Iterate over all movies (no particular order)
    pub fn movies(&self) -> impl Iterator<Item = &Movie> {
        self.movies.values()
    }

    /// All movie ids, sorted ascending.
    ///
    /// Derived builds use this as their canonical item ordering so that
    /// the same table always produces the same matrices.
    pub fn movie_ids(&self) -> Vec<MovieId> {
        let mut ids: Vec<MovieId> = self.movies.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// All user ids, sorted ascending
    pub fn user_ids(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.user_ratings.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// All ratings in first-appearance order
    pub fn ratings(&self) -> &[Rating] {
        &self.ratings
    }

    /// All ratings made by a user (empty slice if unknown)
    pub fn user_ratings(&self, user_id: UserId) -> &[Rating] {
        self.user_ratings
            .get(&user_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// All ratings received by a movie (empty slice if unknown)
    pub fn movie_ratings(&self, movie_id: MovieId) -> &[Rating] {
        self.movie_ratings
            .get(&movie_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// (users, movies, ratings) counts
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.user_ratings.len(), self.movies.len(), self.ratings.len())
    }

    /// The scale ratings were validated against
    pub fn scale(&self) -> RatingScale {
        self.scale
    }

    /// Content fingerprint of this table.
    ///
    /// Two tables holding the same movies, ratings, and scale share a
    /// version regardless of source row order.
    pub fn version(&self) -> u64 {
        self.version
    }
}

/// Order-independent content hash over movies, ratings, and scale.
fn fingerprint(movies: &HashMap<MovieId, Movie>, ratings: &[Rating], scale: RatingScale) -> u64 {
    let mut acc: u64 = 0;

    for rating in ratings {
        let mut h = DefaultHasher::new();
        rating.user_id.hash(&mut h);
        rating.movie_id.hash(&mut h);
        rating.rating.to_bits().hash(&mut h);
        rating.timestamp.hash(&mut h);
        acc = acc.wrapping_add(h.finish());
    }

    for movie in movies.values() {
        let mut h = DefaultHasher::new();
        movie.id.hash(&mut h);
        movie.title.hash(&mut h);
        movie.genres.hash(&mut h);
        movie.tmdb_id.hash(&mut h);
        acc = acc.wrapping_add(h.finish());
    }

    let mut h = DefaultHasher::new();
    scale.min.to_bits().hash(&mut h);
    scale.max.to_bits().hash(&mut h);
    acc.wrapping_add(h.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: MovieId, title: &str) -> Movie {
        Movie {
            id,
            title: title.to_string(),
            genres: vec![],
            tmdb_id: None,
        }
    }

    fn rating(user_id: UserId, movie_id: MovieId, value: f32) -> Rating {
        Rating {
            user_id,
            movie_id,
            rating: value,
            timestamp: None,
        }
    }

    #[test]
    fn test_duplicate_ratings_last_write_wins() {
        let table = RatingTable::from_parts(
            vec![movie(10, "A"), movie(20, "B")],
            vec![rating(1, 10, 2.0), rating(1, 20, 3.0), rating(1, 10, 5.0)],
            RatingScale::default(),
        )
        .unwrap();

        // Two distinct pairs remain, first-appearance order preserved
        assert_eq!(table.ratings().len(), 2);
        assert_eq!(table.ratings()[0].movie_id, 10);
        assert_eq!(table.ratings()[0].rating, 5.0);
        assert_eq!(table.user_ratings(1).len(), 2);
    }

    #[test]
    fn test_ratings_for_unknown_movies_dropped() {
        let table = RatingTable::from_parts(
            vec![movie(10, "A")],
            vec![rating(1, 10, 4.0), rating(1, 999, 4.0)],
            RatingScale::default(),
        )
        .unwrap();

        assert_eq!(table.ratings().len(), 1);
        assert!(table.movie_ratings(999).is_empty());
    }

    #[test]
    fn test_out_of_scale_rating_rejected() {
        let result = RatingTable::from_parts(
            vec![movie(10, "A")],
            vec![rating(1, 10, 42.0)],
            RatingScale::default(),
        );
        assert!(matches!(result, Err(DataLoadError::InvalidValue { .. })));
    }

    #[test]
    fn test_version_is_order_independent() {
        let movies = vec![movie(10, "A"), movie(20, "B")];
        let a = RatingTable::from_parts(
            movies.clone(),
            vec![rating(1, 10, 4.0), rating(2, 20, 3.0)],
            RatingScale::default(),
        )
        .unwrap();
        let b = RatingTable::from_parts(
            movies,
            vec![rating(2, 20, 3.0), rating(1, 10, 4.0)],
            RatingScale::default(),
        )
        .unwrap();

        assert_eq!(a.version(), b.version());
    }

    #[test]
    fn test_version_changes_with_data() {
        let movies = vec![movie(10, "A")];
        let a = RatingTable::from_parts(
            movies.clone(),
            vec![rating(1, 10, 4.0)],
            RatingScale::default(),
        )
        .unwrap();
        let b = RatingTable::from_parts(
            movies,
            vec![rating(1, 10, 4.5)],
            RatingScale::default(),
        )
        .unwrap();

        assert_ne!(a.version(), b.version());
    }

    #[test]
    fn test_sorted_id_views() {
        let table = RatingTable::from_parts(
            vec![movie(20, "B"), movie(10, "A")],
            vec![rating(5, 20, 4.0), rating(2, 10, 3.0)],
            RatingScale::default(),
        )
        .unwrap();

        assert_eq!(table.movie_ids(), vec![10, 20]);
        assert_eq!(table.user_ids(), vec![2, 5]);
    }
}
