//! # Rating Store Crate
//!
//! This crate handles loading, validating, and joining the rating dataset.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Rating, Movie, RatingScale)
//! - **parser**: Parse the delimited sources with header validation
//! - **table**: The immutable RatingTable with its indices and version
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use rating_store::{RatingTable, RatingScale};
//! use std::path::Path;
//!
//! let table = RatingTable::load(
//!     Path::new("data/ratings.csv"),
//!     Path::new("data/movies.csv"),
//!     Path::new("data/links.csv"),
//!     RatingScale::default(),
//! )?;
//!
//! let (users, movies, ratings) = table.counts();
//! println!("{} users rated {} movies ({} ratings)", users, movies, ratings);
//! ```
//!
//! Loading is the only operation in the workspace that touches durable
//! storage; everything downstream consumes the in-memory table read-only.

// Public modules
pub mod error;
pub mod parser;
pub mod table;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use table::RatingTable;
pub use types::{Movie, MovieId, Rating, RatingScale, UserId};

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn write_temp(name: &str, content: &str) -> PathBuf {
        let path =
            std::env::temp_dir().join(format!("rating-store-lib-{}-{}", std::process::id(), name));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_end_to_end() {
        let ratings = write_temp(
            "ratings.csv",
            "userId,movieId,rating,timestamp\n\
             1,10,5.0,100\n\
             1,20,1.0,101\n\
             2,10,4.0,102\n\
             2,20,2.0,103\n\
             3,10,5.0,104\n\
             3,999,5.0,105\n",
        );
        let movies = write_temp(
            "movies.csv",
            "movieId,title,genres\n10,Alpha (1999),Drama\n20,Beta (2001),Comedy\n",
        );
        let links = write_temp("links.csv", "movieId,imdbId,tmdbId\n10,111,862\n20,222,\n");

        let table = RatingTable::load(&ratings, &movies, &links, RatingScale::default()).unwrap();

        let (users, movie_count, rating_count) = table.counts();
        assert_eq!(users, 3);
        assert_eq!(movie_count, 2);
        // The rating for unknown movie 999 is dropped by the inner join
        assert_eq!(rating_count, 5);

        // Left join keeps unmatched external ids null
        assert_eq!(table.movie(10).unwrap().tmdb_id, Some(862));
        assert_eq!(table.movie(20).unwrap().tmdb_id, None);
    }

    #[test]
    fn test_load_missing_rating_column_fails() {
        let ratings = write_temp("ratings-bad.csv", "userId,movieId\n1,10\n");
        let movies = write_temp("movies-min.csv", "movieId,title\n10,Alpha\n");
        let links = write_temp("links-min.csv", "movieId,tmdbId\n10,862\n");

        let err =
            RatingTable::load(&ratings, &movies, &links, RatingScale::default()).unwrap_err();
        assert!(matches!(err, DataLoadError::MissingColumn { .. }));
    }
}
