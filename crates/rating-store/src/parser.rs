//! Parsers for the delimited source files.
//!
//! The loader understands three MovieLens-style CSV sources:
//! - ratings.csv: userId,movieId,rating,timestamp
//! - movies.csv:  movieId,title,genres
//! - links.csv:   movieId,imdbId,tmdbId
//!
//! Exact column order is not assumed; columns are located by header name,
//! and a missing required column is a [`DataLoadError::MissingColumn`].
//! Titles may contain commas, so fields are split with quote handling.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Split one CSV line into fields, honoring double-quoted fields.
///
/// A `""` inside a quoted field is an escaped quote. This covers the
/// MovieLens exports; it is not a general-purpose CSV reader.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                chars.next();
                current.push('"');
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// One parsed source file: header names plus raw rows with line numbers.
struct CsvSource {
    file: String,
    header: Vec<String>,
    rows: Vec<(usize, Vec<String>)>,
}

impl CsvSource {
    fn read(path: &Path) -> Result<Self> {
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let content = fs::read_to_string(path)?;

        let mut lines = content.lines().enumerate();
        let header = match lines.next() {
            Some((_, line)) if !line.trim().is_empty() => split_csv_line(line.trim())
                .into_iter()
                .map(|h| h.trim().to_string())
                .collect(),
            _ => {
                return Err(DataLoadError::ParseError {
                    file,
                    line: 1,
                    reason: "missing header row".to_string(),
                });
            }
        };

        let rows = lines
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| (idx + 1, split_csv_line(line.trim())))
            .collect();

        Ok(Self { file, header, rows })
    }

    /// Index of a required column, by header name
    fn column(&self, name: &str) -> Result<usize> {
        self.header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DataLoadError::MissingColumn {
                file: self.file.clone(),
                column: name.to_string(),
            })
    }

    /// Index of an optional column, or None if the source doesn't carry it
    fn optional_column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// Raw field value at a column index, or a ParseError for short rows
    fn field<'a>(&self, line: usize, row: &'a [String], idx: usize, name: &str) -> Result<&'a str> {
        row.get(idx)
            .map(|s| s.trim())
            .ok_or_else(|| DataLoadError::ParseError {
                file: self.file.clone(),
                line,
                reason: format!("missing field '{}'", name),
            })
    }

    /// Parse a field into a target type, with positional error context
    fn parse<T: FromStr>(&self, line: usize, value: &str, name: &str) -> Result<T>
    where
        T::Err: std::fmt::Display,
    {
        value.parse().map_err(|e| DataLoadError::ParseError {
            file: self.file.clone(),
            line,
            reason: format!("invalid {}: {}", name, e),
        })
    }
}

/// Parse the ratings source.
///
/// Required columns: userId, movieId, rating. The timestamp column is
/// optional; when present, empty values are carried as `None`. A rating
/// value outside `scale` is rejected.
pub fn parse_ratings(path: &Path, scale: RatingScale) -> Result<Vec<Rating>> {
    let source = CsvSource::read(path)?;
    let user_col = source.column("userId")?;
    let movie_col = source.column("movieId")?;
    let rating_col = source.column("rating")?;
    let ts_col = source.optional_column("timestamp");

    let mut ratings = Vec::with_capacity(source.rows.len());
    for (line, row) in &source.rows {
        let user_id = source.parse(*line, source.field(*line, row, user_col, "userId")?, "userId")?;
        let movie_id =
            source.parse(*line, source.field(*line, row, movie_col, "movieId")?, "movieId")?;
        let rating: f32 =
            source.parse(*line, source.field(*line, row, rating_col, "rating")?, "rating")?;

        if !scale.contains(rating) {
            return Err(DataLoadError::InvalidValue {
                field: "rating".to_string(),
                value: rating.to_string(),
            });
        }

        let timestamp = match ts_col {
            Some(idx) => {
                let raw = source.field(*line, row, idx, "timestamp")?;
                if raw.is_empty() {
                    None
                } else {
                    Some(source.parse(*line, raw, "timestamp")?)
                }
            }
            None => None,
        };

        ratings.push(Rating {
            user_id,
            movie_id,
            rating,
            timestamp,
        });
    }
    Ok(ratings)
}

/// Parse the movies source.
///
/// Required columns: movieId, title. Genres are optional and
/// pipe-separated; the MovieLens `(no genres listed)` marker maps to an
/// empty list. The `tmdb_id` is left unset here and filled by the
/// links join in [`crate::RatingTable::load`].
pub fn parse_movies(path: &Path) -> Result<Vec<Movie>> {
    let source = CsvSource::read(path)?;
    let movie_col = source.column("movieId")?;
    let title_col = source.column("title")?;
    let genres_col = source.optional_column("genres");

    let mut movies = Vec::with_capacity(source.rows.len());
    for (line, row) in &source.rows {
        let id =
            source.parse(*line, source.field(*line, row, movie_col, "movieId")?, "movieId")?;
        let title = source.field(*line, row, title_col, "title")?.to_string();

        let genres = match genres_col {
            Some(idx) => parse_genres(source.field(*line, row, idx, "genres")?),
            None => Vec::new(),
        };

        movies.push(Movie {
            id,
            title,
            genres,
            tmdb_id: None,
        });
    }
    Ok(movies)
}

/// Parse the id-mapping source into movieId -> tmdbId.
///
/// Required columns: movieId, tmdbId. An empty tmdbId cell means the
/// movie has no external id (the join keeps it null); a non-numeric
/// movieId is an error because it is the join key.
pub fn parse_links(path: &Path) -> Result<HashMap<MovieId, u32>> {
    let source = CsvSource::read(path)?;
    let movie_col = source.column("movieId")?;
    let tmdb_col = source.column("tmdbId")?;

    let mut links = HashMap::with_capacity(source.rows.len());
    for (line, row) in &source.rows {
        let movie_id: MovieId =
            source.parse(*line, source.field(*line, row, movie_col, "movieId")?, "movieId")?;
        let raw = source.field(*line, row, tmdb_col, "tmdbId")?;
        if raw.is_empty() {
            continue;
        }
        let tmdb_id: u32 = source.parse(*line, raw, "tmdbId")?;
        links.insert(movie_id, tmdb_id);
    }
    Ok(links)
}

fn parse_genres(raw: &str) -> Vec<String> {
    if raw.is_empty() || raw == "(no genres listed)" {
        return Vec::new();
    }
    raw.split('|').map(|g| g.to_string()).collect()
}
