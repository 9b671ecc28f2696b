//! Error types for the rating-store crate.

use thiserror::Error;

/// Errors that can occur while loading and joining the rating dataset.
///
/// Loading is the only step that touches durable storage, so this is the
/// only place I/O failures can surface. Everything downstream works on an
/// already-validated [`crate::RatingTable`].
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// I/O error occurred while reading a source file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A required column is absent from a source header
    #[error("Missing column '{column}' in {file}")]
    MissingColumn { file: String, column: String },

    /// A row in a source file couldn't be parsed
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// A field had a value outside its allowed domain
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Data validation failed after parsing
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
