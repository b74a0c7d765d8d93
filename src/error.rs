//! Error types for docvault.

use thiserror::Error;

/// Common error type for docvault.
#[derive(Error, Debug)]
pub enum DocvaultError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// The file store and the index disagree about a document.
    #[error("consistency fault: {0}")]
    Consistency(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for DocvaultError {
    fn from(e: sqlx::Error) -> Self {
        DocvaultError::Database(e.to_string())
    }
}

/// Result type alias for docvault operations.
pub type Result<T> = std::result::Result<T, DocvaultError>;
