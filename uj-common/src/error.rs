//! Common error types for University Journal

use thiserror::Error;

use crate::schema::ValidationErrors;

/// Common result type for University Journal operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the journal crates
#[derive(Error, Debug)]
pub enum Error {
    /// Form input failed validation; carries the first message per field
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Database operation error (wraps sqlx::Error)
    ///
    /// Callers treat this as an opaque persistence failure.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Table export error (PDF rendering, missing font)
    #[error("Export error: {0}")]
    Export(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
