//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Path or prefix not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Path is empty or has empty segments.
    #[error("invalid path: {0:?}")]
    InvalidPath(String),

    /// Backend-specific failure (network client, remote service).
    #[error("backend error: {0}")]
    Backend(String),

    /// Database schema is not one this build can use.
    #[error("schema error: {0}")]
    Schema(String),

    /// A blocking task could not complete.
    #[error("task error: {0}")]
    Task(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
