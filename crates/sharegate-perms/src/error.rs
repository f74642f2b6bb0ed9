//! Error types for the permissions storage module.

use thiserror::Error;

/// Errors that can occur while sealing, opening or persisting permissions.
#[derive(Debug, Error)]
pub enum PermsError {
    /// Encryption error.
    #[error("encryption error: {0}")]
    EncryptionError(String),

    /// Decryption error.
    #[error("decryption error: {0}")]
    DecryptionError(String),

    /// Envelope or record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// A stored record does not belong at the path it was read from.
    #[error("corrupt record at {path}: {reason}")]
    Corrupt { path: String, reason: String },

    /// Invalid key material.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Blob store error.
    #[error("store error: {0}")]
    Store(#[from] sharegate_store::StoreError),

    /// Record failed validation.
    #[error("validation error: {0}")]
    Validation(#[from] sharegate_core::ValidationError),
}

/// Result type for permission storage operations.
pub type Result<T> = std::result::Result<T, PermsError>;
