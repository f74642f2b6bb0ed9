//! Error types for the permission manager.

use sharegate_core::{PrincipalId, ResourceId, ValidationError};
use sharegate_perms::PermsError;
use thiserror::Error;

/// Errors that can occur during permission manager operations.
#[derive(Debug, Error)]
pub enum AccessError {
    /// Malformed input, invalid enum value or self-grant/self-revoke.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The requestor may not perform this operation on the resource.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// No active permission exists for the pair.
    #[error("no active permission for {grantee} on {resource_id}")]
    NotFound {
        resource_id: ResourceId,
        grantee: PrincipalId,
    },

    /// Durable write or delete failed.
    #[error("storage error: {0}")]
    Storage(#[from] PermsError),
}

/// Coarse classification for mapping errors onto a host protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    Forbidden,
    NotFound,
    ServerError,
}

impl AccessError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AccessError::Validation(_) => ErrorKind::BadRequest,
            AccessError::PermissionDenied(_) => ErrorKind::Forbidden,
            AccessError::NotFound { .. } => ErrorKind::NotFound,
            AccessError::Storage(_) => ErrorKind::ServerError,
        }
    }
}

/// Result type for permission manager operations.
pub type Result<T> = std::result::Result<T, AccessError>;
