//! Error types for Sharegate Core.

use thiserror::Error;

/// Validation errors for identifiers, enum values and grant shapes.
///
/// Each precondition of a grant or revoke has its own variant so hosts can
/// report exactly which input was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("resource id must not be empty")]
    EmptyResourceId,

    #[error("invalid resource id {0:?}: must not contain '/' or control characters")]
    InvalidResourceId(String),

    #[error("principal id must not be empty")]
    EmptyPrincipal,

    #[error("malformed principal id {0:?}: expected a 0x-prefixed 20-byte hex address")]
    MalformedPrincipal(String),

    #[error("cannot grant a permission to yourself")]
    SelfGrant,

    #[error("cannot revoke owner permission")]
    SelfRevoke,

    #[error("invalid permission level {0:?}: expected reader, writer or admin")]
    InvalidLevel(String),

    #[error("invalid resource type {0:?}: expected group or database")]
    InvalidResourceType(String),

    #[error("malformed permission record: {0}")]
    MalformedRecord(String),
}
