//! # Sharegate Core
//!
//! Pure types for the Sharegate permission subsystem: identifiers, the
//! permission record and its wire schema, and input validation.
//!
//! This crate contains no I/O, no storage, no encryption. Everything here is
//! plain data plus the rules for constructing it.
//!
//! ## Key Types
//!
//! - [`Permission`] - An access grant linking a grantee to a resource at a level
//! - [`ResourceId`] - Identifier of a shareable group or database
//! - [`PrincipalId`] - A normalized `0x` account address
//! - [`PermissionLevel`] - Ordered access level (`reader < writer < admin`)
//! - [`ResourceType`] - Either a group or a database
//!
//! ## Wire Schema
//!
//! [`Permission`] serializes to the camelCase JSON record persisted by the
//! storage layer, with `grantedAt` as an RFC 3339 string.

pub mod error;
pub mod permission;
pub mod types;
pub mod validation;

pub use error::ValidationError;
pub use permission::{Permission, PermissionLevel, PermissionSummary, ResourceType};
pub use types::{PermissionId, PrincipalId, ResourceId, ADDRESS_LEN};
pub use validation::{validate_grant, validate_revoke, GrantTarget, RevokeTarget};
