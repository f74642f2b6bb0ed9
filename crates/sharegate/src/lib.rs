//! # Sharegate
//!
//! Access control for shared groups and databases.
//!
//! ## Overview
//!
//! Sharegate decides who may read, write or administer a shared resource:
//!
//! - **Grants**: a grantee receives `reader`, `writer` or `admin` on a resource
//! - **Revokes**: grants are soft-deleted, never physically removed
//! - **Ownership**: a registered owner is always admin and alone may manage grants
//! - **Cascades**: a grant on a group can be repeated on its linked databases
//!
//! Every record is sealed with an [`Encryptor`](perms::Encryptor) before it
//! reaches a [`BlobStore`](store::BlobStore).
//!
//! ## Key Concepts
//!
//! - **Permission**: one grantee's access to one resource. Re-granting an
//!   active grantee updates it in place; granting after a revoke creates a
//!   fresh record.
//! - **Cascade**: one hop from a group to its linked databases. Each linked
//!   database succeeds or fails on its own and is reported in the outcome.
//! - **Unowned resources**: governed by [`UnownedPolicy`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use sharegate::{ManagerConfig, PermissionManager};
//! use sharegate::core::{PermissionLevel, PrincipalId, ResourceType};
//! use sharegate::perms::{PermissionStorage, SealedBoxEncryptor};
//! use sharegate::store::SqliteBlobStore;
//!
//! async fn example() -> sharegate::Result<()> {
//!     let owner = "0x1111111111111111111111111111111111111111";
//!     let alice = "0x2222222222222222222222222222222222222222";
//!
//!     let store = SqliteBlobStore::open("permissions.db").unwrap();
//!     let storage = PermissionStorage::new(
//!         Arc::new(store),
//!         Arc::new(SealedBoxEncryptor::generate()),
//!         PrincipalId::parse(owner)?,
//!     );
//!     let manager = PermissionManager::new(Arc::new(storage), ManagerConfig::default());
//!
//!     manager.set_resource_owner("team-notes", owner).await?;
//!     manager.link_databases("team-notes", ["notes-db"]).await?;
//!
//!     let outcome = manager
//!         .grant_permission("team-notes", ResourceType::Group, owner, alice, PermissionLevel::Writer, true)
//!         .await?;
//!     assert!(outcome.cascaded.iter().all(|r| r.is_ok()));
//!
//!     assert_eq!(
//!         manager.check_permission("notes-db", alice).await?,
//!         Some(PermissionLevel::Writer)
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `sharegate::core` - Identifiers, records and validation
//! - `sharegate::store` - Blob storage abstraction, memory and SQLite
//! - `sharegate::perms` - Sealed envelopes and the cached permission storage

pub mod cascade;
pub mod config;
pub mod error;
pub mod manager;
pub mod registry;

// Re-export component crates
pub use sharegate_core as core;
pub use sharegate_perms as perms;
pub use sharegate_store as store;

// Re-export main types for convenience
pub use cascade::{CascadeReport, CascadeResult, CascadeStatus, GrantOutcome, RevokeOutcome};
pub use config::{ManagerConfig, UnownedPolicy};
pub use error::{AccessError, ErrorKind, Result};
pub use manager::PermissionManager;

pub use sharegate_core::{
    Permission, PermissionId, PermissionLevel, PermissionSummary, PrincipalId, ResourceId,
    ResourceType,
};
