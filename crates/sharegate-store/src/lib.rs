//! # Sharegate Store
//!
//! Storage abstraction for Sharegate. Provides a trait-based interface over
//! an opaque, durable key-value blob store, with SQLite and in-memory
//! implementations.
//!
//! ## Overview
//!
//! The permission layer never talks to a concrete backend. It goes through
//! the [`BlobStore`] trait, which models the four operations a decentralized
//! storage client offers: put, get, delete and prefix listing.
//!
//! ## Key Types
//!
//! - [`BlobStore`] - The async trait for all storage operations
//! - [`SqliteBlobStore`] - SQLite-based persistent storage
//! - [`MemoryBlobStore`] - In-memory storage for tests
//! - [`BlobEntry`] - One child returned by a prefix listing
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use sharegate_store::{BlobStore, SqliteBlobStore};
//!
//! async fn example() {
//!     let store = SqliteBlobStore::open("blobs.db").unwrap();
//!
//!     store.put("permissions/ns/group-1/0xab", Bytes::from_static(b"..")).await.unwrap();
//!     let entries = store.list("permissions/ns/group-1").await.unwrap();
//!     assert_eq!(entries.len(), 1);
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Hierarchical keys**: paths are `/`-separated; listing returns direct children only
//! - **Idempotent deletes**: deleting a missing path is not an error
//! - **Per-blob atomicity**: each put/delete is atomic, nothing spans blobs

pub mod error;
pub mod memory;
pub mod schema;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryBlobStore;
pub use sqlite::SqliteBlobStore;
pub use traits::{join_path, list_children, validate_path, BlobEntry, BlobStore};
