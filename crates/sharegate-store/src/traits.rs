//! BlobStore trait: the abstract interface for blob persistence.
//!
//! This trait allows the permission layer to be storage-agnostic.
//! Implementations include SQLite (primary) and in-memory (for tests).

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{Result, StoreError};

/// One direct child of a listed prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobEntry {
    /// Final path segment of the child.
    pub name: String,
    /// True if the child itself holds a blob, false if it only has descendants.
    pub is_file: bool,
}

impl BlobEntry {
    /// Create a file entry.
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_file: true,
        }
    }

    /// Create a directory entry.
    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_file: false,
        }
    }
}

/// The BlobStore trait: async interface for opaque blob persistence.
///
/// # Design Notes
///
/// - **Atomic per blob**: each `put` and `delete` is atomic on its own path.
/// - **Not found is a value**: `get` returns `None` for a missing path.
/// - **Idempotent deletes**: deleting a missing path succeeds.
/// - **Listing**: `list` returns direct children of the prefix in a stable
///   order. Backends may return `StoreError::NotFound` for a prefix that has
///   never been written; callers must treat that as an empty listing.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write a blob, replacing any existing blob at the same path.
    async fn put(&self, path: &str, bytes: Bytes) -> Result<()>;

    /// Read a blob.
    async fn get(&self, path: &str) -> Result<Option<Bytes>>;

    /// List the direct children of a prefix.
    async fn list(&self, prefix: &str) -> Result<Vec<BlobEntry>>;

    /// Delete a blob. Succeeds if the path does not exist.
    async fn delete(&self, path: &str) -> Result<()>;
}

/// Join path segments with `/`.
pub fn join_path<I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut path = String::new();
    for segment in segments {
        if !path.is_empty() {
            path.push('/');
        }
        path.push_str(segment.as_ref());
    }
    path
}

/// Reject empty paths and paths with empty segments.
pub fn validate_path(path: &str) -> Result<()> {
    if path.is_empty() || path.split('/').any(str::is_empty) {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(())
}

/// Compute the direct children of `prefix` from a set of full blob paths.
///
/// Shared by every backend so listing semantics cannot drift between them.
/// Entries are sorted by name.
pub fn list_children<'a>(prefix: &str, paths: impl IntoIterator<Item = &'a str>) -> Vec<BlobEntry> {
    let base = format!("{}/", prefix.trim_end_matches('/'));
    let mut children: BTreeMap<String, bool> = BTreeMap::new();

    for path in paths {
        let Some(rest) = path.strip_prefix(&base) else {
            continue;
        };
        match rest.split_once('/') {
            Some((name, _)) => {
                children.entry(name.to_string()).or_insert(false);
            }
            None => {
                children.insert(rest.to_string(), true);
            }
        }
    }

    children
        .into_iter()
        .map(|(name, is_file)| BlobEntry { name, is_file })
        .collect()
}
