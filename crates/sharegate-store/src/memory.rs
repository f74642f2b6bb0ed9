//! In-memory implementation of the BlobStore trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;
use crate::traits::{list_children, validate_path, BlobEntry, BlobStore};

/// In-memory blob store.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
/// Operation counters let tests assert whether a code path reached the store.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<BTreeMap<String, Bytes>>,
    gets: AtomicUsize,
    lists: AtomicUsize,
    puts: AtomicUsize,
}

impl MemoryBlobStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the store holds no blobs.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All stored paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.blobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Overwrite a blob without validation. Used to plant corrupt data in tests.
    pub fn insert_raw(&self, path: impl Into<String>, bytes: impl Into<Bytes>) {
        self.blobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into(), bytes.into());
    }

    /// Number of `get` calls served so far.
    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::Relaxed)
    }

    /// Number of `list` calls served so far.
    pub fn list_count(&self) -> usize {
        self.lists.load(Ordering::Relaxed)
    }

    /// Number of `put` calls served so far.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, path: &str, bytes: Bytes) -> Result<()> {
        validate_path(path)?;
        self.puts.fetch_add(1, Ordering::Relaxed);

        let mut blobs = self.blobs.write().unwrap_or_else(PoisonError::into_inner);
        blobs.insert(path.to_string(), bytes);
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Option<Bytes>> {
        self.gets.fetch_add(1, Ordering::Relaxed);

        let blobs = self.blobs.read().unwrap_or_else(PoisonError::into_inner);
        Ok(blobs.get(path).cloned())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<BlobEntry>> {
        self.lists.fetch_add(1, Ordering::Relaxed);

        let blobs = self.blobs.read().unwrap_or_else(PoisonError::into_inner);
        Ok(list_children(prefix, blobs.keys().map(String::as_str)))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let mut blobs = self.blobs.write().unwrap_or_else(PoisonError::into_inner);
        blobs.remove(path);
        Ok(())
    }
}
