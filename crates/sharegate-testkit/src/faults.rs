//! Fault injection for blob stores.
//!
//! [`FaultyBlobStore`] wraps a [`MemoryBlobStore`] and fails operations
//! whose path starts with one of the configured prefixes. Everything else
//! passes straight through.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;

use sharegate_store::{BlobEntry, BlobStore, MemoryBlobStore, Result, StoreError};

#[derive(Debug, Default)]
struct Faults {
    puts: Vec<String>,
    gets: Vec<String>,
    lists: Vec<String>,
    deletes: Vec<String>,
    missing_prefix_not_found: bool,
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Put,
    Get,
    List,
    Delete,
}

impl Faults {
    fn prefixes(&self, op: Op) -> &[String] {
        match op {
            Op::Put => &self.puts,
            Op::Get => &self.gets,
            Op::List => &self.lists,
            Op::Delete => &self.deletes,
        }
    }
}

/// A blob store that fails on demand.
#[derive(Default)]
pub struct FaultyBlobStore {
    inner: Arc<MemoryBlobStore>,
    faults: Mutex<Faults>,
}

impl FaultyBlobStore {
    /// Wrap a fresh memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing memory store.
    pub fn wrap(inner: Arc<MemoryBlobStore>) -> Self {
        Self {
            inner,
            faults: Mutex::default(),
        }
    }

    /// The underlying store, for planting or inspecting blobs.
    pub fn inner(&self) -> &Arc<MemoryBlobStore> {
        &self.inner
    }

    /// Fail every `put` under `prefix`.
    pub fn fail_puts_under(&self, prefix: impl Into<String>) {
        self.faults().puts.push(prefix.into());
    }

    /// Fail every `get` under `prefix`.
    pub fn fail_gets_under(&self, prefix: impl Into<String>) {
        self.faults().gets.push(prefix.into());
    }

    /// Fail every `list` under `prefix`.
    pub fn fail_lists_under(&self, prefix: impl Into<String>) {
        self.faults().lists.push(prefix.into());
    }

    /// Fail every `delete` under `prefix`.
    pub fn fail_deletes_under(&self, prefix: impl Into<String>) {
        self.faults().deletes.push(prefix.into());
    }

    /// Report listings of empty prefixes as `NotFound`, like object stores do.
    pub fn not_found_for_missing_prefixes(&self) {
        self.faults().missing_prefix_not_found = true;
    }

    /// Remove every configured fault.
    pub fn heal(&self) {
        *self.faults() = Faults::default();
    }

    fn faults(&self) -> std::sync::MutexGuard<'_, Faults> {
        self.faults.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn trip(&self, op: Op, path: &str) -> Result<()> {
        let faults = self.faults();
        if faults
            .prefixes(op)
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
        {
            return Err(StoreError::Backend(format!("injected {op:?} failure at {path}")));
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for FaultyBlobStore {
    async fn put(&self, path: &str, bytes: Bytes) -> Result<()> {
        self.trip(Op::Put, path)?;
        self.inner.put(path, bytes).await
    }

    async fn get(&self, path: &str) -> Result<Option<Bytes>> {
        self.trip(Op::Get, path)?;
        self.inner.get(path).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<BlobEntry>> {
        self.trip(Op::List, prefix)?;
        let missing_not_found = self.faults().missing_prefix_not_found;

        let entries = self.inner.list(prefix).await?;
        if entries.is_empty() && missing_not_found {
            return Err(StoreError::NotFound(prefix.to_string()));
        }
        Ok(entries)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.trip(Op::Delete, path)?;
        self.inner.delete(path).await
    }
}
