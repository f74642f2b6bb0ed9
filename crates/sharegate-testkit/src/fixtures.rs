//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use sharegate_core::{PrincipalId, ADDRESS_LEN};
use sharegate_perms::{
    Encryptor, PermissionStorage, SealedBoxEncryptor, StorageConfig, StorageSecret,
};
use sharegate_store::{BlobStore, MemoryBlobStore};

/// Deterministic principal whose address ends in `n`.
pub fn principal(n: u8) -> PrincipalId {
    let mut bytes = [0u8; ADDRESS_LEN];
    bytes[0] = 0xa0;
    bytes[ADDRESS_LEN - 1] = n;
    PrincipalId::from_bytes(bytes)
}

/// String form of [`principal`], as a host would pass it in.
pub fn address(n: u8) -> String {
    principal(n).to_string()
}

/// A test fixture with an encryptor and memory store.
pub struct TestFixture {
    pub store: Arc<MemoryBlobStore>,
    pub encryptor: Arc<SealedBoxEncryptor>,
    pub namespace: PrincipalId,
}

impl TestFixture {
    /// Create a new test fixture with a random storage key.
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryBlobStore::new()),
            encryptor: Arc::new(SealedBoxEncryptor::generate()),
            namespace: principal(0),
        }
    }

    /// Create with a deterministic storage key from seed.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self {
            store: Arc::new(MemoryBlobStore::new()),
            encryptor: Arc::new(SealedBoxEncryptor::new(StorageSecret::from_bytes(seed))),
            namespace: principal(seed[0]),
        }
    }

    /// Storage over the fixture's memory store.
    pub fn storage(&self) -> PermissionStorage {
        self.storage_with_config(StorageConfig::default())
    }

    /// Storage over the fixture's memory store with an explicit configuration.
    pub fn storage_with_config(&self, config: StorageConfig) -> PermissionStorage {
        self.storage_over(self.store.clone(), config)
    }

    /// Storage over another blob store, sealed with the fixture's key.
    pub fn storage_over(&self, store: Arc<dyn BlobStore>, config: StorageConfig) -> PermissionStorage {
        let encryptor: Arc<dyn Encryptor> = self.encryptor.clone();
        PermissionStorage::with_config(store, encryptor, self.namespace.clone(), config)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create multiple independent fixtures, one per security boundary.
pub fn multi_party_fixtures(count: usize) -> Vec<TestFixture> {
    (0..count)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[0] = i as u8;
            TestFixture::with_seed(seed)
        })
        .collect()
}
