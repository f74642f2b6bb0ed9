//! Encrypted permission persistence with a read-through cache.
//!
//! Records live at `<root>/<namespace>/<resource>/<grantee>`, one sealed
//! envelope per blob. Superseded records are archived under
//! `<history_root>/<namespace>/<resource>/<grantee>/<permission id>`.
//!
//! Read paths favor availability: a missing or undecodable blob reads as
//! absent (with a warning), and one bad record never hides its siblings.
//! Write paths propagate every failure.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use sharegate_core::{Permission, PrincipalId, ResourceId};
use sharegate_store::{join_path, BlobEntry, BlobStore, StoreError};

use crate::encryptor::Encryptor;
use crate::envelope::StorageEnvelope;
use crate::error::{PermsError, Result};

/// Configuration for [`PermissionStorage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path prefix for current records.
    pub root: String,
    /// Path prefix for archived records.
    pub history_root: String,
    /// Whether reads are served from memory when possible.
    pub cache_enabled: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: "permissions".to_string(),
            history_root: "permission-history".to_string(),
            cache_enabled: true,
        }
    }
}

/// Cached records of one resource.
#[derive(Debug, Default)]
struct CacheBucket {
    /// At most one record per grantee, in listing order.
    records: Vec<Permission>,
    /// Set once the bucket has been filled from a full prefix listing.
    /// Only a complete bucket may answer `load_all`.
    complete: bool,
    /// Stamp of the last invalidation. A read that started under another
    /// stamp must not install what it read.
    generation: u64,
}

impl CacheBucket {
    fn get(&self, grantee: &PrincipalId) -> Option<&Permission> {
        self.records.iter().find(|p| &p.granted_to == grantee)
    }

    fn upsert(&mut self, permission: Permission) {
        match self
            .records
            .iter_mut()
            .find(|p| p.granted_to == permission.granted_to)
        {
            Some(slot) => *slot = permission,
            None => self.records.push(permission),
        }
    }

    fn remove(&mut self, grantee: &PrincipalId) {
        self.records.retain(|p| &p.granted_to != grantee);
    }
}

/// Encrypted, cached permission storage for one security boundary.
///
/// `namespace` is the acting principal; every path this instance touches is
/// rooted under it.
pub struct PermissionStorage {
    store: Arc<dyn BlobStore>,
    encryptor: Arc<dyn Encryptor>,
    namespace: PrincipalId,
    config: StorageConfig,
    cache: RwLock<HashMap<ResourceId, CacheBucket>>,
    generations: AtomicU64,
}

impl PermissionStorage {
    /// Create a storage layer with the default configuration.
    pub fn new(
        store: Arc<dyn BlobStore>,
        encryptor: Arc<dyn Encryptor>,
        namespace: PrincipalId,
    ) -> Self {
        Self::with_config(store, encryptor, namespace, StorageConfig::default())
    }

    /// Create a storage layer with an explicit configuration.
    pub fn with_config(
        store: Arc<dyn BlobStore>,
        encryptor: Arc<dyn Encryptor>,
        namespace: PrincipalId,
        config: StorageConfig,
    ) -> Self {
        Self {
            store,
            encryptor,
            namespace,
            config,
            cache: RwLock::new(HashMap::new()),
            generations: AtomicU64::new(0),
        }
    }

    /// The principal whose namespace this storage writes under.
    pub fn namespace(&self) -> &PrincipalId {
        &self.namespace
    }

    /// The active configuration.
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Paths
    // ─────────────────────────────────────────────────────────────────────────

    /// Prefix holding every current record of a resource.
    pub fn resource_prefix(&self, resource_id: &ResourceId) -> String {
        join_path([
            self.config.root.as_str(),
            self.namespace.as_str(),
            resource_id.as_str(),
        ])
    }

    /// Path of the current record for a grantee.
    pub fn record_path(&self, resource_id: &ResourceId, grantee: &PrincipalId) -> String {
        join_path([self.resource_prefix(resource_id).as_str(), grantee.as_str()])
    }

    fn history_prefix(&self, resource_id: &ResourceId, grantee: &PrincipalId) -> String {
        join_path([
            self.config.history_root.as_str(),
            self.namespace.as_str(),
            resource_id.as_str(),
            grantee.as_str(),
        ])
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────────

    /// Persist a record, replacing the current record of the same grantee.
    ///
    /// The cache is updated before the write. If sealing or the write fails,
    /// the cached entry is evicted so the next read goes back to the store.
    pub async fn save(&self, permission: &Permission) -> Result<()> {
        if self.config.cache_enabled {
            let mut cache = self.cache.write().await;
            cache
                .entry(permission.resource_id.clone())
                .or_default()
                .upsert(permission.clone());
        }

        let path = self.record_path(&permission.resource_id, &permission.granted_to);
        if let Err(e) = self.write_sealed(&path, permission).await {
            self.evict(&permission.resource_id, &permission.granted_to).await;
            return Err(e);
        }

        debug!(
            resource_id = %permission.resource_id,
            grantee = %permission.granted_to,
            permission_id = %permission.id,
            deleted = permission.deleted,
            "saved permission"
        );
        Ok(())
    }

    /// Archive a superseded record so it survives being overwritten.
    pub async fn archive(&self, permission: &Permission) -> Result<()> {
        let path = join_path([
            self.history_prefix(&permission.resource_id, &permission.granted_to),
            permission.id.to_string(),
        ]);
        self.write_sealed(&path, permission).await?;

        debug!(
            resource_id = %permission.resource_id,
            grantee = %permission.granted_to,
            permission_id = %permission.id,
            "archived permission"
        );
        Ok(())
    }

    /// Delete the current record of a grantee. Missing records are fine.
    pub async fn delete(&self, resource_id: &ResourceId, grantee: &PrincipalId) -> Result<()> {
        self.store
            .delete(&self.record_path(resource_id, grantee))
            .await?;

        let generation = self.next_generation();
        let mut cache = self.cache.write().await;
        let bucket = cache.entry(resource_id.clone()).or_default();
        bucket.remove(grantee);
        bucket.generation = generation;
        Ok(())
    }

    /// Delete every current record of a resource and drop its cache bucket.
    ///
    /// Returns the number of records deleted. A prefix that was never
    /// written counts as nothing to delete.
    pub async fn delete_by_resource(&self, resource_id: &ResourceId) -> Result<usize> {
        let prefix = self.resource_prefix(resource_id);
        let entries = match self.store.list(&prefix).await {
            Ok(entries) => entries,
            Err(StoreError::NotFound(_)) => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let mut deleted = 0;
        for entry in entries.iter().filter(|e| e.is_file) {
            self.store
                .delete(&join_path([prefix.as_str(), entry.name.as_str()]))
                .await?;
            deleted += 1;
        }

        let generation = self.next_generation();
        let mut cache = self.cache.write().await;
        let bucket = cache.entry(resource_id.clone()).or_default();
        bucket.records.clear();
        bucket.complete = false;
        bucket.generation = generation;
        drop(cache);

        debug!(resource_id = %resource_id, deleted, "deleted resource permissions");
        Ok(deleted)
    }

    async fn write_sealed(&self, path: &str, permission: &Permission) -> Result<()> {
        let envelope = self
            .encryptor
            .encrypt_for_storage(&self.encryptor.public_key(), permission)?;
        self.store
            .put(path, Bytes::from(envelope.to_bytes()?))
            .await?;
        Ok(())
    }

    async fn evict(&self, resource_id: &ResourceId, grantee: &PrincipalId) {
        let generation = self.next_generation();
        let mut cache = self.cache.write().await;
        let bucket = cache.entry(resource_id.clone()).or_default();
        bucket.remove(grantee);
        bucket.complete = false;
        bucket.generation = generation;
    }

    fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::Relaxed) + 1
    }

    async fn generation(&self, resource_id: &ResourceId) -> u64 {
        self.cache
            .read()
            .await
            .get(resource_id)
            .map_or(0, |bucket| bucket.generation)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────

    /// Load the current record of a grantee, active or revoked.
    ///
    /// Missing and undecodable records both read as `None`. Use
    /// [`try_load`](Self::try_load) to tell them apart.
    pub async fn load(&self, resource_id: &ResourceId, grantee: &PrincipalId) -> Option<Permission> {
        match self.try_load(resource_id, grantee).await {
            Ok(found) => found,
            Err(e) => {
                warn!(
                    resource_id = %resource_id,
                    grantee = %grantee,
                    error = %e,
                    "unreadable permission record treated as absent"
                );
                None
            }
        }
    }

    /// Load the current record of a grantee, surfacing read failures.
    pub async fn try_load(
        &self,
        resource_id: &ResourceId,
        grantee: &PrincipalId,
    ) -> Result<Option<Permission>> {
        let mut generation = 0;
        if self.config.cache_enabled {
            let cache = self.cache.read().await;
            let bucket = cache.get(resource_id);
            if let Some(hit) = bucket.and_then(|b| b.get(grantee)) {
                return Ok(Some(hit.clone()));
            }
            generation = bucket.map_or(0, |b| b.generation);
        }

        let path = self.record_path(resource_id, grantee);
        let Some(permission) = self.read_sealed(&path).await? else {
            return Ok(None);
        };

        if &permission.resource_id != resource_id || &permission.granted_to != grantee {
            return Err(PermsError::Corrupt {
                path,
                reason: format!(
                    "record belongs to {}/{}",
                    permission.resource_id, permission.granted_to
                ),
            });
        }

        if self.config.cache_enabled {
            let mut cache = self.cache.write().await;
            let bucket = cache.entry(resource_id.clone()).or_default();
            // A concurrent save may have landed while we were reading, or a
            // delete may have made what we read stale.
            if bucket.generation == generation && bucket.get(grantee).is_none() {
                bucket.upsert(permission.clone());
            }
        }

        Ok(Some(permission))
    }

    /// Load every active record of a resource.
    pub async fn load_all(&self, resource_id: &ResourceId) -> Vec<Permission> {
        self.load_all_records(resource_id)
            .await
            .into_iter()
            .filter(Permission::is_active)
            .collect()
    }

    /// Load every current record of a resource, revoked ones included.
    ///
    /// Records that fail to load are skipped individually.
    pub async fn load_all_records(&self, resource_id: &ResourceId) -> Vec<Permission> {
        if self.config.cache_enabled {
            let cache = self.cache.read().await;
            if let Some(bucket) = cache.get(resource_id).filter(|b| b.complete) {
                debug!(resource_id = %resource_id, "permission listing served from cache");
                return bucket.records.clone();
            }
        }

        let generation = self.generation(resource_id).await;
        let prefix = self.resource_prefix(resource_id);
        let entries = self.list_or_empty(&prefix).await;

        let mut records = Vec::with_capacity(entries.len());
        for entry in entries.iter().filter(|e| e.is_file) {
            let grantee = match PrincipalId::parse(&entry.name) {
                Ok(grantee) => grantee,
                Err(e) => {
                    warn!(prefix = %prefix, name = %entry.name, error = %e, "skipping foreign blob");
                    continue;
                }
            };
            if let Some(permission) = self.load(resource_id, &grantee).await {
                records.push(permission);
            }
        }

        if !self.config.cache_enabled {
            return records;
        }

        let mut cache = self.cache.write().await;
        let bucket = cache.entry(resource_id.clone()).or_default();
        if bucket.generation != generation {
            debug!(resource_id = %resource_id, "records deleted during listing, not caching it");
            return records;
        }
        // Records saved since the listing started are newer than what we read.
        for cached in &bucket.records {
            match records.iter_mut().find(|p| p.granted_to == cached.granted_to) {
                Some(slot) => *slot = cached.clone(),
                None => records.push(cached.clone()),
            }
        }
        bucket.records = records.clone();
        bucket.complete = true;

        records
    }

    /// Archived and current records of one grantee, oldest first.
    pub async fn history(&self, resource_id: &ResourceId, grantee: &PrincipalId) -> Vec<Permission> {
        let prefix = self.history_prefix(resource_id, grantee);
        let entries = self.list_or_empty(&prefix).await;

        let mut records = Vec::with_capacity(entries.len() + 1);
        for entry in entries.iter().filter(|e| e.is_file) {
            let path = join_path([prefix.as_str(), entry.name.as_str()]);
            match self.read_sealed(&path).await {
                Ok(Some(permission)) => records.push(permission),
                Ok(None) => {}
                Err(e) => warn!(path = %path, error = %e, "skipping unreadable archived permission"),
            }
        }

        if let Some(current) = self.load(resource_id, grantee).await {
            if !records.iter().any(|p| p.id == current.id) {
                records.push(current);
            }
        }

        records.sort_by_key(|p| p.granted_at);
        records
    }

    /// Whether a current record (active or revoked) exists for the grantee.
    pub async fn exists(&self, resource_id: &ResourceId, grantee: &PrincipalId) -> bool {
        self.load(resource_id, grantee).await.is_some()
    }

    async fn read_sealed(&self, path: &str) -> Result<Option<Permission>> {
        let Some(bytes) = self.store.get(path).await? else {
            return Ok(None);
        };
        let envelope = StorageEnvelope::from_bytes(&bytes)?;
        Ok(Some(self.encryptor.decrypt_from_storage(&envelope)?))
    }

    async fn list_or_empty(&self, prefix: &str) -> Vec<BlobEntry> {
        match self.store.list(prefix).await {
            Ok(entries) => entries,
            Err(StoreError::NotFound(_)) => Vec::new(),
            Err(e) => {
                warn!(prefix = %prefix, error = %e, "listing failed, treating as empty");
                Vec::new()
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Cache
    // ─────────────────────────────────────────────────────────────────────────

    /// Drop every cached record.
    ///
    /// Buckets keep their invalidation stamp so reads already in flight
    /// cannot repopulate them.
    pub async fn clear_cache(&self) {
        let generation = self.next_generation();
        for bucket in self.cache.write().await.values_mut() {
            bucket.records.clear();
            bucket.complete = false;
            bucket.generation = generation;
        }
    }

    /// Number of cached records across all resources.
    pub async fn cache_size(&self) -> usize {
        self.cache
            .read()
            .await
            .values()
            .map(|bucket| bucket.records.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sharegate_core::{PermissionLevel, ResourceType};
    use sharegate_store::MemoryBlobStore;

    use crate::encryptor::SealedBoxEncryptor;

    fn principal(n: u8) -> PrincipalId {
        PrincipalId::from_bytes([n; 20])
    }

    fn resource(name: &str) -> ResourceId {
        ResourceId::parse(name).unwrap()
    }

    fn grant(resource_id: &str, grantee: u8, level: PermissionLevel) -> Permission {
        Permission::new(
            resource(resource_id),
            ResourceType::Group,
            principal(1),
            principal(grantee),
            level,
            Utc::now(),
        )
    }

    fn setup() -> (Arc<MemoryBlobStore>, PermissionStorage) {
        let store = Arc::new(MemoryBlobStore::new());
        let storage = PermissionStorage::new(
            store.clone(),
            Arc::new(SealedBoxEncryptor::generate()),
            principal(1),
        );
        (store, storage)
    }

    #[tokio::test]
    async fn test_save_writes_sealed_blob_at_record_path() {
        let (store, storage) = setup();
        let permission = grant("g1", 2, PermissionLevel::Reader);

        storage.save(&permission).await.unwrap();

        let path = format!("permissions/{}/g1/{}", principal(1), principal(2));
        assert_eq!(store.paths(), vec![path.clone()]);

        let raw = store.get(&path).await.unwrap().unwrap();
        let needle = principal(2).to_string();
        assert!(!raw.windows(needle.len()).any(|w| w == needle.as_bytes()));
    }

    #[tokio::test]
    async fn test_roundtrip_after_clear_cache() {
        let (_, storage) = setup();
        let permission = grant("g1", 2, PermissionLevel::Writer);

        storage.save(&permission).await.unwrap();
        storage.clear_cache().await;
        assert_eq!(storage.cache_size().await, 0);

        let loaded = storage.load(&resource("g1"), &principal(2)).await.unwrap();
        assert_eq!(loaded, permission);
        assert_eq!(storage.cache_size().await, 1);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_store() {
        let (store, storage) = setup();
        storage.save(&grant("g1", 2, PermissionLevel::Reader)).await.unwrap();

        let before = store.get_count();
        assert!(storage.load(&resource("g1"), &principal(2)).await.is_some());
        assert_eq!(store.get_count(), before);
    }

    #[tokio::test]
    async fn test_save_replaces_same_grantee_only() {
        let (_, storage) = setup();
        let mut first = grant("g1", 2, PermissionLevel::Reader);
        storage.save(&first).await.unwrap();
        storage.save(&grant("g1", 3, PermissionLevel::Reader)).await.unwrap();

        first.level = PermissionLevel::Admin;
        storage.save(&first).await.unwrap();

        assert_eq!(storage.cache_size().await, 2);
        let loaded = storage.load(&resource("g1"), &principal(2)).await.unwrap();
        assert_eq!(loaded.level, PermissionLevel::Admin);
    }

    #[tokio::test]
    async fn test_corrupt_blob_reads_as_absent() {
        let (store, storage) = setup();
        let path = storage.record_path(&resource("g1"), &principal(2));
        store.insert_raw(path, &b"garbage"[..]);

        assert!(storage.load(&resource("g1"), &principal(2)).await.is_none());
        assert!(storage.try_load(&resource("g1"), &principal(2)).await.is_err());
    }

    #[tokio::test]
    async fn test_misplaced_record_is_corrupt() {
        let (store, storage) = setup();
        storage.save(&grant("g1", 2, PermissionLevel::Reader)).await.unwrap();

        // Copy grantee 2's blob into grantee 3's slot.
        let bytes = store
            .get(&storage.record_path(&resource("g1"), &principal(2)))
            .await
            .unwrap()
            .unwrap();
        store.insert_raw(storage.record_path(&resource("g1"), &principal(3)), bytes);
        storage.clear_cache().await;

        assert!(matches!(
            storage.try_load(&resource("g1"), &principal(3)).await,
            Err(PermsError::Corrupt { .. })
        ));
    }

    #[tokio::test]
    async fn test_load_all_skips_corrupt_sibling() {
        let (store, storage) = setup();
        storage.save(&grant("g1", 2, PermissionLevel::Reader)).await.unwrap();
        storage.save(&grant("g1", 4, PermissionLevel::Writer)).await.unwrap();
        store.insert_raw(storage.record_path(&resource("g1"), &principal(3)), &b"\xff\x00"[..]);
        storage.clear_cache().await;

        let all = storage.load_all(&resource("g1")).await;
        let grantees: Vec<_> = all.iter().map(|p| p.granted_to.clone()).collect();
        assert_eq!(grantees, vec![principal(2), principal(4)]);
    }

    #[tokio::test]
    async fn test_load_all_filters_revoked_but_records_keep_them() {
        let (_, storage) = setup();
        let mut revoked = grant("g1", 2, PermissionLevel::Reader);
        revoked.revoke();
        storage.save(&revoked).await.unwrap();
        storage.save(&grant("g1", 3, PermissionLevel::Reader)).await.unwrap();

        assert_eq!(storage.load_all(&resource("g1")).await.len(), 1);
        assert_eq!(storage.load_all_records(&resource("g1")).await.len(), 2);
    }

    #[tokio::test]
    async fn test_partial_bucket_does_not_answer_listing() {
        let (store, storage) = setup();
        storage.save(&grant("g1", 2, PermissionLevel::Reader)).await.unwrap();
        storage.save(&grant("g1", 3, PermissionLevel::Reader)).await.unwrap();
        storage.clear_cache().await;

        // Warm a single entry, then list: both records must come back.
        assert!(storage.load(&resource("g1"), &principal(2)).await.is_some());
        assert_eq!(storage.load_all(&resource("g1")).await.len(), 2);

        // Now the bucket is complete and listing no longer touches the store.
        let lists = store.list_count();
        assert_eq!(storage.load_all(&resource("g1")).await.len(), 2);
        assert_eq!(store.list_count(), lists);
    }

    #[tokio::test]
    async fn test_delete_and_delete_by_resource() {
        let (store, storage) = setup();
        storage.save(&grant("g1", 2, PermissionLevel::Reader)).await.unwrap();
        storage.save(&grant("g1", 3, PermissionLevel::Reader)).await.unwrap();
        storage.save(&grant("g2", 2, PermissionLevel::Reader)).await.unwrap();

        storage.delete(&resource("g1"), &principal(2)).await.unwrap();
        storage.delete(&resource("g1"), &principal(2)).await.unwrap();
        assert!(!storage.exists(&resource("g1"), &principal(2)).await);

        assert_eq!(storage.delete_by_resource(&resource("g1")).await.unwrap(), 1);
        assert_eq!(storage.delete_by_resource(&resource("g1")).await.unwrap(), 0);
        assert!(storage.load_all(&resource("g1")).await.is_empty());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_history_keeps_archived_records() {
        let (_, storage) = setup();
        let mut old = grant("g1", 2, PermissionLevel::Admin);
        old.revoke();
        storage.save(&old).await.unwrap();
        storage.archive(&old).await.unwrap();

        let mut fresh = grant("g1", 2, PermissionLevel::Reader);
        fresh.granted_at = old.granted_at + chrono::Duration::seconds(1);
        storage.save(&fresh).await.unwrap();

        let history = storage.history(&resource("g1"), &principal(2)).await;
        let ids: Vec<_> = history.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![old.id, fresh.id]);
        assert!(history[0].deleted);
    }

    #[tokio::test]
    async fn test_cache_disabled_always_reads_store() {
        let store = Arc::new(MemoryBlobStore::new());
        let storage = PermissionStorage::with_config(
            store.clone(),
            Arc::new(SealedBoxEncryptor::generate()),
            principal(1),
            StorageConfig {
                cache_enabled: false,
                ..StorageConfig::default()
            },
        );
        storage.save(&grant("g1", 2, PermissionLevel::Reader)).await.unwrap();

        let before = store.get_count();
        assert!(storage.load(&resource("g1"), &principal(2)).await.is_some());
        assert_eq!(store.get_count(), before + 1);
        assert_eq!(storage.cache_size().await, 0);
    }

    #[tokio::test]
    async fn test_other_namespace_cannot_open_records() {
        let store = Arc::new(MemoryBlobStore::new());
        let ours = PermissionStorage::new(
            store.clone(),
            Arc::new(SealedBoxEncryptor::generate()),
            principal(1),
        );
        ours.save(&grant("g1", 2, PermissionLevel::Reader)).await.unwrap();

        // Same namespace, different key: the blob is unreadable.
        let intruder = PermissionStorage::new(
            store,
            Arc::new(SealedBoxEncryptor::generate()),
            principal(1),
        );
        assert!(intruder.load(&resource("g1"), &principal(2)).await.is_none());
        assert!(intruder.load_all(&resource("g1")).await.is_empty());
    }

    /// Reads the blob, then stalls before returning it.
    struct SlowReads {
        inner: MemoryBlobStore,
        delay: std::time::Duration,
    }

    #[async_trait::async_trait]
    impl BlobStore for SlowReads {
        async fn put(&self, path: &str, bytes: Bytes) -> sharegate_store::Result<()> {
            self.inner.put(path, bytes).await
        }

        async fn get(&self, path: &str) -> sharegate_store::Result<Option<Bytes>> {
            let found = self.inner.get(path).await?;
            tokio::time::sleep(self.delay).await;
            Ok(found)
        }

        async fn list(&self, prefix: &str) -> sharegate_store::Result<Vec<BlobEntry>> {
            self.inner.list(prefix).await
        }

        async fn delete(&self, path: &str) -> sharegate_store::Result<()> {
            self.inner.delete(path).await
        }
    }

    fn slow_storage() -> Arc<PermissionStorage> {
        let store = SlowReads {
            inner: MemoryBlobStore::new(),
            delay: std::time::Duration::from_millis(100),
        };
        Arc::new(PermissionStorage::new(
            Arc::new(store),
            Arc::new(SealedBoxEncryptor::generate()),
            principal(1),
        ))
    }

    #[tokio::test]
    async fn test_delete_during_listing_is_not_cached() {
        let storage = slow_storage();
        storage.save(&grant("g1", 2, PermissionLevel::Reader)).await.unwrap();
        storage.clear_cache().await;

        let listing = tokio::spawn({
            let storage = storage.clone();
            async move { storage.load_all(&resource("g1")).await }
        });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        storage.delete(&resource("g1"), &principal(2)).await.unwrap();

        // The in-flight listing read the blob before it was deleted.
        assert_eq!(listing.await.unwrap().len(), 1);

        assert!(storage.load_all(&resource("g1")).await.is_empty());
        assert!(!storage.exists(&resource("g1"), &principal(2)).await);
        assert_eq!(storage.cache_size().await, 0);
    }

    #[tokio::test]
    async fn test_delete_during_single_load_is_not_cached() {
        let storage = slow_storage();
        storage.save(&grant("g1", 2, PermissionLevel::Reader)).await.unwrap();
        storage.clear_cache().await;

        let load = tokio::spawn({
            let storage = storage.clone();
            async move { storage.load(&resource("g1"), &principal(2)).await }
        });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        storage.delete_by_resource(&resource("g1")).await.unwrap();

        assert!(load.await.unwrap().is_some());
        assert!(!storage.exists(&resource("g1"), &principal(2)).await);
    }
}
