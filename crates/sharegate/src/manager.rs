//! The permission manager: grant, revoke and query access to resources.
//!
//! One [`PermissionManager`] governs one security boundary. It owns the
//! ownership and linkage registries for that boundary and serializes
//! writes per `(resource, grantee)` pair, so two grants racing for the same
//! grantee can never produce two records.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use sharegate_core::{
    validate_grant, validate_revoke, Permission, PermissionLevel, PermissionSummary, PrincipalId,
    ResourceId, ResourceType,
};
use sharegate_perms::PermissionStorage;

use crate::cascade::{CascadeResult, CascadeStatus, GrantOutcome, RevokeOutcome};
use crate::config::{ManagerConfig, UnownedPolicy};
use crate::error::{AccessError, Result};
use crate::registry::{LinkageRegistry, OwnershipRegistry};

/// Idle pair locks are dropped once the table grows past this size.
const PAIR_LOCK_PRUNE_THRESHOLD: usize = 1024;

type PairKey = (ResourceId, PrincipalId);

/// Per-pair write locks.
#[derive(Default)]
struct PairLocks {
    locks: Mutex<HashMap<PairKey, Arc<AsyncMutex<()>>>>,
}

impl PairLocks {
    async fn acquire(&self, resource_id: &ResourceId, grantee: &PrincipalId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            if locks.len() >= PAIR_LOCK_PRUNE_THRESHOLD {
                // Held locks carry a second reference through their guard.
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            locks
                .entry((resource_id.clone(), grantee.clone()))
                .or_default()
                .clone()
        };
        lock.lock_owned().await
    }
}

/// Access control for one security boundary.
///
/// All identifiers are accepted as strings and validated on entry. The
/// manager is `Send + Sync`; share it behind an [`Arc`].
pub struct PermissionManager {
    storage: Arc<PermissionStorage>,
    config: ManagerConfig,
    owners: OwnershipRegistry,
    links: LinkageRegistry,
    locks: PairLocks,
}

impl PermissionManager {
    /// Create a manager over `storage`.
    pub fn new(storage: Arc<PermissionStorage>, config: ManagerConfig) -> Self {
        Self {
            storage,
            config,
            owners: OwnershipRegistry::default(),
            links: LinkageRegistry::default(),
            locks: PairLocks::default(),
        }
    }

    /// The storage layer this manager writes through.
    pub fn storage(&self) -> &Arc<PermissionStorage> {
        &self.storage
    }

    /// Get the configuration.
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Registries
    // ─────────────────────────────────────────────────────────────────────────

    /// Register `owner` as the owner of a resource, replacing any previous owner.
    pub async fn set_resource_owner(&self, resource_id: &str, owner: &str) -> Result<()> {
        let resource_id = ResourceId::parse(resource_id)?;
        let owner = PrincipalId::parse(owner)?;

        if let Some(previous) = self.owners.set(resource_id.clone(), owner.clone()).await {
            if previous != owner {
                info!(resource_id = %resource_id, previous = %previous, owner = %owner, "resource owner replaced");
            }
        }
        Ok(())
    }

    /// Owner of a resource, if one is registered.
    pub async fn get_resource_owner(&self, resource_id: &str) -> Result<Option<PrincipalId>> {
        let resource_id = ResourceId::parse(resource_id)?;
        Ok(self.owners.get(&resource_id).await)
    }

    /// Replace the databases linked to a group.
    pub async fn link_databases<I, S>(&self, group_id: &str, database_ids: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let group_id = ResourceId::parse(group_id)?;
        let database_ids = database_ids
            .into_iter()
            .map(|id| ResourceId::parse(id.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!(group_id = %group_id, count = database_ids.len(), "linking databases");
        self.links.link(group_id, database_ids).await;
        Ok(())
    }

    /// Databases currently linked to a group.
    pub async fn get_linked_databases(&self, group_id: &str) -> Result<Vec<ResourceId>> {
        let group_id = ResourceId::parse(group_id)?;
        Ok(self.links.linked(&group_id).await)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Grant `granted_to` access to a resource at `level`.
    ///
    /// Re-granting to an active grantee updates the level in place and
    /// keeps the record id. Granting after a revoke creates a fresh record.
    ///
    /// With `cascade` on a group, the grant is repeated on every linked
    /// database. Linked databases are reported individually in the outcome;
    /// their failures never undo or fail the primary grant.
    pub async fn grant_permission(
        &self,
        resource_id: &str,
        resource_type: ResourceType,
        granted_by: &str,
        granted_to: &str,
        level: PermissionLevel,
        cascade: bool,
    ) -> Result<GrantOutcome> {
        let target = validate_grant(resource_id, granted_by, granted_to)?;
        self.authorize(&target.resource_id, &target.granted_by, "grant")
            .await?;

        let primary = self
            .apply_grant(
                &target.resource_id,
                resource_type,
                &target.granted_by,
                &target.granted_to,
                level,
            )
            .await?;

        let mut cascaded = Vec::new();
        if cascade && resource_type.cascades() {
            for database_id in self.links.linked(&target.resource_id).await {
                let status = match self
                    .grant_linked(&database_id, &target.granted_by, &target.granted_to, level)
                    .await
                {
                    Ok(_) => CascadeStatus::Applied,
                    Err(e) => {
                        warn!(
                            group_id = %target.resource_id,
                            resource_id = %database_id,
                            grantee = %target.granted_to,
                            error = %e,
                            "cascade grant failed"
                        );
                        CascadeStatus::Failed(e.to_string())
                    }
                };
                cascaded.push(CascadeResult::new(database_id, status));
            }
        }

        Ok(GrantOutcome { primary, cascaded })
    }

    /// Revoke the active permission of `granted_to` on a resource.
    ///
    /// The record is soft-deleted. With `cascade`, the grantee's permission
    /// on every linked database is revoked too; databases where the grantee
    /// holds nothing are reported as skipped.
    pub async fn revoke_permission(
        &self,
        resource_id: &str,
        requestor: &str,
        granted_to: &str,
        cascade: bool,
    ) -> Result<RevokeOutcome> {
        let target = validate_revoke(resource_id, requestor, granted_to)?;
        self.authorize(&target.resource_id, &target.requestor, "revoke")
            .await?;

        let revoked = self
            .apply_revoke(&target.resource_id, &target.granted_to)
            .await?
            .ok_or_else(|| AccessError::NotFound {
                resource_id: target.resource_id.clone(),
                grantee: target.granted_to.clone(),
            })?;

        let mut cascaded = Vec::new();
        if cascade && revoked.resource_type.cascades() {
            for database_id in self.links.linked(&target.resource_id).await {
                let status = match self
                    .revoke_linked(&database_id, &target.requestor, &target.granted_to)
                    .await
                {
                    Ok(Some(_)) => CascadeStatus::Applied,
                    Ok(None) => CascadeStatus::Skipped,
                    Err(e) => {
                        warn!(
                            group_id = %target.resource_id,
                            resource_id = %database_id,
                            grantee = %target.granted_to,
                            error = %e,
                            "cascade revoke failed"
                        );
                        CascadeStatus::Failed(e.to_string())
                    }
                };
                cascaded.push(CascadeResult::new(database_id, status));
            }
        }

        Ok(RevokeOutcome { revoked, cascaded })
    }

    /// Delete every stored permission of a resource and forget its owner
    /// and links. Returns the number of records removed.
    pub async fn purge_resource(&self, resource_id: &str, requestor: &str) -> Result<usize> {
        let resource_id = ResourceId::parse(resource_id)?;
        let requestor = PrincipalId::parse(requestor)?;
        self.authorize(&resource_id, &requestor, "purge").await?;

        // Hold every grantee's pair lock so no grant interleaves with the delete.
        let mut grantees: Vec<PrincipalId> = self
            .storage
            .load_all_records(&resource_id)
            .await
            .into_iter()
            .map(|p| p.granted_to)
            .collect();
        grantees.sort();
        grantees.dedup();
        let mut guards = Vec::with_capacity(grantees.len());
        for grantee in &grantees {
            guards.push(self.locks.acquire(&resource_id, grantee).await);
        }

        let removed = self.storage.delete_by_resource(&resource_id).await?;
        drop(guards);
        self.owners.remove(&resource_id).await;
        self.links.remove(&resource_id).await;

        info!(resource_id = %resource_id, requestor = %requestor, removed, "purged resource permissions");
        Ok(removed)
    }

    /// Cascade a grant to one linked database, authorized like a direct grant.
    async fn grant_linked(
        &self,
        database_id: &ResourceId,
        granted_by: &PrincipalId,
        granted_to: &PrincipalId,
        level: PermissionLevel,
    ) -> Result<Permission> {
        self.authorize(database_id, granted_by, "grant").await?;
        self.apply_grant(database_id, ResourceType::Database, granted_by, granted_to, level)
            .await
    }

    /// Cascade a revoke to one linked database, authorized like a direct revoke.
    async fn revoke_linked(
        &self,
        database_id: &ResourceId,
        requestor: &PrincipalId,
        granted_to: &PrincipalId,
    ) -> Result<Option<Permission>> {
        self.authorize(database_id, requestor, "revoke").await?;
        self.apply_revoke(database_id, granted_to).await
    }

    async fn apply_grant(
        &self,
        resource_id: &ResourceId,
        resource_type: ResourceType,
        granted_by: &PrincipalId,
        granted_to: &PrincipalId,
        level: PermissionLevel,
    ) -> Result<Permission> {
        let _guard = self.locks.acquire(resource_id, granted_to).await;
        let now = Utc::now();

        let permission = match self.storage.load(resource_id, granted_to).await {
            Some(mut current) if current.is_active() => {
                let previous = current.level;
                current.regrant(level, now);
                self.storage.save(&current).await?;
                info!(
                    resource_id = %resource_id,
                    grantee = %granted_to,
                    permission_id = %current.id,
                    from = %previous,
                    to = %level,
                    "permission updated"
                );
                current
            }
            revoked => {
                if let Some(revoked) = revoked {
                    self.storage.archive(&revoked).await?;
                }
                let fresh = Permission::new(
                    resource_id.clone(),
                    resource_type,
                    granted_by.clone(),
                    granted_to.clone(),
                    level,
                    now,
                );
                self.storage.save(&fresh).await?;
                info!(
                    resource_id = %resource_id,
                    grantee = %granted_to,
                    permission_id = %fresh.id,
                    level = %level,
                    "permission granted"
                );
                fresh
            }
        };

        Ok(permission)
    }

    /// Soft-delete the active record of a pair. `None` if there is none.
    async fn apply_revoke(
        &self,
        resource_id: &ResourceId,
        granted_to: &PrincipalId,
    ) -> Result<Option<Permission>> {
        let _guard = self.locks.acquire(resource_id, granted_to).await;

        let Some(mut current) = self
            .storage
            .load(resource_id, granted_to)
            .await
            .filter(Permission::is_active)
        else {
            return Ok(None);
        };

        current.revoke();
        self.storage.save(&current).await?;
        info!(
            resource_id = %resource_id,
            grantee = %granted_to,
            permission_id = %current.id,
            "permission revoked"
        );
        Ok(Some(current))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Active permissions of a resource.
    pub async fn list_permissions(&self, resource_id: &str, requestor: &str) -> Result<Vec<Permission>> {
        let resource_id = ResourceId::parse(resource_id)?;
        let requestor = PrincipalId::parse(requestor)?;
        self.authorize(&resource_id, &requestor, "list").await?;

        Ok(self.storage.load_all(&resource_id).await)
    }

    /// Every record one grantee has held on a resource, oldest first.
    ///
    /// Includes revoked records and those superseded by a later grant.
    pub async fn permission_history(
        &self,
        resource_id: &str,
        requestor: &str,
        grantee: &str,
    ) -> Result<Vec<Permission>> {
        let resource_id = ResourceId::parse(resource_id)?;
        let requestor = PrincipalId::parse(requestor)?;
        let grantee = PrincipalId::parse(grantee)?;
        self.authorize(&resource_id, &requestor, "read history").await?;

        Ok(self.storage.history(&resource_id, &grantee).await)
    }

    /// Effective level of `user` on a resource. The owner is always admin.
    pub async fn check_permission(
        &self,
        resource_id: &str,
        user: &str,
    ) -> Result<Option<PermissionLevel>> {
        let resource_id = ResourceId::parse(resource_id)?;
        let user = PrincipalId::parse(user)?;
        Ok(self.effective_level(&resource_id, &user).await)
    }

    /// Whether `user` may share the resource further.
    pub async fn can_share(&self, resource_id: &str, user: &str) -> Result<bool> {
        Ok(self.check_permission(resource_id, user).await? == Some(PermissionLevel::Admin))
    }

    /// Counts of active permissions by level.
    pub async fn get_permission_summary(&self, resource_id: &str) -> Result<PermissionSummary> {
        let resource_id = ResourceId::parse(resource_id)?;
        let permissions = self.storage.load_all(&resource_id).await;
        Ok(PermissionSummary::from_permissions(&permissions))
    }

    async fn effective_level(
        &self,
        resource_id: &ResourceId,
        user: &PrincipalId,
    ) -> Option<PermissionLevel> {
        if self.owners.get(resource_id).await.as_ref() == Some(user) {
            return Some(PermissionLevel::Admin);
        }
        self.storage
            .load(resource_id, user)
            .await
            .filter(Permission::is_active)
            .map(|p| p.level)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Authorization
    // ─────────────────────────────────────────────────────────────────────────

    async fn authorize(
        &self,
        resource_id: &ResourceId,
        requestor: &PrincipalId,
        action: &str,
    ) -> Result<()> {
        let Some(owner) = self.owners.get(resource_id).await else {
            return match self.config.unowned_policy {
                UnownedPolicy::Public => Ok(()),
                UnownedPolicy::Restricted => Err(AccessError::PermissionDenied(format!(
                    "{resource_id} has no registered owner; {requestor} cannot {action}"
                ))),
            };
        };

        if &owner == requestor {
            return Ok(());
        }

        if self.config.delegated_sharing {
            let delegated = self
                .storage
                .load(resource_id, requestor)
                .await
                .is_some_and(|p| p.is_active() && p.level.can_share());
            if delegated {
                debug!(resource_id = %resource_id, requestor = %requestor, action, "delegated admin authorized");
                return Ok(());
            }
        }

        Err(AccessError::PermissionDenied(format!(
            "only the owner of {resource_id} can {action}"
        )))
    }
}
