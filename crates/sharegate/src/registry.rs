//! In-memory ownership and linkage registries.
//!
//! Both registries belong to one [`PermissionManager`](crate::PermissionManager)
//! instance. They are maintained by explicit administrative calls and are
//! never inferred from stored permissions.

use std::collections::HashMap;

use tokio::sync::RwLock;

use sharegate_core::{PrincipalId, ResourceId};

/// Resource → owner.
#[derive(Debug, Default)]
pub struct OwnershipRegistry {
    owners: RwLock<HashMap<ResourceId, PrincipalId>>,
}

impl OwnershipRegistry {
    /// Register an owner. Returns the previous owner, if any.
    pub async fn set(&self, resource_id: ResourceId, owner: PrincipalId) -> Option<PrincipalId> {
        self.owners.write().await.insert(resource_id, owner)
    }

    /// Look up the owner of a resource.
    pub async fn get(&self, resource_id: &ResourceId) -> Option<PrincipalId> {
        self.owners.read().await.get(resource_id).cloned()
    }

    /// Forget the owner of a resource.
    pub async fn remove(&self, resource_id: &ResourceId) -> Option<PrincipalId> {
        self.owners.write().await.remove(resource_id)
    }
}

/// Group → linked databases.
#[derive(Debug, Default)]
pub struct LinkageRegistry {
    links: RwLock<HashMap<ResourceId, Vec<ResourceId>>>,
}

impl LinkageRegistry {
    /// Replace the databases linked to a group.
    ///
    /// Duplicates and self-links are dropped; order is otherwise kept.
    pub async fn link(&self, group_id: ResourceId, database_ids: Vec<ResourceId>) {
        let mut linked: Vec<ResourceId> = Vec::with_capacity(database_ids.len());
        for id in database_ids {
            if id != group_id && !linked.contains(&id) {
                linked.push(id);
            }
        }
        self.links.write().await.insert(group_id, linked);
    }

    /// Databases currently linked to a group.
    pub async fn linked(&self, group_id: &ResourceId) -> Vec<ResourceId> {
        self.links
            .read()
            .await
            .get(group_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Drop a resource both as a group and as a link target.
    pub async fn remove(&self, resource_id: &ResourceId) {
        let mut links = self.links.write().await;
        links.remove(resource_id);
        for targets in links.values_mut() {
            targets.retain(|id| id != resource_id);
        }
    }
}
