//! Manager configuration.

use serde::{Deserialize, Serialize};

/// Who may manage a resource that has no registered owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnownedPolicy {
    /// Unowned resources are public: any principal may list, grant and revoke.
    #[default]
    Public,
    /// Unowned resources are locked until an owner is registered.
    Restricted,
}

/// Configuration for the [`PermissionManager`](crate::PermissionManager).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Policy for resources without a registered owner.
    pub unowned_policy: UnownedPolicy,
    /// Let active admin grantees manage a resource alongside its owner.
    pub delegated_sharing: bool,
}

impl ManagerConfig {
    /// Configuration that denies every management call on unowned resources.
    pub fn restricted() -> Self {
        Self {
            unowned_policy: UnownedPolicy::Restricted,
            ..Self::default()
        }
    }
}
