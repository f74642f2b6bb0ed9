//! Permission records and the enums they are built from.
//!
//! A [`Permission`] is the unit persisted by the storage layer. Its serde
//! representation is the wire schema: camelCase fields, lowercase enum
//! values and `grantedAt` as an RFC 3339 string.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::{PermissionId, PrincipalId, ResourceId};

/// Kind of shareable resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    /// A shareable collection. Groups may have linked databases.
    Group,
    /// A data store linked to a group.
    Database,
}

impl ResourceType {
    /// Wire name of this resource type.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Group => "group",
            ResourceType::Database => "database",
        }
    }

    /// Whether grants on this resource type propagate to linked databases.
    pub const fn cascades(&self) -> bool {
        matches!(self, ResourceType::Group)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "group" => Ok(ResourceType::Group),
            "database" => Ok(ResourceType::Database),
            other => Err(ValidationError::InvalidResourceType(other.to_string())),
        }
    }
}

/// Access level of a permission. Levels are ordered: `Reader < Writer < Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    /// Read access.
    Reader,
    /// Read and write access.
    Writer,
    /// Full control, including sharing with others.
    Admin,
}

impl PermissionLevel {
    /// All levels, lowest first.
    pub const ALL: [PermissionLevel; 3] = [
        PermissionLevel::Reader,
        PermissionLevel::Writer,
        PermissionLevel::Admin,
    ];

    /// Wire name of this level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PermissionLevel::Reader => "reader",
            PermissionLevel::Writer => "writer",
            PermissionLevel::Admin => "admin",
        }
    }

    /// Check if this level grants at least `required`.
    pub fn satisfies(&self, required: PermissionLevel) -> bool {
        *self >= required
    }

    /// Check if this level allows reading.
    pub fn can_read(&self) -> bool {
        self.satisfies(PermissionLevel::Reader)
    }

    /// Check if this level allows writing.
    pub fn can_write(&self) -> bool {
        self.satisfies(PermissionLevel::Writer)
    }

    /// Check if this level allows sharing the resource further.
    pub fn can_share(&self) -> bool {
        *self == PermissionLevel::Admin
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reader" => Ok(PermissionLevel::Reader),
            "writer" => Ok(PermissionLevel::Writer),
            "admin" => Ok(PermissionLevel::Admin),
            other => Err(ValidationError::InvalidLevel(other.to_string())),
        }
    }
}

/// An access grant linking a grantee to a resource at a specific level.
///
/// Records are never physically removed by a revoke. Instead `deleted` is
/// set, which keeps the audit trail intact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    /// Record id. Stable across in-place level changes.
    pub id: PermissionId,

    /// The resource being shared.
    pub resource_id: ResourceId,

    /// Kind of the resource.
    pub resource_type: ResourceType,

    /// The grantee.
    pub granted_to: PrincipalId,

    /// Access level held by the grantee.
    pub level: PermissionLevel,

    /// Who issued the grant.
    pub granted_by: PrincipalId,

    /// When the grant was issued or last updated.
    pub granted_at: DateTime<Utc>,

    /// Soft-delete marker set on revoke.
    pub deleted: bool,
}

impl Permission {
    /// Create a fresh, active permission with a new id.
    pub fn new(
        resource_id: ResourceId,
        resource_type: ResourceType,
        granted_by: PrincipalId,
        granted_to: PrincipalId,
        level: PermissionLevel,
        granted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PermissionId::generate(),
            resource_id,
            resource_type,
            granted_to,
            level,
            granted_by,
            granted_at,
            deleted: false,
        }
    }

    /// Whether this record is currently in force.
    pub fn is_active(&self) -> bool {
        !self.deleted
    }

    /// Update an active grant in place. The id and grantor are preserved.
    pub fn regrant(&mut self, level: PermissionLevel, at: DateTime<Utc>) {
        self.level = level;
        self.granted_at = at;
    }

    /// Mark this record revoked.
    pub fn revoke(&mut self) {
        self.deleted = true;
    }

    /// Serialize to the JSON wire schema.
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("permission serialization is infallible")
    }

    /// Deserialize from the JSON wire schema.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ValidationError> {
        serde_json::from_slice(bytes).map_err(|e| ValidationError::MalformedRecord(e.to_string()))
    }
}

/// Aggregate counts over the active permissions of one resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionSummary {
    /// Number of active grants.
    pub total: usize,
    pub reader_count: usize,
    pub writer_count: usize,
    pub admin_count: usize,
    /// Most recent `granted_at` among active grants.
    pub last_granted_at: Option<DateTime<Utc>>,
}

impl PermissionSummary {
    /// Summarize a set of records. Revoked records are ignored.
    pub fn from_permissions<'a>(permissions: impl IntoIterator<Item = &'a Permission>) -> Self {
        let mut summary = Self::default();

        for permission in permissions.into_iter().filter(|p| p.is_active()) {
            summary.total += 1;
            match permission.level {
                PermissionLevel::Reader => summary.reader_count += 1,
                PermissionLevel::Writer => summary.writer_count += 1,
                PermissionLevel::Admin => summary.admin_count += 1,
            }
            summary.last_granted_at = summary.last_granted_at.max(Some(permission.granted_at));
        }

        summary
    }
}
