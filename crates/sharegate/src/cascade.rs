//! Cascade reports.
//!
//! A cascade applies a group grant or revoke to each linked database in
//! turn. It is not atomic: the primary change is committed first and every
//! linked database succeeds or fails on its own. The outcome types make
//! that partial state visible instead of raising after the fact.

use sharegate_core::{Permission, ResourceId};

/// What happened to one linked database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeStatus {
    /// The grant or revoke was written.
    Applied,
    /// Nothing to do (revoke found no active permission).
    Skipped,
    /// The write failed; the database is out of step with the group.
    Failed(String),
}

/// Result of cascading to one linked database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeResult {
    pub resource_id: ResourceId,
    pub status: CascadeStatus,
}

impl CascadeResult {
    pub(crate) fn new(resource_id: ResourceId, status: CascadeStatus) -> Self {
        Self {
            resource_id,
            status,
        }
    }

    /// Whether this target is consistent with the primary change.
    pub fn is_ok(&self) -> bool {
        !matches!(self.status, CascadeStatus::Failed(_))
    }

    /// Failure reason, if the cascade failed for this target.
    pub fn error(&self) -> Option<&str> {
        match &self.status {
            CascadeStatus::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Outcome of a grant.
#[derive(Debug, Clone)]
pub struct GrantOutcome {
    /// The committed grant on the requested resource.
    pub primary: Permission,
    /// Per-database results, in link order. Empty without cascade.
    pub cascaded: Vec<CascadeResult>,
}

/// Outcome of a revoke.
#[derive(Debug, Clone)]
pub struct RevokeOutcome {
    /// The soft-deleted record on the requested resource.
    pub revoked: Permission,
    /// Per-database results, in link order. Empty without cascade.
    pub cascaded: Vec<CascadeResult>,
}

/// Shared accessors over cascade reports.
pub trait CascadeReport {
    fn cascaded(&self) -> &[CascadeResult];

    /// True when every linked database is consistent with the primary change.
    fn is_complete(&self) -> bool {
        self.cascaded().iter().all(CascadeResult::is_ok)
    }

    /// Linked databases whose cascade failed.
    fn failures(&self) -> Vec<&CascadeResult> {
        self.cascaded().iter().filter(|r| !r.is_ok()).collect()
    }
}

impl CascadeReport for GrantOutcome {
    fn cascaded(&self) -> &[CascadeResult] {
        &self.cascaded
    }
}

impl CascadeReport for RevokeOutcome {
    fn cascaded(&self) -> &[CascadeResult] {
        &self.cascaded
    }
}
