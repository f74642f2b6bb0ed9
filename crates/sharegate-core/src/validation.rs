//! Grant and revoke input validation.
//!
//! Host applications hand us raw strings. These functions turn them into
//! typed targets, failing with a distinct [`ValidationError`] per rule.

use crate::error::ValidationError;
use crate::types::{PrincipalId, ResourceId};

/// Parsed inputs of a grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantTarget {
    pub resource_id: ResourceId,
    pub granted_by: PrincipalId,
    pub granted_to: PrincipalId,
}

/// Parsed inputs of a revoke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevokeTarget {
    pub resource_id: ResourceId,
    pub requestor: PrincipalId,
    pub granted_to: PrincipalId,
}

/// Validate the identifiers of a grant.
///
/// This performs, in order:
/// - Resource id check (non-empty, path safe)
/// - Grantee check (non-empty, well-formed)
/// - Grantor check (well-formed)
/// - Self-grant check
///
/// Level and resource type are typed enums and cannot be invalid here; their
/// string parsers report [`ValidationError::InvalidLevel`] and
/// [`ValidationError::InvalidResourceType`].
pub fn validate_grant(
    resource_id: &str,
    granted_by: &str,
    granted_to: &str,
) -> Result<GrantTarget, ValidationError> {
    // 1. Resource
    let resource_id = ResourceId::parse(resource_id)?;

    // 2. Grantee
    let granted_to = PrincipalId::parse(granted_to)?;

    // 3. Grantor
    let granted_by = PrincipalId::parse(granted_by)?;

    // 4. No self-grant, whoever initiates it
    if granted_to == granted_by {
        return Err(ValidationError::SelfGrant);
    }

    Ok(GrantTarget {
        resource_id,
        granted_by,
        granted_to,
    })
}

/// Validate the identifiers of a revoke.
///
/// The self-revoke check runs first and compares the raw identities
/// case-insensitively, so it fires even when the ids are otherwise malformed.
pub fn validate_revoke(
    resource_id: &str,
    requestor: &str,
    granted_to: &str,
) -> Result<RevokeTarget, ValidationError> {
    // 1. No self-revoke
    if requestor.trim().eq_ignore_ascii_case(granted_to.trim()) {
        return Err(ValidationError::SelfRevoke);
    }

    // 2. Resource
    let resource_id = ResourceId::parse(resource_id)?;

    // 3. Principals
    let granted_to = PrincipalId::parse(granted_to)?;
    let requestor = PrincipalId::parse(requestor)?;

    Ok(RevokeTarget {
        resource_id,
        requestor,
        granted_to,
    })
}
