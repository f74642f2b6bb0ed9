//! Golden test vectors for the permission record wire format.
//!
//! Each vector pairs a JSON record with the [`Permission`] it must decode
//! to. Canonical vectors must also be reproduced exactly when the record is
//! encoded again; non-canonical ones exercise input normalization.

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use sharegate_core::{Permission, PermissionId, PermissionLevel, PrincipalId, ResourceId, ResourceType};

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct RecordVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Record as stored inside an envelope.
    pub json: &'static str,
    /// Whether encoding `expected` must reproduce `json`.
    pub canonical: bool,
    /// The decoded record.
    pub expected: Permission,
}

const OWNER: &str = "0x1111111111111111111111111111111111111111";
const GRANTEE: &str = "0xabcdef0123456789abcdef0123456789abcdef01";

fn principal(s: &str) -> PrincipalId {
    PrincipalId::parse(s).unwrap_or_else(|e| panic!("bad vector principal {s}: {e}"))
}

fn resource(s: &str) -> ResourceId {
    ResourceId::parse(s).unwrap_or_else(|e| panic!("bad vector resource {s}: {e}"))
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<RecordVector> {
    vec![
        RecordVector {
            name: "active reader on a group",
            json: r#"{"id":"6f1c2a9e-3b4d-4e5f-8a7b-9c0d1e2f3a4b","resourceId":"group-1","resourceType":"group","grantedTo":"0xabcdef0123456789abcdef0123456789abcdef01","level":"reader","grantedBy":"0x1111111111111111111111111111111111111111","grantedAt":"2026-01-14T12:00:00Z","deleted":false}"#,
            canonical: true,
            expected: Permission {
                id: PermissionId::from_uuid(Uuid::from_u128(0x6f1c2a9e_3b4d_4e5f_8a7b_9c0d1e2f3a4b)),
                resource_id: resource("group-1"),
                resource_type: ResourceType::Group,
                granted_to: principal(GRANTEE),
                level: PermissionLevel::Reader,
                granted_by: principal(OWNER),
                granted_at: Utc.with_ymd_and_hms(2026, 1, 14, 12, 0, 0).unwrap(),
                deleted: false,
            },
        },
        RecordVector {
            name: "revoked admin on a database with millisecond timestamp",
            json: r#"{"id":"00000000-0000-4000-8000-000000000001","resourceId":"db.main","resourceType":"database","grantedTo":"0xabcdef0123456789abcdef0123456789abcdef01","level":"admin","grantedBy":"0x1111111111111111111111111111111111111111","grantedAt":"2026-03-01T08:30:15.250Z","deleted":true}"#,
            canonical: true,
            expected: Permission {
                id: PermissionId::from_uuid(Uuid::from_u128(0x00000000_0000_4000_8000_000000000001)),
                resource_id: resource("db.main"),
                resource_type: ResourceType::Database,
                granted_to: principal(GRANTEE),
                level: PermissionLevel::Admin,
                granted_by: principal(OWNER),
                granted_at: Utc.with_ymd_and_hms(2026, 3, 1, 8, 30, 15).unwrap()
                    + chrono::Duration::milliseconds(250),
                deleted: true,
            },
        },
        RecordVector {
            name: "mixed-case addresses and offset timestamp normalize",
            json: r#"{"id":"6f1c2a9e-3b4d-4e5f-8a7b-9c0d1e2f3a4b","resourceId":"group-1","resourceType":"group","grantedTo":"0XABCDEF0123456789ABCDEF0123456789ABCDEF01","level":"writer","grantedBy":"0x1111111111111111111111111111111111111111","grantedAt":"2026-01-14T14:00:00+02:00","deleted":false}"#,
            canonical: false,
            expected: Permission {
                id: PermissionId::from_uuid(Uuid::from_u128(0x6f1c2a9e_3b4d_4e5f_8a7b_9c0d1e2f3a4b)),
                resource_id: resource("group-1"),
                resource_type: ResourceType::Group,
                granted_to: principal(GRANTEE),
                level: PermissionLevel::Writer,
                granted_by: principal(OWNER),
                granted_at: Utc.with_ymd_and_hms(2026, 1, 14, 12, 0, 0).unwrap(),
                deleted: false,
            },
        },
    ]
}

/// Verify a single vector.
pub fn verify_vector(vector: &RecordVector) -> Result<(), String> {
    let decoded = Permission::from_bytes(vector.json.as_bytes())
        .map_err(|e| format!("{}: decode failed: {e}", vector.name))?;
    if decoded != vector.expected {
        return Err(format!(
            "{}: decoded {:?}, expected {:?}",
            vector.name, decoded, vector.expected
        ));
    }

    if vector.canonical {
        let encoded = String::from_utf8(vector.expected.to_bytes())
            .map_err(|e| format!("{}: encoding is not UTF-8: {e}", vector.name))?;
        if encoded != vector.json {
            return Err(format!(
                "{}: encoded {encoded}, expected {}",
                vector.name, vector.json
            ));
        }
    }

    Ok(())
}

/// Verify all vectors, stopping at the first mismatch.
pub fn verify_all_vectors() -> Result<(), String> {
    all_vectors().iter().try_for_each(verify_vector)
}
