//! Proptest generators for property-based testing.

use proptest::prelude::*;

use sharegate_core::{PermissionLevel, PrincipalId, ResourceId, ResourceType, ADDRESS_LEN};

/// Generate a random principal.
pub fn principal() -> impl Strategy<Value = PrincipalId> {
    any::<[u8; ADDRESS_LEN]>().prop_map(PrincipalId::from_bytes)
}

/// Generate a principal address the way a host might send it: either
/// prefix case and any mix of hex digit case.
pub fn address() -> impl Strategy<Value = String> {
    (principal(), any::<bool>(), any::<u64>()).prop_map(|(principal, upper_prefix, case_bits)| {
        let digits: String = principal.as_str()[2..]
            .chars()
            .enumerate()
            .map(|(i, c)| {
                if case_bits & (1 << (i % 64)) != 0 {
                    c.to_ascii_uppercase()
                } else {
                    c
                }
            })
            .collect();
        let prefix = if upper_prefix { "0X" } else { "0x" };
        format!("{prefix}{digits}")
    })
}

/// Generate two distinct principals.
pub fn distinct_principals() -> impl Strategy<Value = (PrincipalId, PrincipalId)> {
    (principal(), principal()).prop_filter("principals must differ", |(a, b)| a != b)
}

/// Generate a valid resource id.
pub fn resource_id() -> impl Strategy<Value = ResourceId> {
    "[a-z0-9][a-z0-9_.-]{0,31}".prop_map(|s| {
        ResourceId::parse(&s).unwrap_or_else(|e| panic!("generated invalid resource id {s:?}: {e}"))
    })
}

/// Generate a PermissionLevel.
pub fn level() -> impl Strategy<Value = PermissionLevel> {
    prop_oneof![
        Just(PermissionLevel::Reader),
        Just(PermissionLevel::Writer),
        Just(PermissionLevel::Admin),
    ]
}

/// Generate a ResourceType.
pub fn resource_type() -> impl Strategy<Value = ResourceType> {
    prop_oneof![Just(ResourceType::Group), Just(ResourceType::Database)]
}
