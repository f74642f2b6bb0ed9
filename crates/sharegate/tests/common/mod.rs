//! Shared setup for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use sharegate::{ManagerConfig, PermissionManager};
use sharegate_testkit::fixtures::{address, TestFixture};

pub const GROUP: &str = "team-notes";
pub const DB1: &str = "notes-db-1";
pub const DB2: &str = "notes-db-2";

/// Principals used across scenarios.
pub struct Parties {
    pub owner: String,
    pub alice: String,
    pub bob: String,
    pub carol: String,
}

impl Parties {
    pub fn new() -> Self {
        Self {
            owner: address(1),
            alice: address(2),
            bob: address(3),
            carol: address(4),
        }
    }
}

/// Route `tracing` output through the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A manager over the fixture's memory store.
pub fn manager(fixture: &TestFixture, config: ManagerConfig) -> PermissionManager {
    PermissionManager::new(Arc::new(fixture.storage()), config)
}
