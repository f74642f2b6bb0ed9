//! Group-to-database cascades.

mod common;

use std::sync::Arc;

use anyhow::Result;
use sharegate::perms::StorageConfig;
use sharegate::{
    CascadeReport, CascadeStatus, ManagerConfig, PermissionLevel, PermissionManager, ResourceId,
    ResourceType,
};
use sharegate_testkit::faults::FaultyBlobStore;
use sharegate_testkit::fixtures::TestFixture;

use common::{init_tracing, manager, Parties, DB1, DB2, GROUP};

async fn linked_manager(fixture: &TestFixture, p: &Parties) -> Result<PermissionManager> {
    let manager = manager(fixture, ManagerConfig::default());
    manager.set_resource_owner(GROUP, &p.owner).await?;
    manager.link_databases(GROUP, [DB1, DB2]).await?;
    Ok(manager)
}

#[tokio::test]
async fn cascade_grant_reaches_linked_databases() -> Result<()> {
    init_tracing();
    let fixture = TestFixture::new();
    let p = Parties::new();
    let manager = linked_manager(&fixture, &p).await?;

    let outcome = manager
        .grant_permission(GROUP, ResourceType::Group, &p.owner, &p.alice, PermissionLevel::Reader, true)
        .await?;

    assert!(outcome.is_complete());
    assert_eq!(outcome.cascaded.len(), 2);
    assert!(outcome
        .cascaded
        .iter()
        .all(|r| r.status == CascadeStatus::Applied));
    for db in [DB1, DB2] {
        assert_eq!(
            manager.check_permission(db, &p.alice).await?,
            Some(PermissionLevel::Reader)
        );
        let records = manager.list_permissions(db, &p.owner).await?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].resource_type, ResourceType::Database);
        assert_eq!(records[0].granted_by.as_str(), p.owner);
    }
    Ok(())
}

#[tokio::test]
async fn grant_without_cascade_stays_on_group() -> Result<()> {
    let fixture = TestFixture::new();
    let p = Parties::new();
    let manager = linked_manager(&fixture, &p).await?;

    let outcome = manager
        .grant_permission(GROUP, ResourceType::Group, &p.owner, &p.alice, PermissionLevel::Reader, false)
        .await?;

    assert!(outcome.cascaded.is_empty());
    assert_eq!(manager.check_permission(DB1, &p.alice).await?, None);
    assert_eq!(manager.check_permission(DB2, &p.alice).await?, None);
    Ok(())
}

#[tokio::test]
async fn database_grants_never_cascade() -> Result<()> {
    let fixture = TestFixture::new();
    let p = Parties::new();
    let manager = manager(&fixture, ManagerConfig::default());
    manager.link_databases(DB1, [DB2]).await?;

    let outcome = manager
        .grant_permission(DB1, ResourceType::Database, &p.owner, &p.alice, PermissionLevel::Writer, true)
        .await?;

    assert!(outcome.cascaded.is_empty());
    assert_eq!(manager.check_permission(DB2, &p.alice).await?, None);
    Ok(())
}

#[tokio::test]
async fn cascade_revoke_clears_databases() -> Result<()> {
    let fixture = TestFixture::new();
    let p = Parties::new();
    let manager = linked_manager(&fixture, &p).await?;
    manager
        .grant_permission(GROUP, ResourceType::Group, &p.owner, &p.alice, PermissionLevel::Writer, true)
        .await?;

    let outcome = manager
        .revoke_permission(GROUP, &p.owner, &p.alice, true)
        .await?;

    assert!(outcome.is_complete());
    assert!(outcome
        .cascaded
        .iter()
        .all(|r| r.status == CascadeStatus::Applied));
    assert_eq!(manager.check_permission(GROUP, &p.alice).await?, None);
    assert_eq!(manager.check_permission(DB1, &p.alice).await?, None);
    assert_eq!(manager.check_permission(DB2, &p.alice).await?, None);
    Ok(())
}

#[tokio::test]
async fn cascade_revoke_skips_databases_without_grants() -> Result<()> {
    let fixture = TestFixture::new();
    let p = Parties::new();
    let manager = linked_manager(&fixture, &p).await?;
    manager
        .grant_permission(GROUP, ResourceType::Group, &p.owner, &p.alice, PermissionLevel::Reader, false)
        .await?;
    manager
        .grant_permission(DB2, ResourceType::Database, &p.owner, &p.alice, PermissionLevel::Reader, false)
        .await?;

    let outcome = manager
        .revoke_permission(GROUP, &p.owner, &p.alice, true)
        .await?;

    let statuses: Vec<_> = outcome
        .cascaded
        .iter()
        .map(|r| (r.resource_id.as_str().to_string(), r.status.clone()))
        .collect();
    assert_eq!(
        statuses,
        vec![
            (DB1.to_string(), CascadeStatus::Skipped),
            (DB2.to_string(), CascadeStatus::Applied),
        ]
    );
    assert!(outcome.is_complete());
    Ok(())
}

#[tokio::test]
async fn relinking_replaces_cascade_targets() -> Result<()> {
    let fixture = TestFixture::new();
    let p = Parties::new();
    let manager = linked_manager(&fixture, &p).await?;
    manager.link_databases(GROUP, ["notes-db-3"]).await?;

    assert_eq!(
        manager.get_linked_databases(GROUP).await?,
        vec![ResourceId::parse("notes-db-3")?]
    );

    manager
        .grant_permission(GROUP, ResourceType::Group, &p.owner, &p.alice, PermissionLevel::Reader, true)
        .await?;
    assert_eq!(manager.check_permission(DB1, &p.alice).await?, None);
    assert_eq!(
        manager.check_permission("notes-db-3", &p.alice).await?,
        Some(PermissionLevel::Reader)
    );
    Ok(())
}

#[tokio::test]
async fn failing_database_is_reported_not_raised() -> Result<()> {
    init_tracing();
    let fixture = TestFixture::new();
    let p = Parties::new();
    let store = Arc::new(FaultyBlobStore::wrap(fixture.store.clone()));
    let storage = fixture.storage_over(store.clone(), StorageConfig::default());
    store.fail_puts_under(storage.resource_prefix(&ResourceId::parse(DB1)?));

    let manager = PermissionManager::new(Arc::new(storage), ManagerConfig::default());
    manager.set_resource_owner(GROUP, &p.owner).await?;
    manager.link_databases(GROUP, [DB1, DB2]).await?;

    let outcome = manager
        .grant_permission(GROUP, ResourceType::Group, &p.owner, &p.alice, PermissionLevel::Writer, true)
        .await?;

    assert!(!outcome.is_complete());
    let failures = outcome.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].resource_id.as_str(), DB1);
    assert!(failures[0].error().is_some_and(|e| e.contains("injected")));

    assert_eq!(
        manager.check_permission(GROUP, &p.alice).await?,
        Some(PermissionLevel::Writer)
    );
    assert_eq!(manager.check_permission(DB1, &p.alice).await?, None);
    assert_eq!(
        manager.check_permission(DB2, &p.alice).await?,
        Some(PermissionLevel::Writer)
    );

    // Retrying after the store heals brings the database in line.
    store.heal();
    let retry = manager
        .grant_permission(GROUP, ResourceType::Group, &p.owner, &p.alice, PermissionLevel::Writer, true)
        .await?;
    assert!(retry.is_complete());
    assert_eq!(
        manager.check_permission(DB1, &p.alice).await?,
        Some(PermissionLevel::Writer)
    );
    Ok(())
}

#[tokio::test]
async fn primary_write_failure_propagates() -> Result<()> {
    let fixture = TestFixture::new();
    let p = Parties::new();
    let store = Arc::new(FaultyBlobStore::wrap(fixture.store.clone()));
    let storage = fixture.storage_over(store.clone(), StorageConfig::default());
    store.fail_puts_under(storage.resource_prefix(&ResourceId::parse(GROUP)?));
    let manager = PermissionManager::new(Arc::new(storage), ManagerConfig::default());

    let err = manager
        .grant_permission(GROUP, ResourceType::Group, &p.owner, &p.alice, PermissionLevel::Reader, true)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), sharegate::ErrorKind::ServerError);
    assert_eq!(manager.check_permission(GROUP, &p.alice).await?, None);
    Ok(())
}

#[tokio::test]
async fn cascade_grant_needs_authority_over_each_database() -> Result<()> {
    let fixture = TestFixture::new();
    let p = Parties::new();
    let manager = linked_manager(&fixture, &p).await?;
    manager.set_resource_owner(DB1, &p.carol).await?;

    let outcome = manager
        .grant_permission(GROUP, ResourceType::Group, &p.owner, &p.alice, PermissionLevel::Admin, true)
        .await?;

    assert!(!outcome.is_complete());
    let failures = outcome.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].resource_id.as_str(), DB1);
    assert!(failures[0].error().is_some_and(|e| e.contains("only the owner")));
    assert_eq!(outcome.cascaded[1].status, CascadeStatus::Applied);

    assert_eq!(manager.check_permission(DB1, &p.alice).await?, None);
    assert!(manager.list_permissions(DB1, &p.carol).await?.is_empty());
    assert_eq!(
        manager.check_permission(DB2, &p.alice).await?,
        Some(PermissionLevel::Admin)
    );
    Ok(())
}

#[tokio::test]
async fn cascade_revoke_needs_authority_over_each_database() -> Result<()> {
    let fixture = TestFixture::new();
    let p = Parties::new();
    let manager = linked_manager(&fixture, &p).await?;
    manager.set_resource_owner(DB1, &p.carol).await?;
    manager
        .grant_permission(DB1, ResourceType::Database, &p.carol, &p.alice, PermissionLevel::Writer, false)
        .await?;
    manager
        .grant_permission(GROUP, ResourceType::Group, &p.owner, &p.alice, PermissionLevel::Writer, false)
        .await?;

    let outcome = manager
        .revoke_permission(GROUP, &p.owner, &p.alice, true)
        .await?;

    assert!(matches!(outcome.cascaded[0].status, CascadeStatus::Failed(_)));
    assert_eq!(outcome.cascaded[1].status, CascadeStatus::Skipped);
    assert_eq!(
        manager.check_permission(DB1, &p.alice).await?,
        Some(PermissionLevel::Writer)
    );
    Ok(())
}

#[tokio::test]
async fn database_revokes_never_cascade() -> Result<()> {
    let fixture = TestFixture::new();
    let p = Parties::new();
    let manager = manager(&fixture, ManagerConfig::default());
    manager.link_databases(DB1, [DB2]).await?;
    for db in [DB1, DB2] {
        manager
            .grant_permission(db, ResourceType::Database, &p.owner, &p.alice, PermissionLevel::Reader, false)
            .await?;
    }

    let outcome = manager
        .revoke_permission(DB1, &p.owner, &p.alice, true)
        .await?;

    assert!(outcome.cascaded.is_empty());
    assert_eq!(manager.check_permission(DB1, &p.alice).await?, None);
    assert_eq!(
        manager.check_permission(DB2, &p.alice).await?,
        Some(PermissionLevel::Reader)
    );
    Ok(())
}
