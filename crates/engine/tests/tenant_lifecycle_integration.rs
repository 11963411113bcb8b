// Tenant lifecycle: creation seeds storage, routing gates on the active
// flag, and deletion removes everything idempotently.

use tempfile::TempDir;

use folium_engine::store::pages::PageStore;
use folium_engine::store::users::UserStore;
use folium_engine::store::{NewAdmin, Registry};
use folium_engine::EngineError;

fn admin() -> NewAdmin {
    NewAdmin {
        name: "alice".to_string(),
        email: "alice@example.com".to_string(),
        password_hash: "opaque".to_string(),
    }
}

#[test]
fn creation_seeds_admin_and_home_page() {
    let dir = TempDir::new().expect("temp dir should create");
    let registry = Registry::open(dir.path()).expect("registry should open");

    let tenant = registry.create_tenant("Team Docs", &admin()).expect("tenant should create");
    assert_eq!(tenant.slug, "TeamDocs");
    assert!(tenant.active);

    let store = registry.resolve(&tenant.id).expect("tenant should resolve");
    let home = PageStore::get_by_title(store.connection(), "Home")
        .expect("lookup should succeed")
        .expect("Home should be seeded");
    assert_eq!(home.current_version, 1);

    let alice = UserStore::get_by_name(store.connection(), "alice")
        .expect("lookup should succeed")
        .expect("admin should be seeded");
    assert!(alice.is_admin);
}

#[test]
fn duplicate_slugs_are_rejected() {
    let dir = TempDir::new().expect("temp dir should create");
    let registry = Registry::open(dir.path()).expect("registry should open");

    registry.create_tenant("Team Docs", &admin()).expect("tenant should create");
    // Different display name, same slug after whitespace stripping.
    let error = registry.create_tenant("TeamDocs", &admin()).expect_err("create should fail");
    assert!(matches!(error, EngineError::TenantExists(_)));
    assert_eq!(registry.list().expect("list should succeed").len(), 1);
}

#[test]
fn routing_gates_on_the_active_flag() {
    let dir = TempDir::new().expect("temp dir should create");
    let registry = Registry::open(dir.path()).expect("registry should open");

    let tenant = registry.create_tenant("Team Docs", &admin()).expect("tenant should create");

    registry.deactivate(&tenant.id).expect("deactivate should succeed");
    let error = registry.resolve(&tenant.id).expect_err("resolve should fail");
    assert!(matches!(error, EngineError::InactiveTenant(_)));

    registry.reactivate(&tenant.id).expect("reactivate should succeed");
    // Data survived the inactive window.
    let store = registry.resolve(&tenant.id).expect("tenant should resolve");
    assert!(PageStore::get_by_title(store.connection(), "Home")
        .expect("lookup should succeed")
        .is_some());
}

#[test]
fn unknown_tenants_are_rejected_before_any_operation() {
    let dir = TempDir::new().expect("temp dir should create");
    let registry = Registry::open(dir.path()).expect("registry should open");

    let error = registry.resolve("no-such-tenant").expect_err("resolve should fail");
    assert!(matches!(error, EngineError::UnknownTenant(_)));
}

#[test]
fn deletion_is_idempotent_and_removes_storage() {
    let dir = TempDir::new().expect("temp dir should create");
    let registry = Registry::open(dir.path()).expect("registry should open");

    let tenant = registry.create_tenant("Team Docs", &admin()).expect("tenant should create");
    let db_path = dir.path().join("tenants").join("TeamDocs.db");
    assert!(db_path.exists());

    registry.delete_tenant(&tenant.id).expect("delete should succeed");
    assert!(!db_path.exists());
    assert!(!dir.path().join("blobs").join("TeamDocs").exists());
    assert!(registry.list().expect("list should succeed").is_empty());

    // Deleting again is a no-op, not an error.
    registry.delete_tenant(&tenant.id).expect("repeat delete should succeed");
}

#[test]
fn tenants_are_fully_isolated() {
    let dir = TempDir::new().expect("temp dir should create");
    let registry = Registry::open(dir.path()).expect("registry should open");

    let first = registry.create_tenant("First Wiki", &admin()).expect("tenant should create");
    let second = registry.create_tenant("Second Wiki", &admin()).expect("tenant should create");

    let first_store = registry.resolve(&first.id).expect("tenant should resolve");
    PageStore::create_stub(first_store.connection(), "Only In First", "alice")
        .expect("stub should create");

    let second_store = registry.resolve(&second.id).expect("tenant should resolve");
    assert!(PageStore::get_by_title(second_store.connection(), "Only In First")
        .expect("lookup should succeed")
        .is_none());
}
