// Tenant registry and store router.
//
// One registry database maps tenant id -> storage slug -> active flag.
// Each tenant owns a database file under `tenants/` and a blob directory
// under `blobs/`; `resolve` hands out the only handle engine operations
// accept. Routing errors are rejected here, before any page operation.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::store::pages::PageStore;
use crate::store::tenant_db::TenantStore;
use crate::store::users::UserStore;
use folium_common::types::Tenant;

const REGISTRY_MIGRATION_V1_SQL: &str = r#"
CREATE TABLE tenants (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    slug        TEXT NOT NULL UNIQUE,
    active      INTEGER NOT NULL DEFAULT 1,
    created_on  TEXT NOT NULL
);
"#;

const REGISTRY_MIGRATIONS: &[(i64, &str)] = &[(1, REGISTRY_MIGRATION_V1_SQL)];

/// Credentials for the admin seeded into a new tenant. The password hash
/// is produced by the (out-of-scope) auth layer and stored opaquely.
#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

pub struct Registry {
    conn: Connection,
    data_dir: PathBuf,
}

impl Registry {
    /// Open (creating if needed) the registry database under `data_dir`.
    pub fn open(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)?;
        let mut conn = Connection::open(data_dir.join("registry.db"))?;
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            ",
        )?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version     INTEGER PRIMARY KEY,
                applied_at  TEXT NOT NULL
            );
            ",
        )?;
        apply_registry_migrations(&mut conn)?;

        Ok(Self { conn, data_dir: data_dir.to_path_buf() })
    }

    /// Create a tenant: registry row, database, blob directory, seeded
    /// admin user, and the stub "Home" page.
    ///
    /// If any allocation step fails after a prior one succeeded, the
    /// prior steps are undone before the error returns; a partial tenant
    /// is never observable as usable.
    pub fn create_tenant(&self, display_name: &str, admin: &NewAdmin) -> Result<Tenant> {
        let slug: String = display_name.split_whitespace().collect();
        if slug.is_empty() {
            return Err(EngineError::InvalidTenantName(display_name.to_string()));
        }

        let taken: Option<String> = self
            .conn
            .query_row(
                "SELECT slug FROM tenants WHERE slug = ?1 OR name = ?2",
                params![slug, display_name],
                |row| row.get(0),
            )
            .optional()?;
        if taken.is_some() {
            return Err(EngineError::TenantExists(slug));
        }

        let tenant = Tenant {
            id: Uuid::new_v4().to_string(),
            name: display_name.to_string(),
            slug: slug.clone(),
            active: true,
            created_on: Utc::now(),
        };

        if let Err(error) = self.allocate_tenant_storage(&tenant, admin) {
            self.remove_tenant_storage(&slug);
            return Err(error);
        }

        if let Err(error) = self.conn.execute(
            "INSERT INTO tenants (id, name, slug, active, created_on) \
             VALUES (?1, ?2, ?3, 1, ?4)",
            params![tenant.id, tenant.name, tenant.slug, tenant.created_on],
        ) {
            self.remove_tenant_storage(&slug);
            return Err(error.into());
        }

        info!(slug = %tenant.slug, "created wiki group");
        Ok(tenant)
    }

    /// Resolve a tenant id to its storage handle.
    pub fn resolve(&self, tenant_id: &str) -> Result<TenantStore> {
        let tenant = self
            .get(tenant_id)?
            .ok_or_else(|| EngineError::UnknownTenant(tenant_id.to_string()))?;
        if !tenant.active {
            return Err(EngineError::InactiveTenant(tenant.slug));
        }

        TenantStore::open(
            &self.tenant_db_path(&tenant.slug),
            &tenant.id,
            &tenant.slug,
            &self.tenant_blob_dir(&tenant.slug),
        )
    }

    pub fn get(&self, tenant_id: &str) -> Result<Option<Tenant>> {
        let tenant = self
            .conn
            .query_row(
                "SELECT id, name, slug, active, created_on FROM tenants WHERE id = ?1",
                params![tenant_id],
                row_to_tenant,
            )
            .optional()?;
        Ok(tenant)
    }

    pub fn get_by_slug(&self, slug: &str) -> Result<Option<Tenant>> {
        let tenant = self
            .conn
            .query_row(
                "SELECT id, name, slug, active, created_on FROM tenants WHERE slug = ?1",
                params![slug],
                row_to_tenant,
            )
            .optional()?;
        Ok(tenant)
    }

    pub fn list(&self) -> Result<Vec<Tenant>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, slug, active, created_on FROM tenants ORDER BY name ASC")?;
        let rows = stmt.query_map([], row_to_tenant)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Detach a tenant: resolve starts failing, data is retained.
    pub fn deactivate(&self, tenant_id: &str) -> Result<()> {
        self.set_active(tenant_id, false)
    }

    pub fn reactivate(&self, tenant_id: &str) -> Result<()> {
        self.set_active(tenant_id, true)
    }

    /// Irreversibly drop a tenant: pages, versions, files, users, and the
    /// registry row. Idempotent against a half-deleted prior attempt.
    pub fn delete_tenant(&self, tenant_id: &str) -> Result<()> {
        let Some(tenant) = self.get(tenant_id)? else {
            // Already gone; deleting again is not an error.
            return Ok(());
        };

        self.remove_tenant_storage(&tenant.slug);
        self.conn.execute("DELETE FROM tenants WHERE id = ?1", params![tenant_id])?;
        info!(slug = %tenant.slug, "deleted wiki group");
        Ok(())
    }

    fn set_active(&self, tenant_id: &str, active: bool) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE tenants SET active = ?1 WHERE id = ?2",
            params![active, tenant_id],
        )?;
        if changed == 0 {
            return Err(EngineError::UnknownTenant(tenant_id.to_string()));
        }
        Ok(())
    }

    fn allocate_tenant_storage(&self, tenant: &Tenant, admin: &NewAdmin) -> Result<()> {
        fs::create_dir_all(self.tenant_blob_dir(&tenant.slug))?;

        let store = TenantStore::open(
            &self.tenant_db_path(&tenant.slug),
            &tenant.id,
            &tenant.slug,
            &self.tenant_blob_dir(&tenant.slug),
        )?;
        UserStore::insert(
            store.connection(),
            &admin.name,
            &admin.email,
            &admin.password_hash,
            true,
        )?;
        PageStore::create_stub(store.connection(), "Home", "system")?;
        Ok(())
    }

    /// Best effort: removing an already-gone namespace is not an error.
    fn remove_tenant_storage(&self, slug: &str) {
        let db_path = self.tenant_db_path(slug);
        for path in [
            db_path.clone(),
            PathBuf::from(format!("{}-wal", db_path.display())),
            PathBuf::from(format!("{}-shm", db_path.display())),
        ] {
            if let Err(error) = fs::remove_file(&path) {
                if error.kind() != std::io::ErrorKind::NotFound {
                    warn!(%slug, path = %path.display(), %error, "failed to remove tenant database file");
                }
            }
        }
        if let Err(error) = fs::remove_dir_all(self.tenant_blob_dir(slug)) {
            if error.kind() != std::io::ErrorKind::NotFound {
                warn!(%slug, %error, "failed to remove tenant blob directory");
            }
        }
    }

    fn tenant_db_path(&self, slug: &str) -> PathBuf {
        self.data_dir.join("tenants").join(format!("{slug}.db"))
    }

    fn tenant_blob_dir(&self, slug: &str) -> PathBuf {
        self.data_dir.join("blobs").join(slug)
    }
}

fn apply_registry_migrations(conn: &mut Connection) -> Result<()> {
    let mut current_version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    for (version, sql) in REGISTRY_MIGRATIONS {
        if *version <= current_version {
            continue;
        }

        let tx = conn.transaction()?;
        tx.execute_batch(sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, datetime('now'))",
            params![version],
        )?;
        tx.commit()?;
        current_version = *version;
    }

    Ok(())
}

fn row_to_tenant(row: &rusqlite::Row<'_>) -> rusqlite::Result<Tenant> {
    Ok(Tenant {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        active: row.get(3)?,
        created_on: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::{NewAdmin, Registry};
    use crate::error::EngineError;

    fn admin() -> NewAdmin {
        NewAdmin {
            name: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "argon2-opaque".to_string(),
        }
    }

    #[test]
    fn slug_strips_all_whitespace() {
        let dir = TempDir::new().expect("temp dir should create");
        let registry = Registry::open(dir.path()).expect("registry should open");

        let tenant =
            registry.create_tenant("Team  Docs Group", &admin()).expect("tenant should create");
        assert_eq!(tenant.slug, "TeamDocsGroup");
    }

    #[test]
    fn whitespace_only_names_are_rejected() {
        let dir = TempDir::new().expect("temp dir should create");
        let registry = Registry::open(dir.path()).expect("registry should open");

        let error = registry.create_tenant("   ", &admin()).expect_err("create should fail");
        assert!(matches!(error, EngineError::InvalidTenantName(_)));
    }
}
