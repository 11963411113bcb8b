// Per-tenant SQLite database: schema migrations and the storage handle.
//
// Every tenant owns one database file. `TenantStore` is the only handle
// engine operations accept, so no operation can silently cross tenants.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};

use crate::error::Result;

const MIGRATION_V1_SQL: &str = r#"
CREATE TABLE pages (
    id              TEXT PRIMARY KEY,
    title           TEXT NOT NULL UNIQUE,
    md              TEXT NOT NULL DEFAULT '',
    html            TEXT NOT NULL DEFAULT '',
    toc             TEXT NOT NULL DEFAULT '',
    current_version INTEGER NOT NULL DEFAULT 1,
    modified_on     TEXT NOT NULL,
    modified_by     TEXT NOT NULL,
    key_rank        INTEGER NULL
);

CREATE TABLE page_versions (
    id              TEXT PRIMARY KEY,
    page_id         TEXT NOT NULL REFERENCES pages (id),
    version         INTEGER NOT NULL,
    patch           TEXT NOT NULL,
    modified_on     TEXT NOT NULL,
    modified_by     TEXT NOT NULL,
    UNIQUE (page_id, version)
);

CREATE TABLE page_refs (
    source_page_id  TEXT NOT NULL REFERENCES pages (id),
    position        INTEGER NOT NULL,
    target_page_id  TEXT NOT NULL REFERENCES pages (id),
    PRIMARY KEY (source_page_id, position)
);

CREATE INDEX page_refs_target_idx
    ON page_refs (target_page_id);

CREATE TABLE page_comments (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    page_id     TEXT NOT NULL REFERENCES pages (id),
    author      TEXT NOT NULL,
    posted_on   TEXT NOT NULL,
    md          TEXT NOT NULL,
    html        TEXT NOT NULL
);

CREATE TABLE files (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    mime_type   TEXT NOT NULL,
    size        INTEGER NOT NULL DEFAULT 0,
    uploaded_on TEXT NOT NULL,
    uploaded_by TEXT NOT NULL
);

CREATE TABLE users (
    id              TEXT PRIMARY KEY,
    name            TEXT NOT NULL UNIQUE,
    email           TEXT NOT NULL,
    password_hash   TEXT NOT NULL DEFAULT '',
    is_admin        INTEGER NOT NULL DEFAULT 0
);

CREATE VIRTUAL TABLE page_search USING fts5(
    page_id UNINDEXED,
    title,
    md,
    comments,
    tokenize = 'unicode61'
);

CREATE VIRTUAL TABLE version_search USING fts5(
    version_id UNINDEXED,
    patch_text,
    tokenize = 'unicode61'
);
"#;

const MIGRATIONS: &[(i64, &str)] = &[(1, MIGRATION_V1_SQL)];

/// Isolated storage handle for one tenant.
#[derive(Debug)]
pub struct TenantStore {
    conn: Connection,
    tenant_id: String,
    slug: String,
    blob_dir: PathBuf,
}

impl TenantStore {
    /// Open (creating and migrating if needed) the tenant database.
    pub(crate) fn open(
        db_path: &Path,
        tenant_id: &str,
        slug: &str,
        blob_dir: &Path,
    ) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut conn = Connection::open(db_path)?;
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            ",
        )?;

        ensure_migration_table(&conn)?;
        apply_pending_migrations(&mut conn)?;

        Ok(Self {
            conn,
            tenant_id: tenant_id.to_string(),
            slug: slug.to_string(),
            blob_dir: blob_dir.to_path_buf(),
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Storage handle name, also the URL path prefix for this tenant.
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Root of this tenant's blob namespace.
    pub fn blob_dir(&self) -> &Path {
        &self.blob_dir
    }

    pub fn schema_version(&self) -> Result<i64> {
        current_schema_version(&self.conn)
    }
}

fn ensure_migration_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY,
            applied_at  TEXT NOT NULL
        );
        ",
    )?;
    Ok(())
}

fn current_schema_version(conn: &Connection) -> Result<i64> {
    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

fn apply_pending_migrations(conn: &mut Connection) -> Result<()> {
    let mut current_version = current_schema_version(conn)?;

    for (version, sql) in MIGRATIONS {
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
