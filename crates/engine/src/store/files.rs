// files table access: upload metadata only. Payload bytes live in the
// blob store.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{EngineError, Result};
use folium_common::types::FileRecord;

pub struct FileStore;

impl FileStore {
    pub fn insert(
        conn: &Connection,
        name: &str,
        mime_type: &str,
        size: i64,
        uploaded_by: &str,
        now: DateTime<Utc>,
    ) -> Result<FileRecord> {
        conn.execute(
            "INSERT INTO files (name, mime_type, size, uploaded_on, uploaded_by) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![name, mime_type, size, now, uploaded_by],
        )?;
        Ok(FileRecord {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            size,
            uploaded_on: now,
            uploaded_by: uploaded_by.to_string(),
        })
    }

    pub fn get(conn: &Connection, file_id: i64) -> Result<Option<FileRecord>> {
        let record = conn
            .query_row(
                "SELECT id, name, mime_type, size, uploaded_on, uploaded_by \
                 FROM files WHERE id = ?1",
                params![file_id],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    pub fn require(conn: &Connection, file_id: i64) -> Result<FileRecord> {
        Self::get(conn, file_id)?.ok_or(EngineError::FileNotFound(file_id))
    }

    pub fn list(conn: &Connection) -> Result<Vec<FileRecord>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, mime_type, size, uploaded_on, uploaded_by \
             FROM files ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], row_to_record)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<FileRecord> {
    Ok(FileRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        mime_type: row.get(2)?,
        size: row.get(3)?,
        uploaded_on: row.get(4)?,
        uploaded_by: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::FileStore;
    use crate::store::tenant_db::TenantStore;

    #[test]
    fn insert_assigns_sequential_ids_and_get_round_trips() {
        let dir = TempDir::new().expect("temp dir should create");
        let store = TenantStore::open(
            &dir.path().join("tenant.db"),
            "tenant-1",
            "TeamDocs",
            &dir.path().join("blobs"),
        )
        .expect("tenant store should open");

        let first = FileStore::insert(
            store.connection(),
            "diagram.png",
            "image/png",
            2_048,
            "alice",
            chrono::Utc::now(),
        )
        .expect("insert should succeed");
        let second = FileStore::insert(
            store.connection(),
            "notes.pdf",
            "application/pdf",
            4_096,
            "bob",
            chrono::Utc::now(),
        )
        .expect("insert should succeed");
        assert_eq!(second.id, first.id + 1);

        let loaded = FileStore::get(store.connection(), first.id)
            .expect("get should succeed")
            .expect("record should exist");
        assert_eq!(loaded, first);

        assert_eq!(FileStore::list(store.connection()).expect("list should succeed").len(), 2);
        assert!(FileStore::require(store.connection(), 999).is_err());
    }
}
