// page_versions table access, plus the version text index the rename
// cascade searches.
//
// Records are append-only. The single sanctioned mutation is
// `rewrite_patch`, used when a rename rewrites archived diff content.

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use folium_common::patch::Patch;
use folium_common::types::VersionRecord;

pub struct VersionStore;

impl VersionStore {
    /// Append one record and index its patch payload text.
    pub fn append(conn: &Connection, record: &VersionRecord, patch_text: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO page_versions (id, page_id, version, patch, modified_on, modified_by) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.id,
                record.page_id,
                record.version,
                record.patch,
                record.modified_on,
                record.modified_by,
            ],
        )?;
        conn.execute(
            "INSERT INTO version_search (version_id, patch_text) VALUES (?1, ?2)",
            params![record.id, patch_text],
        )?;
        Ok(())
    }

    /// All records for a page, oldest first.
    pub fn list_for_page(conn: &Connection, page_id: &str) -> Result<Vec<VersionRecord>> {
        let mut stmt = conn.prepare(
            "SELECT id, page_id, version, patch, modified_on, modified_by \
             FROM page_versions WHERE page_id = ?1 ORDER BY version ASC",
        )?;
        let rows = stmt.query_map(params![page_id], row_to_record)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get(conn: &Connection, page_id: &str, version: i64) -> Result<Option<VersionRecord>> {
        let record = conn
            .query_row(
                "SELECT id, page_id, version, patch, modified_on, modified_by \
                 FROM page_versions WHERE page_id = ?1 AND version = ?2",
                params![page_id, version],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    pub fn count_for_page(conn: &Connection, page_id: &str) -> Result<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM page_versions WHERE page_id = ?1",
            params![page_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Rewrite a record's patch in place and refresh its text index row.
    pub fn rewrite_patch(
        conn: &Connection,
        version_id: &str,
        patch_json: &str,
        patch_text: &str,
    ) -> Result<()> {
        conn.execute(
            "UPDATE page_versions SET patch = ?1 WHERE id = ?2",
            params![patch_json, version_id],
        )?;
        conn.execute(
            "DELETE FROM version_search WHERE version_id = ?1",
            params![version_id],
        )?;
        conn.execute(
            "INSERT INTO version_search (version_id, patch_text) VALUES (?1, ?2)",
            params![version_id, patch_text],
        )?;
        Ok(())
    }

    /// Distinct ids of pages owning a version record whose patch payload
    /// contains `needle` literally.
    ///
    /// The FTS index narrows candidates by the needle's word tokens;
    /// literal containment is then verified against the decoded patch. A
    /// needle with no word tokens (all punctuation) falls back to a full
    /// walk of the collection.
    pub fn pages_with_patch_text(conn: &Connection, needle: &str) -> Result<Vec<String>> {
        let candidates = match fts_phrase(needle) {
            Some(phrase) => {
                let mut stmt = conn.prepare(
                    "SELECT pv.id, pv.page_id, pv.patch \
                     FROM version_search \
                     JOIN page_versions pv ON pv.id = version_search.version_id \
                     WHERE version_search MATCH ?1",
                )?;
                let rows = stmt.query_map(params![phrase], row_to_candidate)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let mut stmt =
                    conn.prepare("SELECT id, page_id, patch FROM page_versions")?;
                let rows = stmt.query_map([], row_to_candidate)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };

        let mut page_ids = Vec::new();
        for (_, page_id, patch_json) in candidates {
            if page_ids.contains(&page_id) {
                continue;
            }
            let patch = Patch::from_json(&patch_json)?;
            if patch.payload_contains(needle) {
                page_ids.push(page_id);
            }
        }
        Ok(page_ids)
    }
}

type Candidate = (String, String, String);

fn row_to_candidate(row: &rusqlite::Row<'_>) -> rusqlite::Result<Candidate> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

/// Quote the needle's word tokens as an FTS5 phrase query.
pub(crate) fn fts_phrase(needle: &str) -> Option<String> {
    let words: Vec<&str> = needle
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect();
    if words.is_empty() {
        return None;
    }
    Some(format!("\"{}\"", words.join(" ")))
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<VersionRecord> {
    Ok(VersionRecord {
        id: row.get(0)?,
        page_id: row.get(1)?,
        version: row.get(2)?,
        patch: row.get(3)?,
        modified_on: row.get(4)?,
        modified_by: row.get(5)?,
    })
}
