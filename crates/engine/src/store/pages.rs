// pages table access: stub creation, reads, the edit CAS, rename writes.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::error::{EngineError, Result};
use folium_common::types::{Comment, Page};

const PAGE_COLUMNS: &str =
    "id, title, md, html, toc, current_version, modified_on, modified_by, key_rank";

pub struct PageStore;

impl PageStore {
    /// Create an empty stub page. This happens on explicit creation and
    /// when the renderer resolves a title with no existing match.
    pub fn create_stub(conn: &Connection, title: &str, author: &str) -> Result<Page> {
        let page = Page {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            md: String::new(),
            html: String::new(),
            toc: String::new(),
            current_version: 1,
            modified_on: Utc::now(),
            modified_by: author.to_string(),
            key_rank: None,
        };

        conn.execute(
            "INSERT INTO pages (id, title, md, html, toc, current_version, modified_on, modified_by) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                page.id,
                page.title,
                page.md,
                page.html,
                page.toc,
                page.current_version,
                page.modified_on,
                page.modified_by,
            ],
        )?;
        Ok(page)
    }

    pub fn get(conn: &Connection, page_id: &str) -> Result<Option<Page>> {
        let page = conn
            .query_row(
                &format!("SELECT {PAGE_COLUMNS} FROM pages WHERE id = ?1"),
                params![page_id],
                row_to_page,
            )
            .optional()?;
        Ok(page)
    }

    pub fn get_by_title(conn: &Connection, title: &str) -> Result<Option<Page>> {
        let page = conn
            .query_row(
                &format!("SELECT {PAGE_COLUMNS} FROM pages WHERE title = ?1"),
                params![title],
                row_to_page,
            )
            .optional()?;
        Ok(page)
    }

    pub fn require(conn: &Connection, page_id: &str) -> Result<Page> {
        Self::get(conn, page_id)?.ok_or_else(|| EngineError::PageNotFound(page_id.to_string()))
    }

    /// Apply a recorded edit behind a compare-and-swap on `current_version`.
    ///
    /// Returns false when a concurrent editor advanced the version first;
    /// the caller rolls back and reports `StaleEdit`.
    #[allow(clippy::too_many_arguments)]
    pub fn apply_edit(
        conn: &Connection,
        page_id: &str,
        expected_version: i64,
        md: &str,
        html: &str,
        toc: &str,
        author: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE pages \
             SET md = ?1, html = ?2, toc = ?3, current_version = current_version + 1, \
                 modified_on = ?4, modified_by = ?5 \
             WHERE id = ?6 AND current_version = ?7",
            params![md, html, toc, now, author, page_id, expected_version],
        )?;
        Ok(changed > 0)
    }

    /// Rename-cascade substitution write. Deliberately leaves version,
    /// timestamp, and author untouched: a rename is not an authored edit
    /// of the referencing page.
    pub fn overwrite_content(conn: &Connection, page_id: &str, md: &str, html: &str) -> Result<()> {
        conn.execute(
            "UPDATE pages SET md = ?1, html = ?2 WHERE id = ?3",
            params![md, html, page_id],
        )?;
        Ok(())
    }

    pub fn set_title(conn: &Connection, page_id: &str, new_title: &str) -> Result<()> {
        conn.execute(
            "UPDATE pages SET title = ?1 WHERE id = ?2",
            params![new_title, page_id],
        )?;
        Ok(())
    }

    /// Recent-changes listing, newest modification first.
    pub fn list_recent(conn: &Connection, limit: usize) -> Result<Vec<Page>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {PAGE_COLUMNS} FROM pages ORDER BY modified_on DESC LIMIT ?1"
        ))?;
        let rows = stmt.query_map(params![limit as i64], row_to_page)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn set_key_rank(conn: &Connection, page_id: &str, rank: Option<i64>) -> Result<()> {
        conn.execute(
            "UPDATE pages SET key_rank = ?1 WHERE id = ?2",
            params![rank, page_id],
        )?;
        Ok(())
    }

    /// The curated "key pages" subset in rank order.
    pub fn list_key_pages(conn: &Connection) -> Result<Vec<Page>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {PAGE_COLUMNS} FROM pages WHERE key_rank IS NOT NULL ORDER BY key_rank ASC"
        ))?;
        let rows = stmt.query_map([], row_to_page)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn add_comment(
        conn: &Connection,
        page_id: &str,
        author: &str,
        md: &str,
        html: &str,
        now: DateTime<Utc>,
    ) -> Result<Comment> {
        conn.execute(
            "INSERT INTO page_comments (page_id, author, posted_on, md, html) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![page_id, author, now, md, html],
        )?;
        let id = conn.last_insert_rowid();
        Ok(Comment {
            id,
            page_id: page_id.to_string(),
            author: author.to_string(),
            posted_on: now,
            md: md.to_string(),
            html: html.to_string(),
        })
    }

    pub fn comments(conn: &Connection, page_id: &str) -> Result<Vec<Comment>> {
        let mut stmt = conn.prepare(
            "SELECT id, page_id, author, posted_on, md, html \
             FROM page_comments WHERE page_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![page_id], |row| {
            Ok(Comment {
                id: row.get(0)?,
                page_id: row.get(1)?,
                author: row.get(2)?,
                posted_on: row.get(3)?,
                md: row.get(4)?,
                html: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

fn row_to_page(row: &rusqlite::Row<'_>) -> rusqlite::Result<Page> {
    Ok(Page {
        id: row.get(0)?,
        title: row.get(1)?,
        md: row.get(2)?,
        html: row.get(3)?,
        toc: row.get(4)?,
        current_version: row.get(5)?,
        modified_on: row.get(6)?,
        modified_by: row.get(7)?,
        key_rank: row.get(8)?,
    })
}
