// Full-text page search over the FTS5 index.
//
// One row per page: title, live markdown, and the page's comments in one
// column. Title matches rank well above body matches, body above comments.

use rusqlite::{params, Connection};

use crate::error::Result;
use crate::store::pages::PageStore;
use crate::store::versions::fts_phrase;
use folium_common::types::Page;

#[derive(Debug, Clone)]
pub struct SearchHit {
    pub page: Page,
    /// bm25 score, lower is better.
    pub rank: f64,
}

/// Rebuild the search row for one page from its live row and comments.
pub fn refresh_page(conn: &Connection, page_id: &str) -> Result<()> {
    let page = PageStore::require(conn, page_id)?;
    let comments: String = PageStore::comments(conn, page_id)?
        .into_iter()
        .map(|comment| comment.md)
        .collect::<Vec<_>>()
        .join("\n");

    conn.execute("DELETE FROM page_search WHERE page_id = ?1", params![page_id])?;
    conn.execute(
        "INSERT INTO page_search (page_id, title, md, comments) VALUES (?1, ?2, ?3, ?4)",
        params![page_id, page.title, page.md, comments],
    )?;
    Ok(())
}

/// Search pages, best match first. A query with no word tokens matches
/// nothing.
pub fn search_pages(conn: &Connection, query: &str) -> Result<Vec<SearchHit>> {
    let Some(phrase) = fts_phrase(query) else {
        return Ok(Vec::new());
    };

    let mut stmt = conn.prepare(
        "SELECT page_id, bm25(page_search, 0.0, 10.0, 2.0, 1.0) AS rank \
         FROM page_search WHERE page_search MATCH ?1 ORDER BY rank ASC",
    )?;
    let rows = stmt
        .query_map(params![phrase], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut hits = Vec::with_capacity(rows.len());
    for (page_id, rank) in rows {
        hits.push(SearchHit { page: PageStore::require(conn, &page_id)?, rank });
    }
    Ok(hits)
}
