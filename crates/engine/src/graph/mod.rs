// Reference graph: which page links to which, answered from an indexed
// edge table, plus the rename cascade that keeps link text consistent
// across live content and archived history.

use std::collections::HashMap;

use rusqlite::{params, Connection};
use tracing::{debug, info};

use crate::error::{EngineError, Result};
use crate::render::page_link_html;
use crate::search;
use crate::store::pages::PageStore;
use crate::store::versions::VersionStore;
use crate::store::TenantStore;
use folium_common::link::page_link_source;
use folium_common::patch::{self, Patch, PatchError};
use folium_common::types::{Page, VersionRecord};

/// Replace a page's outgoing reference set wholesale.
///
/// Titles are resolved to page ids; order of first appearance is kept and
/// duplicates collapse. Titles with no page row are skipped (the renderer
/// creates stubs before this runs).
pub fn replace_refs(conn: &Connection, source_page_id: &str, titles: &[String]) -> Result<()> {
    conn.execute("DELETE FROM page_refs WHERE source_page_id = ?1", params![source_page_id])?;

    let mut position = 0i64;
    let mut seen: Vec<String> = Vec::new();
    for title in titles {
        let Some(target) = PageStore::get_by_title(conn, title)? else {
            debug!(source_page_id, title, "skipping reference to missing page");
            continue;
        };
        if seen.contains(&target.id) {
            continue;
        }
        conn.execute(
            "INSERT INTO page_refs (source_page_id, position, target_page_id) \
             VALUES (?1, ?2, ?3)",
            params![source_page_id, position, target.id],
        )?;
        seen.push(target.id);
        position += 1;
    }
    Ok(())
}

/// Pages whose live content references `page_id`, via the target index.
pub fn backlinks(conn: &Connection, page_id: &str) -> Result<Vec<Page>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT p.id FROM page_refs r \
         JOIN pages p ON p.id = r.source_page_id \
         WHERE r.target_page_id = ?1 ORDER BY p.title ASC",
    )?;
    let ids = stmt
        .query_map(params![page_id], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut pages = Vec::with_capacity(ids.len());
    for id in ids {
        pages.push(PageStore::require(conn, &id)?);
    }
    Ok(pages)
}

/// Pages referenced by `page_id`'s live content, in reference order.
pub fn outgoing(conn: &Connection, page_id: &str) -> Result<Vec<Page>> {
    let mut stmt = conn.prepare(
        "SELECT target_page_id FROM page_refs \
         WHERE source_page_id = ?1 ORDER BY position ASC",
    )?;
    let ids = stmt
        .query_map(params![page_id], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut pages = Vec::with_capacity(ids.len());
    for id in ids {
        pages.push(PageStore::require(conn, &id)?);
    }
    Ok(pages)
}

/// Rename a page and cascade the title change through every referencing
/// page's live content and archived patches.
///
/// Precondition failures reject cleanly before anything is written. The
/// cascade itself runs under `BEGIN IMMEDIATE`; a failure mid-cascade
/// rolls back whole and surfaces as `PartialCascadeFailure`.
pub fn rename(store: &TenantStore, page_id: &str, new_title: &str) -> Result<()> {
    let conn = store.connection();
    let page = PageStore::require(conn, page_id)?;

    if page.title == "Home" {
        return Err(EngineError::ProtectedTitle(page.title));
    }
    if page.title == new_title {
        return Err(EngineError::NoOpRename);
    }
    if PageStore::get_by_title(conn, new_title)?.is_some() {
        return Err(EngineError::TitleConflict(new_title.to_string()));
    }

    let substitutions = [
        (page_link_source(&page.title), page_link_source(new_title)),
        (
            page_link_html(store.slug(), &page.id, &page.title),
            page_link_html(store.slug(), &page.id, new_title),
        ),
    ];

    // Current referrers plus any page whose archived patches still carry
    // the old link text. The renamed page itself qualifies through either
    // route when it self-links.
    let mut affected: Vec<String> =
        backlinks(conn, page_id)?.into_iter().map(|page| page.id).collect();
    for (old_form, _) in &substitutions {
        for id in VersionStore::pages_with_patch_text(conn, old_form)? {
            if !affected.contains(&id) {
                affected.push(id);
            }
        }
    }

    conn.execute_batch("BEGIN IMMEDIATE")?;
    let cascade = run_cascade(conn, page_id, new_title, &affected, &substitutions);
    match cascade {
        Ok(()) => {
            conn.execute_batch("COMMIT")?;
            info!(page_id, old_title = %page.title, new_title, referrers = affected.len(), "renamed page");
            Ok(())
        }
        Err(error) => {
            let _ = conn.execute_batch("ROLLBACK");
            Err(EngineError::PartialCascadeFailure(error.to_string()))
        }
    }
}

fn run_cascade(
    conn: &Connection,
    page_id: &str,
    new_title: &str,
    affected: &[String],
    substitutions: &[(String, String); 2],
) -> Result<()> {
    for affected_id in affected {
        rewrite_page_for_rename(conn, affected_id, substitutions)?;
    }
    PageStore::set_title(conn, page_id, new_title)?;
    search::refresh_page(conn, page_id)?;
    Ok(())
}

/// Substitute the old link forms throughout one page: live `md`/`html` in
/// place, and the archived patch chain rewritten so every reconstructable
/// snapshot carries the new forms. Version order and count are preserved;
/// no new version record is created.
fn rewrite_page_for_rename(
    conn: &Connection,
    page_id: &str,
    substitutions: &[(String, String); 2],
) -> Result<()> {
    let page = PageStore::require(conn, page_id)?;
    let records = VersionStore::list_for_page(conn, &page.id)?;
    let by_version: HashMap<i64, &VersionRecord> =
        records.iter().map(|record| (record.version, record)).collect();

    // Replay the chain downward to get every historical snapshot with the
    // original patches, before any of them change.
    let current = page.current_version as usize;
    let mut snapshots: Vec<String> = vec![String::new(); current + 1];
    snapshots[current] = page.md.clone();
    for version in (1..current).rev() {
        let record = by_version
            .get(&(version as i64))
            .ok_or_else(|| missing_record(&page.id, version as i64))?;
        let backward = Patch::from_json(&record.patch)?;
        snapshots[version] =
            patch::apply(&snapshots[version + 1], &[backward], true)?;
    }

    let substituted: Vec<String> = snapshots
        .iter()
        .map(|snapshot| substitute(snapshot, substitutions))
        .collect();

    // Re-diff adjacent substituted snapshots; only chains the rename
    // actually touched produce different patches.
    for version in 1..current {
        let record = by_version
            .get(&(version as i64))
            .ok_or_else(|| missing_record(&page.id, version as i64))?;
        let rewritten = patch::diff(&substituted[version], &substituted[version + 1]);
        let rewritten_json = rewritten.to_json()?;
        if rewritten_json != record.patch {
            VersionStore::rewrite_patch(
                conn,
                &record.id,
                &rewritten_json,
                &rewritten.payload_text(),
            )?;
        }
    }

    let new_md = &substituted[current];
    let new_html = substitute(&page.html, substitutions);
    if *new_md != page.md || new_html != page.html {
        PageStore::overwrite_content(conn, &page.id, new_md, &new_html)?;
        search::refresh_page(conn, &page.id)?;
    }
    Ok(())
}

fn substitute(text: &str, substitutions: &[(String, String); 2]) -> String {
    let mut out = text.to_string();
    for (old_form, new_form) in substitutions {
        out = out.replace(old_form.as_str(), new_form.as_str());
    }
    out
}

fn missing_record(page_id: &str, version: i64) -> EngineError {
    EngineError::CorruptPatch(PatchError::Corrupt(format!(
        "page {page_id} has no version record {version}"
    )))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::{backlinks, outgoing, rename, replace_refs};
    use crate::error::EngineError;
    use crate::history::{self, record_edit};
    use crate::render::MarkdownRenderer;
    use crate::store::pages::PageStore;
    use crate::store::TenantStore;

    fn open_store(dir: &TempDir) -> TenantStore {
        TenantStore::open(
            &dir.path().join("wiki.db"),
            "tenant-1",
            "TeamDocs",
            &dir.path().join("blobs"),
        )
        .expect("tenant store should open")
    }

    #[test]
    fn replace_refs_keeps_order_and_collapses_duplicates() {
        let dir = TempDir::new().expect("temp dir should create");
        let store = open_store(&dir);
        let conn = store.connection();

        let a = PageStore::create_stub(conn, "Alpha", "alice").expect("stub should create");
        let b = PageStore::create_stub(conn, "Beta", "alice").expect("stub should create");
        let c = PageStore::create_stub(conn, "Gamma", "alice").expect("stub should create");

        let titles = ["Gamma", "Beta", "Gamma"].map(String::from);
        replace_refs(conn, &a.id, &titles).expect("replace should succeed");

        let targets: Vec<String> =
            outgoing(conn, &a.id).expect("outgoing should succeed").into_iter().map(|p| p.id).collect();
        assert_eq!(targets, vec![c.id.clone(), b.id.clone()]);

        // A second replacement drops stale edges wholesale.
        replace_refs(conn, &a.id, &["Beta".to_string()]).expect("replace should succeed");
        let sources = backlinks(conn, &c.id).expect("backlinks should succeed");
        assert!(sources.is_empty());
    }

    #[test]
    fn rename_preconditions_are_distinct() {
        let dir = TempDir::new().expect("temp dir should create");
        let store = open_store(&dir);
        let conn = store.connection();

        let home = PageStore::create_stub(conn, "Home", "alice").expect("stub should create");
        let alpha = PageStore::create_stub(conn, "Alpha", "alice").expect("stub should create");
        PageStore::create_stub(conn, "Beta", "alice").expect("stub should create");

        assert!(matches!(
            rename(&store, &home.id, "Start"),
            Err(EngineError::ProtectedTitle(_))
        ));
        assert!(matches!(rename(&store, &alpha.id, "Alpha"), Err(EngineError::NoOpRename)));
        assert!(matches!(
            rename(&store, &alpha.id, "Beta"),
            Err(EngineError::TitleConflict(_))
        ));
    }

    #[test]
    fn rename_rewrites_live_content_and_archived_history() {
        let dir = TempDir::new().expect("temp dir should create");
        let store = open_store(&dir);
        let conn = store.connection();

        let referrer =
            PageStore::create_stub(conn, "Index", "alice").expect("stub should create");
        record_edit(&store, &MarkdownRenderer, &referrer.id, 1, "see [[Old Name]]", "alice")
            .expect("edit should succeed");
        record_edit(
            &store,
            &MarkdownRenderer,
            &referrer.id,
            2,
            "see [[Old Name]] and more text",
            "alice",
        )
        .expect("edit should succeed");

        let target = PageStore::get_by_title(conn, "Old Name")
            .expect("lookup should succeed")
            .expect("stub should have been created by the renderer");

        rename(&store, &target.id, "New Name").expect("rename should succeed");

        let target = PageStore::require(conn, &target.id).expect("page should exist");
        assert_eq!(target.title, "New Name");

        let referrer = PageStore::require(conn, &referrer.id).expect("page should exist");
        assert_eq!(referrer.md, "see [[New Name]] and more text");
        assert!(referrer.html.contains(">New Name</a>"));
        assert!(!referrer.html.contains("Old Name"));
        // Live metadata untouched: no new version, same author and count.
        assert_eq!(referrer.current_version, 3);

        // Historical snapshots reconstruct with the new title too.
        let v2 = history::reconstruct(&store, &referrer, 2)
            .expect("reconstruction should succeed");
        assert_eq!(v2, "see [[New Name]]");
        let v1 = history::reconstruct(&store, &referrer, 1)
            .expect("reconstruction should succeed");
        assert_eq!(v1, "");
    }

    #[test]
    fn rename_reaches_pages_whose_only_mention_is_archived() {
        let dir = TempDir::new().expect("temp dir should create");
        let store = open_store(&dir);
        let conn = store.connection();

        let page = PageStore::create_stub(conn, "Notes", "alice").expect("stub should create");
        record_edit(&store, &MarkdownRenderer, &page.id, 1, "see [[Old Name]]", "alice")
            .expect("edit should succeed");
        // The live content no longer mentions the page at all.
        record_edit(&store, &MarkdownRenderer, &page.id, 2, "nothing here", "alice")
            .expect("edit should succeed");

        let target = PageStore::get_by_title(conn, "Old Name")
            .expect("lookup should succeed")
            .expect("stub should exist");
        rename(&store, &target.id, "New Name").expect("rename should succeed");

        let page = PageStore::require(conn, &page.id).expect("page should exist");
        let v2 = history::reconstruct(&store, &page, 2).expect("reconstruction should succeed");
        assert_eq!(v2, "see [[New Name]]");
    }
}
