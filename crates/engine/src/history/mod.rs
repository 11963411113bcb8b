// Version log: every content edit appends a patch record, and any past
// snapshot is reconstructed by replaying stored patches in reverse.
//
// A record with version N holds the patch that turned snapshot N into
// snapshot N+1, stamped with snapshot N's author and timestamp. The live
// row always holds the newest content, so reads never replay.

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::graph;
use crate::render::Renderer;
use crate::search;
use crate::store::pages::PageStore;
use crate::store::versions::VersionStore;
use crate::store::TenantStore;
use folium_common::patch::{self, line_diff, LineChange, Patch, PatchError};
use folium_common::types::{Page, VersionRecord};

/// What `record_edit` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The submitted content matched the live content. Nothing written.
    Unchanged,
    /// A version record was appended and the live row now holds the
    /// submitted content at `version`.
    Recorded { version: i64 },
}

/// A line-level display diff between two versions of one page.
#[derive(Debug, Clone)]
pub struct VersionDiff {
    pub from_version: i64,
    pub to_version: i64,
    pub changes: Vec<LineChange>,
}

/// Record an edit against the version the caller last saw.
///
/// The version record, live-row update, reference set, and text indexes
/// all move in one transaction. A `base_version` that no longer matches
/// the live row fails with `StaleEdit` and writes nothing.
pub fn record_edit(
    store: &TenantStore,
    renderer: &dyn Renderer,
    page_id: &str,
    base_version: i64,
    new_md: &str,
    author: &str,
) -> Result<EditOutcome> {
    let conn = store.connection();
    let page = PageStore::require(conn, page_id)?;
    if page.current_version != base_version {
        return Err(EngineError::StaleEdit {
            expected: base_version,
            actual: page.current_version,
        });
    }

    let edit_patch = patch::diff(&page.md, new_md);
    if edit_patch.is_empty() {
        return Ok(EditOutcome::Unchanged);
    }

    // Rendering may create stub pages for new references; those are
    // ordinary rows and survive even if the edit below loses its race.
    let rendered = renderer.render(store, new_md, author)?;

    let record = VersionRecord {
        id: Uuid::new_v4().to_string(),
        page_id: page.id.clone(),
        version: page.current_version,
        patch: edit_patch.to_json()?,
        modified_on: page.modified_on,
        modified_by: page.modified_by.clone(),
    };

    let tx = conn.unchecked_transaction()?;
    VersionStore::append(&tx, &record, &edit_patch.payload_text())?;
    let swapped = PageStore::apply_edit(
        &tx,
        page_id,
        base_version,
        new_md,
        &rendered.html,
        &rendered.toc,
        author,
        Utc::now(),
    )?;
    if !swapped {
        drop(tx);
        let actual = PageStore::require(conn, page_id)?.current_version;
        return Err(EngineError::StaleEdit { expected: base_version, actual });
    }
    graph::replace_refs(&tx, page_id, &rendered.refs)?;
    search::refresh_page(&tx, page_id)?;
    tx.commit()?;

    debug!(page_id, version = base_version + 1, author, "recorded edit");
    Ok(EditOutcome::Recorded { version: base_version + 1 })
}

/// Reconstruct the content of `page` at `target_version` by replaying the
/// stored patches newest first, in reverse.
pub fn reconstruct(store: &TenantStore, page: &Page, target_version: i64) -> Result<String> {
    if target_version < 1 || target_version > page.current_version {
        return Err(EngineError::VersionOutOfRange {
            requested: target_version,
            current: page.current_version,
        });
    }
    if target_version == page.current_version {
        return Ok(page.md.clone());
    }

    let records = VersionStore::list_for_page(store.connection(), &page.id)?;
    let mut patches = Vec::new();
    for version in (target_version..page.current_version).rev() {
        let record = records
            .iter()
            .find(|record| record.version == version)
            .ok_or_else(|| missing_record(&page.id, version))?;
        patches.push(Patch::from_json(&record.patch)?);
    }

    Ok(patch::apply(&page.md, &patches, true)?)
}

/// Restore a past version as a new forward edit. History is never
/// truncated; the restored content lands as the next version.
pub fn recover_to(
    store: &TenantStore,
    renderer: &dyn Renderer,
    page_id: &str,
    target_version: i64,
    author: &str,
) -> Result<EditOutcome> {
    let page = PageStore::require(store.connection(), page_id)?;
    let restored = reconstruct(store, &page, target_version)?;
    record_edit(store, renderer, page_id, page.current_version, &restored, author)
}

pub fn list_versions(store: &TenantStore, page_id: &str) -> Result<Vec<VersionRecord>> {
    VersionStore::list_for_page(store.connection(), page_id)
}

/// Line-level display diff between two reconstructed versions, computed
/// from the snapshots themselves rather than the stored patch ops.
pub fn diff_view(
    store: &TenantStore,
    page_id: &str,
    from_version: i64,
    to_version: i64,
) -> Result<VersionDiff> {
    let page = PageStore::require(store.connection(), page_id)?;
    let older = reconstruct(store, &page, from_version)?;
    let newer = reconstruct(store, &page, to_version)?;
    Ok(VersionDiff { from_version, to_version, changes: line_diff(&older, &newer) })
}

fn missing_record(page_id: &str, version: i64) -> EngineError {
    EngineError::CorruptPatch(PatchError::Corrupt(format!(
        "page {page_id} has no version record {version}"
    )))
}
