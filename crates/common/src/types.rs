// Core domain types shared across all Folium crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tenant ("wiki group") owning an isolated page/file/user universe.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tenant {
    pub id: String,
    /// Display name, unique across the registry.
    pub name: String,
    /// Storage handle name derived from `name` (whitespace stripped).
    pub slug: String,
    pub active: bool,
    pub created_on: DateTime<Utc>,
}

/// A wiki page within one tenant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page {
    pub id: String,
    /// Unique within the tenant, mutable via the rename cascade only.
    pub title: String,
    /// Markdown source.
    pub md: String,
    /// Cached renderer output. Opaque to the engine.
    pub html: String,
    /// Cached table of contents. Opaque to the engine.
    pub toc: String,
    /// Always `version records + 1`.
    pub current_version: i64,
    pub modified_on: DateTime<Utc>,
    pub modified_by: String,
    /// Ordinal rank for the curated "key pages" subset.
    pub key_rank: Option<i64>,
}

/// One history entry: the reversible patch that replaced `version`.
///
/// Immutable once created, with a single documented exception: the rename
/// cascade rewrites patch *content* so archived snapshots reflect a new
/// page title. Version order and count never change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionRecord {
    pub id: String,
    pub page_id: String,
    /// The page version this edit replaced (the version *before* the edit).
    pub version: i64,
    /// JSON-encoded `Patch`, old content to new content.
    pub patch: String,
    /// Timestamp and author of the snapshot that was replaced.
    pub modified_on: DateTime<Utc>,
    pub modified_by: String,
}

/// Metadata for an uploaded file. Payload bytes live in the blob store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileRecord {
    pub id: i64,
    pub name: String,
    pub mime_type: String,
    /// Size in bytes.
    pub size: i64,
    pub uploaded_on: DateTime<Utc>,
    pub uploaded_by: String,
}

/// A comment attached to a page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub id: i64,
    pub page_id: String,
    pub author: String,
    pub posted_on: DateTime<Utc>,
    pub md: String,
    pub html: String,
}

/// A user within one tenant. Authentication lives outside the engine;
/// the password hash is an opaque string the engine only stores.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
}
