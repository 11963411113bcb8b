// Engine error taxonomy.
//
// Storage errors propagate to the caller, which owns retry policy; the one
// local recovery the engine performs itself is tenant-creation rollback.

use folium_common::patch::PatchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The page advanced past the version the editor started from.
    /// Recoverable: the caller re-presents the edit against a refreshed base.
    #[error("page was modified since version {expected} (now at version {actual})")]
    StaleEdit { expected: i64, actual: i64 },

    /// A stored patch no longer fits its page history. Fatal for that
    /// reconstruction; surfaced, never silently repaired.
    #[error("history integrity violation: {0}")]
    CorruptPatch(#[from] PatchError),

    #[error("a page titled `{0}` already exists")]
    TitleConflict(String),

    #[error("the new title is the same as the current title")]
    NoOpRename,

    /// The seeded Home page keeps its title for the life of the tenant.
    #[error("page `{0}` cannot be renamed")]
    ProtectedTitle(String),

    #[error("wiki group `{0}` already exists")]
    TenantExists(String),

    #[error("unknown wiki group `{0}`")]
    UnknownTenant(String),

    #[error("wiki group `{0}` is deactivated")]
    InactiveTenant(String),

    #[error("wiki group name `{0}` contains no usable characters")]
    InvalidTenantName(String),

    /// A rename cascade failed mid-flight. The transaction was rolled
    /// back; surfaced distinctly so callers can audit the attempt.
    #[error("rename cascade interrupted and rolled back: {0}")]
    PartialCascadeFailure(String),

    #[error("page not found: {0}")]
    PageNotFound(String),

    #[error("file not found: {0}")]
    FileNotFound(i64),

    #[error("version {requested} is out of range for a page at version {current}")]
    VersionOutOfRange { requested: i64, current: i64 },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
