// Storage layer: the tenant registry/router plus per-tenant record stores.

pub mod files;
pub mod pages;
pub mod registry;
pub mod tenant_db;
pub mod users;
pub mod versions;

pub use registry::{NewAdmin, Registry};
pub use tenant_db::TenantStore;
