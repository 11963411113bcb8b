// folium-engine: versioned-document and link-graph core of the Folium wiki.
//
// Every operation runs against an explicitly passed `TenantStore` handle
// resolved by the registry; nothing rebinds process-wide state.

pub mod blob;
pub mod config;
pub mod error;
pub mod graph;
pub mod history;
pub mod notify;
pub mod render;
pub mod search;
pub mod service;
pub mod store;

pub use error::{EngineError, Result};
