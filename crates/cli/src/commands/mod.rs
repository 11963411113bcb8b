// CLI subcommand dispatch.

use std::path::PathBuf;

use anyhow::Context;
use clap::Subcommand;

use folium_engine::config::EngineConfig;
use folium_engine::store::{Registry, TenantStore};

pub mod page;
pub mod recent;
pub mod search;
pub mod tenant;

#[derive(Subcommand)]
pub enum Command {
    /// Manage wiki tenants
    #[command(subcommand)]
    Tenant(tenant::TenantCommand),
    /// Read and edit pages
    #[command(subcommand)]
    Page(page::PageCommand),
    /// Full-text page search
    Search(search::SearchArgs),
    /// Recently modified pages
    Recent(recent::RecentArgs),
}

pub fn run(data_dir: Option<PathBuf>, cmd: Command) -> anyhow::Result<()> {
    let registry = open_registry(data_dir)?;
    match cmd {
        Command::Tenant(cmd) => tenant::run(&registry, cmd),
        Command::Page(cmd) => page::run(&registry, cmd),
        Command::Search(args) => search::run(&registry, args),
        Command::Recent(args) => recent::run(&registry, args),
    }
}

fn open_registry(data_dir: Option<PathBuf>) -> anyhow::Result<Registry> {
    let dir = data_dir.unwrap_or_else(|| EngineConfig::load().data_dir);
    Registry::open(&dir).with_context(|| format!("opening registry in {}", dir.display()))
}

/// Resolve `--tenant` by id first, then by slug.
pub(crate) fn resolve_tenant(registry: &Registry, key: &str) -> anyhow::Result<TenantStore> {
    let id = match registry.get(key)? {
        Some(tenant) => tenant.id,
        None => registry
            .get_by_slug(key)?
            .map(|tenant| tenant.id)
            .unwrap_or_else(|| key.to_string()),
    };
    Ok(registry.resolve(&id)?)
}
