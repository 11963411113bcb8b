// `folium recent` — recently modified pages within one tenant.

use clap::Args;

use folium_engine::store::pages::PageStore;
use folium_engine::store::Registry;

use crate::commands::resolve_tenant;

#[derive(Debug, Args)]
pub struct RecentArgs {
    /// Tenant id or slug.
    #[arg(long)]
    tenant: String,

    /// Limit results.
    #[arg(long, default_value = "20")]
    limit: usize,
}

pub fn run(registry: &Registry, args: RecentArgs) -> anyhow::Result<()> {
    let store = resolve_tenant(registry, &args.tenant)?;
    for page in PageStore::list_recent(store.connection(), args.limit)? {
        println!("{}  v{}  {}  {}", page.modified_on, page.current_version, page.modified_by, page.title);
    }
    Ok(())
}
