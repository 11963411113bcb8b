// `folium search` — full-text search within one tenant.

use clap::Args;
use serde_json::json;

use folium_engine::search::search_pages;
use folium_engine::store::Registry;

use crate::commands::resolve_tenant;

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Tenant id or slug.
    #[arg(long)]
    tenant: String,

    /// Search query.
    pub query: String,

    /// Limit results.
    #[arg(long, default_value = "20")]
    limit: usize,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

pub fn run(registry: &Registry, args: SearchArgs) -> anyhow::Result<()> {
    let store = resolve_tenant(registry, &args.tenant)?;
    let hits = search_pages(store.connection(), &args.query)?;
    let hits = &hits[..hits.len().min(args.limit)];

    if args.json {
        let value: Vec<_> = hits
            .iter()
            .map(|hit| json!({ "title": hit.page.title, "id": hit.page.id, "rank": hit.rank }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        for hit in hits {
            println!("{}", hit.page.title);
        }
    }
    Ok(())
}
