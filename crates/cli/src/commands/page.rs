// `folium page` — read, edit, and manage pages within one tenant.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Subcommand};
use serde_json::json;

use folium_engine::graph;
use folium_engine::history::{self, EditOutcome};
use folium_engine::render::MarkdownRenderer;
use folium_engine::store::pages::PageStore;
use folium_engine::store::{Registry, TenantStore};
use folium_common::patch::LineChangeKind;
use folium_common::types::Page;

use crate::commands::resolve_tenant;

#[derive(Subcommand)]
pub enum PageCommand {
    /// Print a page's markdown (optionally at a past version)
    Show(ShowArgs),
    /// Replace a page's content
    Edit(EditArgs),
    /// List a page's version records
    History(PageArgs),
    /// Line diff between two versions
    Diff(DiffArgs),
    /// Rename a page and cascade through references
    Rename(RenameArgs),
    /// Pages whose live content links here
    Backlinks(PageArgs),
    /// Restore a past version as a new edit
    Recover(RecoverArgs),
    /// List the curated key pages in rank order
    KeyPages(TenantOnlyArgs),
    /// Set or clear a page's key rank
    SetRank(SetRankArgs),
}

#[derive(Debug, Args)]
pub struct TenantOnlyArgs {
    /// Tenant id or slug.
    #[arg(long)]
    tenant: String,
}

#[derive(Debug, Args)]
pub struct SetRankArgs {
    #[command(flatten)]
    page: PageArgs,

    /// Ordinal rank; omit to remove the page from the key set.
    #[arg(long)]
    rank: Option<i64>,
}

#[derive(Debug, Args)]
pub struct PageArgs {
    /// Tenant id or slug.
    #[arg(long)]
    tenant: String,

    /// Page title.
    pub title: String,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    #[command(flatten)]
    page: PageArgs,

    /// Version to reconstruct (default: current).
    #[arg(long)]
    version: Option<i64>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    #[command(flatten)]
    page: PageArgs,

    /// New content inline.
    #[arg(long, group = "content_source")]
    content: Option<String>,

    /// Read new content from a file.
    #[arg(long, group = "content_source")]
    file: Option<PathBuf>,

    /// Version the edit is based on (default: current).
    #[arg(long)]
    base_version: Option<i64>,

    /// Author recorded on the edit.
    #[arg(long)]
    author: String,

    /// Create the page first if the title is unknown.
    #[arg(long)]
    create: bool,
}

#[derive(Debug, Args)]
pub struct DiffArgs {
    #[command(flatten)]
    page: PageArgs,

    #[arg(long)]
    from: i64,

    #[arg(long)]
    to: i64,
}

#[derive(Debug, Args)]
pub struct RenameArgs {
    /// Tenant id or slug.
    #[arg(long)]
    tenant: String,

    /// Current page title.
    pub title: String,

    /// New page title.
    pub new_title: String,
}

#[derive(Debug, Args)]
pub struct RecoverArgs {
    #[command(flatten)]
    page: PageArgs,

    /// Version to restore.
    #[arg(long)]
    to: i64,

    /// Author recorded on the restoring edit.
    #[arg(long)]
    author: String,
}

pub fn run(registry: &Registry, cmd: PageCommand) -> anyhow::Result<()> {
    match cmd {
        PageCommand::Show(args) => show(registry, args),
        PageCommand::Edit(args) => edit(registry, args),
        PageCommand::History(args) => print_history(registry, args),
        PageCommand::Diff(args) => diff(registry, args),
        PageCommand::Rename(args) => rename(registry, args),
        PageCommand::Backlinks(args) => backlinks(registry, args),
        PageCommand::Recover(args) => recover(registry, args),
        PageCommand::KeyPages(args) => key_pages(registry, args),
        PageCommand::SetRank(args) => set_rank(registry, args),
    }
}

fn key_pages(registry: &Registry, args: TenantOnlyArgs) -> anyhow::Result<()> {
    let store = resolve_tenant(registry, &args.tenant)?;
    for page in PageStore::list_key_pages(store.connection())? {
        println!("{}", page.title);
    }
    Ok(())
}

fn set_rank(registry: &Registry, args: SetRankArgs) -> anyhow::Result<()> {
    let store = resolve_tenant(registry, &args.page.tenant)?;
    let page = require_page(&store, &args.page.title)?;
    PageStore::set_key_rank(store.connection(), &page.id, args.rank)?;
    match args.rank {
        Some(rank) => println!("ranked {:?} at {rank}", args.page.title),
        None => println!("removed {:?} from key pages", args.page.title),
    }
    Ok(())
}

fn show(registry: &Registry, args: ShowArgs) -> anyhow::Result<()> {
    let store = resolve_tenant(registry, &args.page.tenant)?;
    let page = require_page(&store, &args.page.title)?;
    let version = args.version.unwrap_or(page.current_version);
    let md = history::reconstruct(&store, &page, version)?;

    if args.json {
        let value = json!({
            "id": page.id,
            "title": page.title,
            "version": version,
            "current_version": page.current_version,
            "md": md,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{md}");
    }
    Ok(())
}

fn edit(registry: &Registry, args: EditArgs) -> anyhow::Result<()> {
    let store = resolve_tenant(registry, &args.page.tenant)?;

    let content = match (args.content, args.file) {
        (Some(content), None) => content,
        (None, Some(path)) => fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?,
        _ => anyhow::bail!("pass exactly one of --content or --file"),
    };

    let page = match PageStore::get_by_title(store.connection(), &args.page.title)? {
        Some(page) => page,
        None if args.create => {
            PageStore::create_stub(store.connection(), &args.page.title, &args.author)?
        }
        None => anyhow::bail!("no page titled {:?} (pass --create to add it)", args.page.title),
    };

    let base = args.base_version.unwrap_or(page.current_version);
    let outcome =
        history::record_edit(&store, &MarkdownRenderer, &page.id, base, &content, &args.author)?;
    match outcome {
        EditOutcome::Unchanged => println!("unchanged"),
        EditOutcome::Recorded { version } => println!("recorded version {version}"),
    }
    Ok(())
}

fn print_history(registry: &Registry, args: PageArgs) -> anyhow::Result<()> {
    let store = resolve_tenant(registry, &args.tenant)?;
    let page = require_page(&store, &args.title)?;

    for record in history::list_versions(&store, &page.id)? {
        println!("v{}  {}  {}", record.version, record.modified_on, record.modified_by);
    }
    println!("v{}  {}  {}  (current)", page.current_version, page.modified_on, page.modified_by);
    Ok(())
}

fn diff(registry: &Registry, args: DiffArgs) -> anyhow::Result<()> {
    let store = resolve_tenant(registry, &args.page.tenant)?;
    let page = require_page(&store, &args.page.title)?;
    let view = history::diff_view(&store, &page.id, args.from, args.to)?;

    for change in view.changes {
        let sigil = match change.kind {
            LineChangeKind::Unchanged => ' ',
            LineChangeKind::Inserted => '+',
            LineChangeKind::Deleted => '-',
        };
        println!("{sigil} {}", change.text);
    }
    Ok(())
}

fn rename(registry: &Registry, args: RenameArgs) -> anyhow::Result<()> {
    let store = resolve_tenant(registry, &args.tenant)?;
    let page = require_page(&store, &args.title)?;
    graph::rename(&store, &page.id, &args.new_title)?;
    println!("renamed {:?} to {:?}", args.title, args.new_title);
    Ok(())
}

fn backlinks(registry: &Registry, args: PageArgs) -> anyhow::Result<()> {
    let store = resolve_tenant(registry, &args.tenant)?;
    let page = require_page(&store, &args.title)?;

    for source in graph::backlinks(store.connection(), &page.id)? {
        println!("{}", source.title);
    }
    Ok(())
}

fn recover(registry: &Registry, args: RecoverArgs) -> anyhow::Result<()> {
    let store = resolve_tenant(registry, &args.page.tenant)?;
    let page = require_page(&store, &args.page.title)?;
    let outcome = history::recover_to(&store, &MarkdownRenderer, &page.id, args.to, &args.author)?;
    match outcome {
        EditOutcome::Unchanged => println!("already at that content"),
        EditOutcome::Recorded { version } => {
            println!("restored version {} as version {version}", args.to)
        }
    }
    Ok(())
}

fn require_page(store: &TenantStore, title: &str) -> anyhow::Result<Page> {
    PageStore::get_by_title(store.connection(), title)?
        .with_context(|| format!("no page titled {title:?}"))
}
