// folium CLI entry point.

use std::path::PathBuf;

use clap::Parser;

mod commands;

#[derive(Parser)]
#[command(name = "folium", about = "Multi-tenant wiki engine")]
struct Cli {
    /// Data directory (default from ~/.folium/config.toml).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: commands::Command,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    commands::run(cli.data_dir, cli.command)
}
