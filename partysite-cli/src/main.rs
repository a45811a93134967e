//! # partysite CLI
//!
//! Command-line interface for the partysite static blog builder.

mod commands;

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "partysite")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Development mode: publish drafts too
    #[arg(short, long, overrides_with = "no_dev")]
    dev: bool,

    /// Disable development mode
    #[arg(long, overrides_with = "dev")]
    no_dev: bool,

    /// Path to configuration file (defaults to ./partysite.yml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let options = commands::BuildOptions {
        config: cli.config,
        dev: cli.dev && !cli.no_dev,
    };
    commands::build_site(&options)
}
