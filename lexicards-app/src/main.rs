mod api;
mod cli;
mod config;

use anyhow::Result;
use clap::Parser; // needed for Cli::parse()
use std::io;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use cli::commands::run_cli;
use cli::opts::Cli;

fn main() -> Result<()> {
    // Parse first so --help/--version stay clean.
    let args = Cli::parse();

    // stdout carries command output; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let rt = Runtime::new()?;
    rt.block_on(run_cli(args))
}
