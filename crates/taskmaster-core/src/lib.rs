pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod filter;
pub mod prefs;
pub mod recurrence;
pub mod render;
pub mod stats;
pub mod store;
pub mod task;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::info;

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let cli = cli::GlobalCli::parse_from(raw_args);

    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(verbose = cli.verbose, quiet = cli.quiet, "starting taskmaster CLI");

    let data_dir = config::resolve_data_dir(cli.data.as_deref())
        .context("failed to resolve data directory")?;

    let mut store = store::TaskStore::open(&data_dir)
        .with_context(|| format!("failed to open task store at {}", data_dir.display()))?;
    let mut prefs = prefs::Preferences::open(&data_dir);
    let mut renderer = render::Renderer::new(config::color_enabled());

    commands::dispatch(&mut store, &mut prefs, &mut renderer, cli.command)?;

    info!("done");
    Ok(())
}
