mod check;
mod cli;
mod config;
mod header;
mod normalize;
mod utils;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands};
use config::Config;

fn main() -> Result<()> {
    let verbose = Config::load().map(|c| c.general.verbose).unwrap_or(false);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "pocat=debug" } else { "warn" }));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check(args) => check::run(args)?,
        Commands::Normalize(args) => normalize::run(args)?,
        Commands::Header(args) => header::run(args)?,
        Commands::Config(args) => config::commands::run(args)?,
    }

    Ok(())
}
