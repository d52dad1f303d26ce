use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use punch_cli::commands::{consolidate, delete, indicators, list, stats, upload};
use punch_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Some(Commands::Upload(args)) => upload::run(&mut out, args, &config)?,
        Some(Commands::Consolidate(args)) => consolidate::run(&mut out, args, &config)?,
        Some(Commands::List(args)) => list::run(&mut out, args, &config)?,
        Some(Commands::Indicators(args)) => indicators::run(&mut out, args, &config)?,
        Some(Commands::Stats(args)) => stats::run(&mut out, args, &config)?,
        Some(Commands::Delete(args)) => delete::run(&mut out, args, &config)?,
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            writeln!(out)?;
        }
    }

    Ok(())
}
