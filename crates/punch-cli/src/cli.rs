//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::consolidate::ConsolidateArgs;
use crate::commands::delete::DeleteArgs;
use crate::commands::indicators::IndicatorsArgs;
use crate::commands::list::ListArgs;
use crate::commands::stats::StatsArgs;
use crate::commands::upload::UploadArgs;

/// Turnstile punch reconciliation.
///
/// Pairs entry and exit swipes exported by the turnstiles into attendance
/// records per person, date and meal period, and queries the stored results.
#[derive(Debug, Parser)]
#[command(name = "punch", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Reconcile the export of a single turnstile.
    Upload(UploadArgs),

    /// Reconcile the exports of both turnstiles together.
    Consolidate(ConsolidateArgs),

    /// List stored records.
    List(ListArgs),

    /// Show totals, duplicates and mean duration per meal period.
    Indicators(IndicatorsArgs),

    /// Show store-wide statistics.
    Stats(StatsArgs),

    /// Delete stored records for a date and/or device.
    Delete(DeleteArgs),
}
