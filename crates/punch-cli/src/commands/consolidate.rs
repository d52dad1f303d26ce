//! Consolidate command: reconcile both turnstiles as one view.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;

use punch_core::{DeviceId, reconcile_devices};
use punch_db::RunMode;

use super::util::{RunOptions, finish_run};
use crate::Config;
use crate::input::read_export;

#[derive(Debug, Clone, Args)]
pub struct ConsolidateArgs {
    /// Export from turnstile 1.
    #[arg(long, value_name = "FILE")]
    pub file1: Option<PathBuf>,

    /// Export from turnstile 2.
    #[arg(long, value_name = "FILE")]
    pub file2: Option<PathBuf>,

    #[command(flatten)]
    pub options: RunOptions,
}

pub fn run<W: Write>(writer: &mut W, args: &ConsolidateArgs, config: &Config) -> Result<()> {
    if args.file1.is_none() && args.file2.is_none() {
        bail!("provide at least one export with --file1 or --file2");
    }

    let mut batches = Vec::new();
    for (id, file) in [(1, &args.file1), (2, &args.file2)] {
        if let Some(path) = file {
            batches.push(read_export(path, DeviceId::new(id)?)?);
        }
    }

    let run = reconcile_devices(&batches, config.consolidated_policy);
    tracing::info!(
        devices = batches.len(),
        records = run.records.len(),
        skipped = run.skipped_rows,
        "reconciled consolidated exports"
    );
    finish_run(writer, &run, RunMode::Consolidated, &args.options, config)
}
