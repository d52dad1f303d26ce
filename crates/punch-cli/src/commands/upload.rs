//! Upload command: reconcile one turnstile's export on its own.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use punch_core::{DeviceId, reconcile_single};
use punch_db::RunMode;

use super::util::{RunOptions, finish_run, parse_device};
use crate::Config;
use crate::input::read_export;

#[derive(Debug, Clone, Args)]
pub struct UploadArgs {
    /// Turnstile the export came from (1 or 2).
    #[arg(short, long, value_parser = parse_device)]
    pub device: DeviceId,

    /// Export file (JSON Lines with `entrada` and `saida` sheets).
    pub file: PathBuf,

    #[command(flatten)]
    pub options: RunOptions,
}

pub fn run<W: Write>(writer: &mut W, args: &UploadArgs, config: &Config) -> Result<()> {
    let batch = read_export(&args.file, args.device)?;
    let run = reconcile_single(&batch, config.single_device_policy)?;
    tracing::info!(
        device = %args.device,
        records = run.records.len(),
        skipped = run.skipped_rows,
        "reconciled single-device export"
    );
    finish_run(writer, &run, RunMode::Single, &args.options, config)
}
