//! Shared utilities for CLI commands.

use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;

use punch_core::{
    DeviceId, ObservationLanguage, Period, RawCell, ReconciledRecord, Reconciliation, RunSummary,
    normalize_date,
};
use punch_db::{Database, RunMode};

use crate::Config;

/// Parses a date argument in any encoding the exports use.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    normalize_date(&RawCell::Text(s.to_string()))
        .ok_or_else(|| format!("invalid date: {s}. Use YYYY-MM-DD or DD/MM/YYYY"))
}

pub fn parse_device(s: &str) -> Result<DeviceId, String> {
    let value: i64 = s
        .trim()
        .parse()
        .map_err(|_| format!("invalid device: {s}"))?;
    DeviceId::new(value).map_err(|e| e.to_string())
}

pub fn parse_period(s: &str) -> Result<Period, String> {
    s.trim().parse().map_err(|e: punch_core::ValidationError| {
        format!("{e}. Use one of cafe, almoco, janta, outro")
    })
}

/// Opens the configured database, creating its parent directory if needed.
pub fn open_database(config: &Config) -> Result<Database> {
    if let Some(parent) = config.database_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).context("failed to create database directory")?;
        }
    }
    Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))
}

/// Output options shared by the reconciliation commands.
#[derive(Debug, Clone, Default, Args)]
pub struct RunOptions {
    /// Reconcile and print the records without storing them.
    #[arg(long)]
    pub dry_run: bool,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct JsonRun<'a> {
    mode: RunMode,
    batch_id: Option<&'a str>,
    skipped_rows: usize,
    summary: &'a RunSummary,
    records: &'a [ReconciledRecord],
}

fn device_label(device: Option<DeviceId>) -> String {
    device.map_or_else(|| "-".to_string(), |d| d.to_string())
}

/// One human-readable line per record. Duplicates are marked with `*`.
pub fn format_record(record: &ReconciledRecord, language: ObservationLanguage) -> String {
    let time = |t: Option<chrono::NaiveTime>| {
        t.map_or_else(|| "--:--:--".to_string(), |t| t.format("%H:%M:%S").to_string())
    };
    let duration = record
        .duration_minutes()
        .map_or_else(|| "-".to_string(), |m| format!("{m}m"));
    let mut line = format!(
        "{} {:<6} {} {} {:>5} {}>{} {}{}",
        record.date.format("%Y-%m-%d"),
        record.period.as_str(),
        time(record.entry_time),
        time(record.exit_time),
        duration,
        device_label(record.entry_device),
        device_label(record.exit_device),
        if record.is_duplicate { "*" } else { "" },
        record.person,
    );
    if let Some(observation) = record.observation {
        line.push_str(" (");
        line.push_str(observation.text(language));
        line.push(')');
    }
    line
}

/// Stores (unless dry-running) and reports a finished reconciliation.
pub fn finish_run<W: Write>(
    writer: &mut W,
    run: &Reconciliation,
    mode: RunMode,
    options: &RunOptions,
    config: &Config,
) -> Result<()> {
    if run.records.is_empty() {
        bail!("no records found in input");
    }
    let summary = RunSummary::from_records(&run.records);

    let stored = if options.dry_run {
        None
    } else {
        let mut db = open_database(config)?;
        Some(
            db.insert_batch(&run.records, mode, config.observation_language)
                .context("failed to store records")?,
        )
    };

    if options.json {
        let output = JsonRun {
            mode,
            batch_id: stored.as_ref().map(|b| b.batch_id.as_str()),
            skipped_rows: run.skipped_rows,
            summary: &summary,
            records: &run.records,
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&output)?)?;
        return Ok(());
    }

    writeln!(writer, "Reconciled {} records ({})", summary.total, mode.as_str())?;
    writeln!(writer, "  paired: {}", summary.paired)?;
    writeln!(writer, "  duplicates: {}", summary.duplicates)?;
    writeln!(writer, "  skipped rows: {}", run.skipped_rows)?;
    for (period, count) in &summary.by_period {
        writeln!(writer, "  {period}: {count}")?;
    }

    match stored {
        Some(batch) => writeln!(
            writer,
            "Stored {} records in batch {}",
            batch.inserted, batch.batch_id
        )?,
        None => {
            for record in &run.records {
                writeln!(writer, "{}", format_record(record, config.observation_language))?;
            }
            writeln!(writer, "Dry run: nothing stored")?;
        }
    }
    Ok(())
}
