//! Indicators command: per-period totals.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;

use punch_core::DeviceId;
use punch_db::Indicators;

use super::util::{open_database, parse_date, parse_device};
use crate::Config;

#[derive(Debug, Clone, Default, Args)]
pub struct IndicatorsArgs {
    /// Restrict to one date (YYYY-MM-DD or DD/MM/YYYY).
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    /// Restrict to records touching this turnstile.
    #[arg(short, long, value_parser = parse_device)]
    pub device: Option<DeviceId>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

fn write_table<W: Write>(writer: &mut W, indicators: &Indicators) -> Result<()> {
    writeln!(
        writer,
        "{:<8} {:>6} {:>7} {:>10} {:>8}",
        "PERIOD", "TOTAL", "PAIRED", "DUPLICATES", "AVG MIN"
    )?;
    for indicator in &indicators.periods {
        writeln!(
            writer,
            "{:<8} {:>6} {:>7} {:>10} {:>8}",
            indicator.period.as_str(),
            indicator.total,
            indicator.paired,
            indicator.duplicates,
            indicator.average_minutes
        )?;
    }
    writeln!(
        writer,
        "{:<8} {:>6} {:>7} {:>10}",
        "total", indicators.total, indicators.paired, indicators.duplicates
    )?;
    Ok(())
}

pub fn run<W: Write>(writer: &mut W, args: &IndicatorsArgs, config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let indicators = db
        .period_indicators(args.date, args.device)
        .context("failed to compute indicators")?;

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&indicators)?)?;
    } else {
        write_table(writer, &indicators)?;
    }
    Ok(())
}
