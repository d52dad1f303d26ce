//! List command: query stored records.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;

use punch_core::{DeviceId, Period};
use punch_db::{RecordFilter, StoredRecord};

use super::util::{open_database, parse_date, parse_device, parse_period};
use crate::Config;

#[derive(Debug, Clone, Default, Args)]
pub struct ListArgs {
    /// Case-insensitive part of the person's name.
    #[arg(short, long)]
    pub name: Option<String>,

    /// Exact date (YYYY-MM-DD or DD/MM/YYYY). Overrides --from/--to.
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    /// First date of a range.
    #[arg(long, value_parser = parse_date)]
    pub from: Option<NaiveDate>,

    /// Last date of a range.
    #[arg(long, value_parser = parse_date)]
    pub to: Option<NaiveDate>,

    /// Only records touching this turnstile.
    #[arg(short, long, value_parser = parse_device)]
    pub device: Option<DeviceId>,

    /// Meal period (cafe, almoco, janta, outro).
    #[arg(short, long, value_parser = parse_period)]
    pub period: Option<Period>,

    /// `true` for duplicates only, `false` for canonical records only.
    #[arg(long, value_name = "BOOL")]
    pub duplicates: Option<bool>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

impl ListArgs {
    fn filter(&self) -> RecordFilter {
        RecordFilter {
            name: self.name.clone(),
            date: self.date,
            from: self.from,
            to: self.to,
            device: self.device,
            period: self.period,
            duplicates: self.duplicates,
        }
    }
}

fn format_stored(record: &StoredRecord) -> String {
    let device = |d: Option<i64>| d.map_or_else(|| "-".to_string(), |d| d.to_string());
    let duration = record
        .duration_minutes
        .map_or_else(|| "-".to_string(), |m| format!("{m}m"));
    let mut line = format!(
        "{} {:<6} {} {} {:>5} {}>{} {}{}",
        record.date,
        record.period,
        record.entry_time.as_deref().unwrap_or("--:--:--"),
        record.exit_time.as_deref().unwrap_or("--:--:--"),
        duration,
        device(record.entry_device),
        device(record.exit_device),
        if record.is_duplicate { "*" } else { "" },
        record.name,
    );
    if let Some(observation) = &record.observation {
        line.push_str(&format!(" ({observation})"));
    }
    line
}

pub fn run<W: Write>(writer: &mut W, args: &ListArgs, config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let records = db
        .list_records(&args.filter())
        .context("failed to list records")?;

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&records)?)?;
        return Ok(());
    }

    if records.is_empty() {
        writeln!(writer, "No records found.")?;
        return Ok(());
    }
    for record in &records {
        writeln!(writer, "{}", format_stored(record))?;
    }
    writeln!(writer, "{} records", records.len())?;
    Ok(())
}
