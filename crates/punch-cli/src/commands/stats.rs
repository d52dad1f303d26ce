//! Stats command: store-wide totals.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;

use super::util::open_database;
use crate::Config;

#[derive(Debug, Clone, Default, Args)]
pub struct StatsArgs {
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &StatsArgs, config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let stats = db.statistics().context("failed to compute statistics")?;

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&stats)?)?;
        return Ok(());
    }

    writeln!(writer, "Database: {}", config.database_path.display())?;
    if stats.records == 0 {
        writeln!(writer, "No records stored.")?;
        return Ok(());
    }
    writeln!(writer, "Records: {}", stats.records)?;
    writeln!(writer, "Paired: {}", stats.paired)?;
    writeln!(writer, "People: {}", stats.people)?;
    writeln!(writer, "Days: {}", stats.days)?;
    if let (Some(first), Some(last)) = (&stats.first_date, &stats.last_date) {
        writeln!(writer, "Range: {first} to {last}")?;
    }
    writeln!(writer, "Turnstile 1: {}", stats.device_1)?;
    writeln!(writer, "Turnstile 2: {}", stats.device_2)?;
    writeln!(writer, "Duplicates: {}", stats.duplicates)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{NaiveDate, NaiveTime};
    use insta::assert_snapshot;
    use punch_core::{
        DeviceId, ObservationLanguage, Period, PersonName, ReconciledRecord, SourceLabel,
    };
    use punch_db::{Database, RunMode};

    use super::*;

    fn record(person: &str, day: u32, device: i64) -> ReconciledRecord {
        ReconciledRecord {
            person: PersonName::new(person).unwrap(),
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            period: Period::Dinner,
            pair_index: 0,
            entry_time: NaiveTime::from_hms_opt(18, 30, 0),
            exit_time: NaiveTime::from_hms_opt(19, 0, 0),
            entry_device: DeviceId::new(device).ok(),
            exit_device: DeviceId::new(device).ok(),
            is_duplicate: false,
            observation: None,
            source_labels: BTreeSet::from([SourceLabel::new("c.jsonl").unwrap()]),
        }
    }

    #[test]
    fn stats_summarize_store() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config::with_database(temp.path().join("punch.db"));
        let mut db = Database::open(&config.database_path).unwrap();
        db.insert_batch(
            &[record("Ana", 5, 1), record("Bruno", 5, 2), record("Ana", 7, 2)],
            RunMode::Consolidated,
            ObservationLanguage::PtBr,
        )
        .unwrap();

        let mut output = Vec::new();
        run(&mut output, &StatsArgs::default(), &config).unwrap();
        let output = String::from_utf8(output).unwrap();
        let output = output.replace(&config.database_path.display().to_string(), "[TEMP]/punch.db");
        assert_snapshot!(output, @r"
        Database: [TEMP]/punch.db
        Records: 3
        Paired: 3
        People: 2
        Days: 2
        Range: 2024-03-05 to 2024-03-07
        Turnstile 1: 1
        Turnstile 2: 2
        Duplicates: 0
        ");
    }

    #[test]
    fn stats_on_empty_store() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config::with_database(temp.path().join("punch.db"));

        let mut output = Vec::new();
        run(&mut output, &StatsArgs { json: true }, &config).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(json["records"], 0);
        assert!(json["first_date"].is_null());
    }
}
