//! Delete command: remove stored records by date and/or device.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;

use punch_core::DeviceId;

use super::util::{open_database, parse_date, parse_device};
use crate::Config;

#[derive(Debug, Clone, Default, Args)]
pub struct DeleteArgs {
    /// Delete records of this date (YYYY-MM-DD or DD/MM/YYYY).
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    /// Delete records touching this turnstile.
    #[arg(short, long, value_parser = parse_device)]
    pub device: Option<DeviceId>,
}

pub fn run<W: Write>(writer: &mut W, args: &DeleteArgs, config: &Config) -> Result<()> {
    let mut db = open_database(config)?;
    let deleted = db
        .delete_records(args.date, args.device)
        .context("failed to delete records")?;
    tracing::info!(deleted, "deleted records");
    writeln!(writer, "Deleted {deleted} records")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::NaiveTime;
    use punch_core::{ObservationLanguage, Period, PersonName, ReconciledRecord, SourceLabel};
    use punch_db::{Database, DbError, RunMode};

    use super::*;

    fn record(day: u32, device: i64) -> ReconciledRecord {
        ReconciledRecord {
            person: PersonName::new("Ana").unwrap(),
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            period: Period::Lunch,
            pair_index: 0,
            entry_time: NaiveTime::from_hms_opt(12, 0, 0),
            exit_time: None,
            entry_device: DeviceId::new(device).ok(),
            exit_device: None,
            is_duplicate: false,
            observation: None,
            source_labels: BTreeSet::from([SourceLabel::new("c.jsonl").unwrap()]),
        }
    }

    fn seeded_config(dir: &std::path::Path) -> Config {
        let config = Config::with_database(dir.join("punch.db"));
        let mut db = Database::open(&config.database_path).unwrap();
        db.insert_batch(
            &[record(5, 1), record(5, 2), record(6, 1)],
            RunMode::Single,
            ObservationLanguage::PtBr,
        )
        .unwrap();
        config
    }

    #[test]
    fn delete_by_date_and_device() {
        let temp = tempfile::tempdir().unwrap();
        let config = seeded_config(temp.path());
        let args = DeleteArgs {
            date: NaiveDate::from_ymd_opt(2024, 3, 5),
            device: DeviceId::new(2).ok(),
        };

        let mut output = Vec::new();
        run(&mut output, &args, &config).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "Deleted 1 records\n");

        let db = Database::open(&config.database_path).unwrap();
        assert_eq!(db.statistics().unwrap().records, 2);
    }

    #[test]
    fn delete_without_filter_is_refused() {
        let temp = tempfile::tempdir().unwrap();
        let config = seeded_config(temp.path());

        let mut output = Vec::new();
        let err = run(&mut output, &DeleteArgs::default(), &config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DbError>(),
            Some(DbError::MissingFilter)
        ));
        assert!(output.is_empty());

        let db = Database::open(&config.database_path).unwrap();
        assert_eq!(db.statistics().unwrap().records, 3);
    }
}
