//! Storage layer for reconciled punches.
//!
//! Provides persistence for reconciliation batches using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization.
//!
//! # Schema
//!
//! Every reconciliation run is stored as one row in `import_batches` plus one
//! row per record in `punch_records`. Batches are written in a single
//! transaction so a failed run leaves nothing behind.
//!
//! Dates are stored as `YYYY-MM-DD` and times as `HH:MM:SS` TEXT, so
//! lexicographic ordering matches chronological ordering. `period` holds the
//! wire names (`cafe`, `almoco`, `janta`, `outro`).

use std::path::Path;

use chrono::{NaiveDate, SecondsFormat, Utc};
use punch_core::{DeviceId, ObservationLanguage, Period, ReconciledRecord};
use rusqlite::types::Value;
use rusqlite::{Connection, params, params_from_iter};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Deleting without any filter would wipe the whole table.
    #[error("provide at least one filter (date or device) to delete records")]
    MissingFilter,
    /// A stored period string is not one of the known periods.
    #[error("invalid period stored for record {record_id}: {value}")]
    InvalidPeriod { record_id: i64, value: String },
}

/// How a batch was reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Single,
    Consolidated,
}

impl RunMode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Consolidated => "consolidated",
        }
    }
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// A reconciled record as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredRecord {
    pub id: i64,
    pub batch_id: String,
    pub name: String,
    pub date: String,
    pub entry_time: Option<String>,
    pub exit_time: Option<String>,
    pub duration_minutes: Option<i64>,
    pub entry_device: Option<i64>,
    pub exit_device: Option<i64>,
    pub period: String,
    pub is_duplicate: bool,
    pub source_labels: String,
    pub observation: Option<String>,
}

/// Result of storing a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertedBatch {
    pub batch_id: String,
    pub inserted: usize,
}

/// Filters for [`Database::list_records`]. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// Case-insensitive substring of the person's name.
    pub name: Option<String>,
    /// Exact date; takes precedence over `from`/`to`.
    pub date: Option<NaiveDate>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Matches records whose entry or exit came from this device.
    pub device: Option<DeviceId>,
    pub period: Option<Period>,
    pub duplicates: Option<bool>,
}

/// Per-period totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodIndicator {
    pub period: Period,
    pub total: i64,
    /// Records with both an entry and an exit.
    pub paired: i64,
    pub duplicates: i64,
    /// Rounded mean duration of paired records, 0 when there are none.
    pub average_minutes: i64,
}

/// Indicators for every period plus overall totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Indicators {
    pub periods: Vec<PeriodIndicator>,
    pub total: i64,
    pub paired: i64,
    pub duplicates: i64,
}

/// Store-wide statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub people: i64,
    pub days: i64,
    pub records: i64,
    pub paired: i64,
    pub device_1: i64,
    pub device_2: i64,
    pub duplicates: i64,
    pub first_date: Option<String>,
    pub last_date: Option<String>,
}

const RECORD_COLUMNS: &str = "id, batch_id, name, date, entry_time, exit_time, duration_minutes, \
     entry_device, exit_device, period, is_duplicate, source_labels, observation";

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Builds a `WHERE` clause that always starts with `1=1`.
#[derive(Default)]
struct Conditions {
    clause: String,
    values: Vec<Value>,
}

impl Conditions {
    fn push(&mut self, sql: &str, values: impl IntoIterator<Item = Value>) {
        self.clause.push_str(" AND ");
        self.clause.push_str(sql);
        self.values.extend(values);
    }

    fn date_and_device(date: Option<NaiveDate>, device: Option<DeviceId>) -> Self {
        let mut conditions = Self::default();
        if let Some(date) = date {
            conditions.push("date = ?", [Value::Text(format_date(date))]);
        }
        if let Some(device) = device {
            let id = i64::from(device);
            conditions.push(
                "(entry_device = ? OR exit_device = ?)",
                [Value::Integer(id), Value::Integer(id)],
            );
        }
        conditions
    }

    fn where_sql(&self) -> String {
        format!("WHERE 1=1{}", self.clause)
    }
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS import_batches (
                id TEXT PRIMARY KEY,
                imported_at TEXT NOT NULL,
                mode TEXT NOT NULL,
                record_count INTEGER NOT NULL
            );

            -- One row per reconciled pairing
            -- date: YYYY-MM-DD, times: HH:MM:SS
            -- source_labels: originating file names joined with '; '
            CREATE TABLE IF NOT EXISTS punch_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                batch_id TEXT NOT NULL,
                name TEXT NOT NULL,
                date TEXT NOT NULL,
                entry_time TEXT,
                exit_time TEXT,
                duration_minutes INTEGER,
                entry_device INTEGER,
                exit_device INTEGER,
                period TEXT NOT NULL,
                is_duplicate INTEGER NOT NULL DEFAULT 0,
                source_labels TEXT NOT NULL,
                observation TEXT,
                FOREIGN KEY (batch_id) REFERENCES import_batches(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_punch_records_date ON punch_records(date);
            CREATE INDEX IF NOT EXISTS idx_punch_records_name ON punch_records(name);
            CREATE INDEX IF NOT EXISTS idx_punch_records_period ON punch_records(period);
            CREATE INDEX IF NOT EXISTS idx_punch_records_batch ON punch_records(batch_id);
            ",
        )?;
        Ok(())
    }

    /// Stores a reconciliation run, all or nothing.
    ///
    /// Observations are rendered as text in `language`.
    pub fn insert_batch(
        &mut self,
        records: &[ReconciledRecord],
        mode: RunMode,
        language: ObservationLanguage,
    ) -> Result<InsertedBatch, DbError> {
        let batch_id = Uuid::new_v4().to_string();
        let imported_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let record_count = i64::try_from(records.len()).unwrap_or(i64::MAX);

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO import_batches (id, imported_at, mode, record_count) VALUES (?, ?, ?, ?)",
            params![batch_id, imported_at, mode.as_str(), record_count],
        )?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "
                INSERT INTO punch_records
                (batch_id, name, date, entry_time, exit_time, duration_minutes,
                 entry_device, exit_device, period, is_duplicate, source_labels, observation)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
            )?;
            for record in records {
                inserted += stmt.execute(params![
                    batch_id,
                    record.person.as_str(),
                    format_date(record.date),
                    record.entry_time.map(|t| t.format("%H:%M:%S").to_string()),
                    record.exit_time.map(|t| t.format("%H:%M:%S").to_string()),
                    record.duration_minutes(),
                    record.entry_device.map(i64::from),
                    record.exit_device.map(i64::from),
                    record.period.as_str(),
                    record.is_duplicate,
                    record.joined_sources(),
                    record.observation.map(|o| o.text(language)),
                ])?;
            }
        }
        tx.commit()?;

        tracing::debug!(%batch_id, inserted, mode = mode.as_str(), "stored batch");
        Ok(InsertedBatch { batch_id, inserted })
    }

    /// Lists records matching `filter`, newest date first, then latest entry.
    pub fn list_records(&self, filter: &RecordFilter) -> Result<Vec<StoredRecord>, DbError> {
        let mut conditions = Conditions::default();
        if let Some(name) = filter.name.as_deref().filter(|n| !n.trim().is_empty()) {
            conditions.push(
                "instr(lower(name), lower(?)) > 0",
                [Value::Text(name.trim().to_string())],
            );
        }
        if let Some(date) = filter.date {
            conditions.push("date = ?", [Value::Text(format_date(date))]);
        } else {
            if let Some(from) = filter.from {
                conditions.push("date >= ?", [Value::Text(format_date(from))]);
            }
            if let Some(to) = filter.to {
                conditions.push("date <= ?", [Value::Text(format_date(to))]);
            }
        }
        if let Some(device) = filter.device {
            let id = i64::from(device);
            conditions.push(
                "(entry_device = ? OR exit_device = ?)",
                [Value::Integer(id), Value::Integer(id)],
            );
        }
        if let Some(period) = filter.period {
            conditions.push("period = ?", [Value::Text(period.as_str().to_string())]);
        }
        if let Some(duplicates) = filter.duplicates {
            conditions.push("is_duplicate = ?", [Value::Integer(i64::from(duplicates))]);
        }

        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM punch_records {} \
             ORDER BY date DESC, entry_time DESC, id ASC",
            conditions.where_sql()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(conditions.values.iter()), |row| {
            Ok(StoredRecord {
                id: row.get(0)?,
                batch_id: row.get(1)?,
                name: row.get(2)?,
                date: row.get(3)?,
                entry_time: row.get(4)?,
                exit_time: row.get(5)?,
                duration_minutes: row.get(6)?,
                entry_device: row.get(7)?,
                exit_device: row.get(8)?,
                period: row.get(9)?,
                is_duplicate: row.get(10)?,
                source_labels: row.get(11)?,
                observation: row.get(12)?,
            })
        })?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Per-period totals, duplicates and mean duration.
    ///
    /// All four periods are always reported, in reporting order.
    pub fn period_indicators(
        &self,
        date: Option<NaiveDate>,
        device: Option<DeviceId>,
    ) -> Result<Indicators, DbError> {
        let conditions = Conditions::date_and_device(date, device);
        let sql = format!(
            "
            SELECT period,
                   COUNT(*),
                   COUNT(CASE WHEN entry_time IS NOT NULL AND exit_time IS NOT NULL THEN 1 END),
                   COUNT(CASE WHEN is_duplicate = 1 THEN 1 END),
                   AVG(duration_minutes),
                   MIN(id)
            FROM punch_records
            {}
            GROUP BY period
            ",
            conditions.where_sql()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(conditions.values.iter()), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, Option<f64>>(4)?,
                row.get::<_, i64>(5)?,
            ))
        })?;

        let mut periods: Vec<PeriodIndicator> = Period::ALL
            .iter()
            .map(|&period| PeriodIndicator {
                period,
                total: 0,
                paired: 0,
                duplicates: 0,
                average_minutes: 0,
            })
            .collect();
        for row in rows {
            let (value, total, paired, duplicates, average, record_id) = row?;
            let period: Period = value
                .parse()
                .map_err(|_| DbError::InvalidPeriod { record_id, value })?;
            if let Some(indicator) = periods.iter_mut().find(|i| i.period == period) {
                indicator.total = total;
                indicator.paired = paired;
                indicator.duplicates = duplicates;
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "mean of i64 minutes fits in i64"
                )]
                let average_minutes = average.map_or(0, |avg| avg.round() as i64);
                indicator.average_minutes = average_minutes;
            }
        }

        let total = periods.iter().map(|i| i.total).sum();
        let paired = periods.iter().map(|i| i.paired).sum();
        let duplicates = periods.iter().map(|i| i.duplicates).sum();
        Ok(Indicators {
            periods,
            total,
            paired,
            duplicates,
        })
    }

    /// Aggregate statistics over the whole store.
    pub fn statistics(&self) -> Result<Statistics, DbError> {
        let stats = self.conn.query_row(
            "
            SELECT COUNT(DISTINCT name),
                   COUNT(DISTINCT date),
                   COUNT(*),
                   COUNT(CASE WHEN entry_time IS NOT NULL AND exit_time IS NOT NULL THEN 1 END),
                   COUNT(CASE WHEN entry_device = 1 OR exit_device = 1 THEN 1 END),
                   COUNT(CASE WHEN entry_device = 2 OR exit_device = 2 THEN 1 END),
                   COUNT(CASE WHEN is_duplicate = 1 THEN 1 END),
                   MIN(date),
                   MAX(date)
            FROM punch_records
            ",
            [],
            |row| {
                Ok(Statistics {
                    people: row.get(0)?,
                    days: row.get(1)?,
                    records: row.get(2)?,
                    paired: row.get(3)?,
                    device_1: row.get(4)?,
                    device_2: row.get(5)?,
                    duplicates: row.get(6)?,
                    first_date: row.get(7)?,
                    last_date: row.get(8)?,
                })
            },
        )?;
        Ok(stats)
    }

    /// Deletes records for a date and/or device.
    ///
    /// Refuses to run without a filter. Returns the number of deleted records.
    /// Batch record counts are refreshed and emptied batches are dropped in the
    /// same transaction.
    pub fn delete_records(
        &mut self,
        date: Option<NaiveDate>,
        device: Option<DeviceId>,
    ) -> Result<usize, DbError> {
        if date.is_none() && device.is_none() {
            return Err(DbError::MissingFilter);
        }
        let conditions = Conditions::date_and_device(date, device);
        let sql = format!("DELETE FROM punch_records {}", conditions.where_sql());
        let tx = self.conn.transaction()?;
        let deleted = tx.execute(&sql, params_from_iter(conditions.values.iter()))?;
        tx.execute_batch(
            "
            DELETE FROM import_batches
            WHERE NOT EXISTS (
                SELECT 1 FROM punch_records WHERE punch_records.batch_id = import_batches.id
            );
            UPDATE import_batches
            SET record_count = (
                SELECT COUNT(*) FROM punch_records WHERE punch_records.batch_id = import_batches.id
            );
            ",
        )?;
        tx.commit()?;
        tracing::debug!(deleted, "deleted records");
        Ok(deleted)
    }
}
