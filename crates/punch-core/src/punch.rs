//! Normalized turnstile punches and the raw rows they come from.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::normalize::{RawCell, normalize_date, normalize_time};
use crate::types::{DeviceId, Direction, PersonName, SourceLabel};

/// One row as extracted from a turnstile export sheet.
///
/// Field names follow the export headers (`NOME`, `DATA`, `HORA`) with
/// lowercase English aliases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    #[serde(default, rename = "NOME", alias = "name", alias = "nome")]
    pub name: Option<String>,
    #[serde(default, rename = "DATA", alias = "date", alias = "data")]
    pub date: Option<RawCell>,
    #[serde(default, rename = "HORA", alias = "time", alias = "hora")]
    pub time: Option<RawCell>,
}

impl RawRow {
    /// Builds a row from text cells.
    pub fn new(name: &str, date: impl Into<RawCell>, time: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            date: Some(date.into()),
            time: Some(time.into()),
        }
    }

    /// Normalizes the row, or returns `None` if name, date or time is unusable.
    pub fn into_event(
        self,
        direction: Direction,
        device: Option<DeviceId>,
        source: &SourceLabel,
    ) -> Option<PunchEvent> {
        let person = PersonName::new(self.name?).ok()?;
        let date = normalize_date(self.date.as_ref()?)?;
        let time = normalize_time(self.time.as_ref()?)?;
        Some(PunchEvent {
            person,
            date,
            time,
            direction,
            device,
            source: source.clone(),
        })
    }
}

/// A single normalized swipe.
///
/// Immutable once built; fields are read through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PunchEvent {
    person: PersonName,
    date: NaiveDate,
    time: NaiveTime,
    direction: Direction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    device: Option<DeviceId>,
    source: SourceLabel,
}

impl PunchEvent {
    pub const fn new(
        person: PersonName,
        date: NaiveDate,
        time: NaiveTime,
        direction: Direction,
        device: Option<DeviceId>,
        source: SourceLabel,
    ) -> Self {
        Self {
            person,
            date,
            time,
            direction,
            device,
            source,
        }
    }

    pub const fn person(&self) -> &PersonName {
        &self.person
    }

    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    pub const fn time(&self) -> NaiveTime {
        self.time
    }

    pub const fn direction(&self) -> Direction {
        self.direction
    }

    pub const fn device(&self) -> Option<DeviceId> {
        self.device
    }

    pub const fn source(&self) -> &SourceLabel {
        &self.source
    }
}

/// Normalizes a stream of rows, dropping the ones that cannot be used.
///
/// Returns the events and the number of rows skipped.
pub fn normalize_rows(
    rows: impl IntoIterator<Item = RawRow>,
    direction: Direction,
    device: Option<DeviceId>,
    source: &SourceLabel,
) -> (Vec<PunchEvent>, usize) {
    let mut events = Vec::new();
    let mut skipped = 0;
    for (idx, row) in rows.into_iter().enumerate() {
        match row.into_event(direction, device, source) {
            Some(event) => events.push(event),
            None => {
                tracing::debug!(row = idx + 1, %direction, %source, "skipping malformed row");
                skipped += 1;
            }
        }
    }
    (events, skipped)
}
