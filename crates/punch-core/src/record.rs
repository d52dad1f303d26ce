//! Reconciled attendance records.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize};

use crate::normalize::minutes_of_day;
use crate::period::Period;
use crate::types::{DeviceId, PersonName, SourceLabel};

/// Anomaly noted on a cross-device record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Observation {
    OnlyEntry,
    OnlyExit,
    DifferentDevices,
}

/// Language used when an observation is rendered as free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObservationLanguage {
    En,
    #[default]
    PtBr,
}

impl Observation {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OnlyEntry => "only entry recorded",
            Self::OnlyExit => "only exit recorded",
            Self::DifferentDevices => "entry and exit on different devices",
        }
    }

    /// Operator-facing text in the given language.
    #[must_use]
    pub const fn text(&self, language: ObservationLanguage) -> &'static str {
        match language {
            ObservationLanguage::En => self.as_str(),
            // Stored verbatim, casing included; existing reports match on it.
            ObservationLanguage::PtBr => match self {
                Self::OnlyEntry => "Apenas entrada registrada",
                Self::OnlyExit => "Apenas saída registrada",
                Self::DifferentDevices => "entrada e saída em catracas diferentes",
            },
        }
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rounded minutes from `entry` to `exit`, half away from zero.
///
/// Negative when the exit precedes the entry.
#[expect(
    clippy::cast_possible_truncation,
    reason = "a day has fewer than i64::MAX minutes"
)]
pub fn minutes_between(entry: NaiveTime, exit: NaiveTime) -> i64 {
    (minutes_of_day(exit) - minutes_of_day(entry)).round() as i64
}

/// One attendance pairing for a person, date and meal period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledRecord {
    pub person: PersonName,
    pub date: NaiveDate,
    pub period: Period,
    /// Position of this pair within its group; 0 is the canonical pair.
    pub pair_index: usize,
    pub entry_time: Option<NaiveTime>,
    pub exit_time: Option<NaiveTime>,
    pub entry_device: Option<DeviceId>,
    pub exit_device: Option<DeviceId>,
    pub is_duplicate: bool,
    pub observation: Option<Observation>,
    pub source_labels: BTreeSet<SourceLabel>,
}

impl ReconciledRecord {
    /// Minutes between entry and exit, if both were recorded.
    pub fn duration_minutes(&self) -> Option<i64> {
        Some(minutes_between(self.entry_time?, self.exit_time?))
    }

    /// Whether both an entry and an exit were matched.
    pub const fn is_paired(&self) -> bool {
        self.entry_time.is_some() && self.exit_time.is_some()
    }

    /// Source labels joined for display or storage.
    pub fn joined_sources(&self) -> String {
        self.source_labels
            .iter()
            .map(SourceLabel::as_str)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

fn format_time(time: Option<NaiveTime>) -> Option<String> {
    time.map(|t| t.format("%H:%M:%S").to_string())
}

impl Serialize for ReconciledRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ReconciledRecord", 12)?;
        state.serialize_field("person", &self.person)?;
        state.serialize_field("date", &self.date.format("%Y-%m-%d").to_string())?;
        state.serialize_field("period", &self.period)?;
        state.serialize_field("pair_index", &self.pair_index)?;
        state.serialize_field("entry_time", &format_time(self.entry_time))?;
        state.serialize_field("exit_time", &format_time(self.exit_time))?;
        state.serialize_field("duration_minutes", &self.duration_minutes())?;
        state.serialize_field("entry_device", &self.entry_device)?;
        state.serialize_field("exit_device", &self.exit_device)?;
        state.serialize_field("is_duplicate", &self.is_duplicate)?;
        state.serialize_field("observation", &self.observation.map(|o| o.as_str()))?;
        state.serialize_field("source_labels", &self.source_labels)?;
        state.end()
    }
}
