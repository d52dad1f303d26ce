//! Single-device and cross-device reconciliation runs.
//!
//! Both entry points normalize the raw rows of each device export, tag every
//! punch with its device, and hand the merged stream to
//! [`pair_events`](crate::pairing::pair_events). Device identity is never part
//! of the grouping key, so an entry on one turnstile can pair with an exit on
//! the other.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::pairing::pair_events;
use crate::period::PeriodPolicy;
use crate::punch::{PunchEvent, RawRow, normalize_rows};
use crate::record::{Observation, ReconciledRecord};
use crate::types::{DeviceId, Direction, SourceLabel};

/// Fatal, run-level reconciliation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// A single-device run needs both the entry and the exit stream.
    #[error("no {direction} sheet found in {label}")]
    MissingStream {
        direction: Direction,
        label: SourceLabel,
    },
}

/// The rows exported by one turnstile.
///
/// A stream that is `None` was absent from the export; `Some(vec![])` was
/// present but empty.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceBatch {
    pub device: DeviceId,
    pub label: SourceLabel,
    pub entries: Option<Vec<RawRow>>,
    pub exits: Option<Vec<RawRow>>,
}

impl DeviceBatch {
    /// Creates a batch with no streams.
    pub const fn new(device: DeviceId, label: SourceLabel) -> Self {
        Self {
            device,
            label,
            entries: None,
            exits: None,
        }
    }

    #[must_use]
    pub fn with_entries(mut self, rows: Vec<RawRow>) -> Self {
        self.entries = Some(rows);
        self
    }

    #[must_use]
    pub fn with_exits(mut self, rows: Vec<RawRow>) -> Self {
        self.exits = Some(rows);
        self
    }

    /// Normalized punches from both streams, tagged with this batch's device.
    fn events(&self) -> (Vec<PunchEvent>, usize) {
        let mut events = Vec::new();
        let mut skipped = 0;
        for (direction, rows) in [
            (Direction::Entry, &self.entries),
            (Direction::Exit, &self.exits),
        ] {
            let Some(rows) = rows else { continue };
            let (mut normalized, dropped) =
                normalize_rows(rows.iter().cloned(), direction, Some(self.device), &self.label);
            events.append(&mut normalized);
            skipped += dropped;
        }
        (events, skipped)
    }
}

/// Output of one reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reconciliation {
    pub records: Vec<ReconciledRecord>,
    /// Rows dropped because name, date or time was unusable.
    pub skipped_rows: usize,
}

/// Reconciles the export of a single turnstile.
///
/// Fails before producing anything if either stream is missing from the
/// export. Records carry no observation.
pub fn reconcile_single(
    batch: &DeviceBatch,
    policy: PeriodPolicy,
) -> Result<Reconciliation, ReconcileError> {
    if batch.entries.is_none() {
        return Err(ReconcileError::MissingStream {
            direction: Direction::Entry,
            label: batch.label.clone(),
        });
    }
    if batch.exits.is_none() {
        return Err(ReconcileError::MissingStream {
            direction: Direction::Exit,
            label: batch.label.clone(),
        });
    }

    let (events, skipped_rows) = batch.events();
    Ok(Reconciliation {
        records: pair_events(&events, policy),
        skipped_rows,
    })
}

/// The anomaly, if any, a cross-device record should be annotated with.
pub fn observe(record: &ReconciledRecord) -> Option<Observation> {
    match (record.entry_time, record.exit_time) {
        (Some(_), None) => Some(Observation::OnlyEntry),
        (None, Some(_)) => Some(Observation::OnlyExit),
        (Some(_), Some(_)) if record.entry_device != record.exit_device => {
            Some(Observation::DifferentDevices)
        }
        _ => None,
    }
}

/// Merges the exports of up to two turnstiles into one view.
///
/// Missing batches or streams simply contribute nothing. Every record lists
/// the labels of all batches that contributed at least one punch to the run.
pub fn reconcile_devices(batches: &[DeviceBatch], policy: PeriodPolicy) -> Reconciliation {
    let mut events = Vec::new();
    let mut skipped_rows = 0;
    let mut contributors = BTreeSet::new();

    for batch in batches {
        let (mut batch_events, skipped) = batch.events();
        tracing::debug!(
            device = %batch.device,
            label = %batch.label,
            events = batch_events.len(),
            skipped,
            "normalized device export"
        );
        if !batch_events.is_empty() {
            contributors.insert(batch.label.clone());
        }
        events.append(&mut batch_events);
        skipped_rows += skipped;
    }

    let records = pair_events(&events, policy)
        .into_iter()
        .map(|mut record| {
            record.observation = observe(&record);
            record.source_labels.clone_from(&contributors);
            record
        })
        .collect();

    Reconciliation {
        records,
        skipped_rows,
    }
}
