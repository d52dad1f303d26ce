//! Core domain logic for turnstile punch reconciliation.
//!
//! This crate contains the fundamental types and logic for:
//! - Normalization: canonicalizing spreadsheet date and time cells
//! - Period classification: bucketing times of day into meal periods
//! - Pairing: grouping punches and pairing entries with exits
//! - Reconciliation: single-device and cross-device runs
//!
//! Everything here is a pure batch transform with no I/O.

pub mod normalize;
mod pairing;
pub mod period;
pub mod punch;
pub mod reconcile;
pub mod record;
mod summary;
pub mod types;

pub use normalize::{RawCell, normalize_date, normalize_time};
pub use pairing::{GroupKey, pair_events};
pub use period::{Period, PeriodPolicy};
pub use punch::{PunchEvent, RawRow};
pub use reconcile::{DeviceBatch, ReconcileError, Reconciliation, reconcile_devices, reconcile_single};
pub use record::{Observation, ObservationLanguage, ReconciledRecord};
pub use summary::RunSummary;
pub use types::{DeviceId, Direction, PersonName, SourceLabel, ValidationError};
