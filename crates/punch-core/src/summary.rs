//! Counts reported after a reconciliation run.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::period::Period;
use crate::record::ReconciledRecord;

/// Totals for a batch of reconciled records.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RunSummary {
    pub total: usize,
    /// Records with both an entry and an exit.
    pub paired: usize,
    pub duplicates: usize,
    pub by_period: BTreeMap<Period, usize>,
}

impl RunSummary {
    pub fn from_records(records: &[ReconciledRecord]) -> Self {
        let mut summary = Self {
            total: records.len(),
            ..Self::default()
        };
        for record in records {
            if record.is_paired() {
                summary.paired += 1;
            }
            if record.is_duplicate {
                summary.duplicates += 1;
            }
            *summary.by_period.entry(record.period).or_insert(0) += 1;
        }
        summary
    }
}
