
use std::collections::BTreeMap;
use std::ops::AddAssign;

use crate::data_types::variant_row::{VariantKind, VariantRow};

/// Event and basepair counts for one kind of variant row
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KindMetrics {
    /// Number of rows of this kind
    pub events: u64,
    /// Number of reference bases covered by those rows
    pub bases: u64,
}

impl AddAssign for KindMetrics {
    // Enables += with stats
    fn add_assign(&mut self, rhs: Self) {
        self.events += rhs.events;
        self.bases += rhs.bases;
    }
}

impl KindMetrics {
    /// Constructor
    pub fn new(events: u64, bases: u64) -> Self {
        Self { events, bases }
    }
}

/// Per-sample tally of everything the caller emitted for that sample
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SampleSummary {
    /// Counts split by variant kind; kinds with no rows are absent
    kind_metrics: BTreeMap<VariantKind, KindMetrics>,
}

impl AddAssign<&SampleSummary> for SampleSummary {
    fn add_assign(&mut self, rhs: &SampleSummary) {
        for (&kind, &metrics) in rhs.kind_metrics.iter() {
            *self.kind_metrics.entry(kind).or_default() += metrics;
        }
    }
}

impl SampleSummary {
    /// Adds a single emitted row to the tally
    pub fn add_row(&mut self, row: &VariantRow) {
        let entry = self.kind_metrics.entry(row.kind()).or_default();
        *entry += KindMetrics::new(1, row.ref_len());
    }

    /// Returns the counts for one kind, zeroes if nothing was recorded
    pub fn metrics(&self, kind: VariantKind) -> KindMetrics {
        self.kind_metrics.get(&kind).copied().unwrap_or_default()
    }

    /// Total number of rows across all kinds
    pub fn total_events(&self) -> u64 {
        self.kind_metrics.values().map(|m| m.events).sum()
    }
}
