//! Cleaning diagnostics: why rows were dropped and how many.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Why a raw row was rejected. Reasons are checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    MissingField,
    InvalidAction,
    InvalidPrice,
    InvalidQuantity,
    InvalidTimestamp,
}

impl RejectReason {
    pub fn all() -> &'static [RejectReason] {
        &[
            RejectReason::MissingField,
            RejectReason::InvalidAction,
            RejectReason::InvalidPrice,
            RejectReason::InvalidQuantity,
            RejectReason::InvalidTimestamp,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::MissingField => "missing_field",
            RejectReason::InvalidAction => "invalid_action",
            RejectReason::InvalidPrice => "invalid_price",
            RejectReason::InvalidQuantity => "invalid_quantity",
            RejectReason::InvalidTimestamp => "invalid_timestamp",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts produced by a cleaning run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningReport {
    /// Data rows read from the source (header excluded)
    pub raw_rows: usize,

    /// Transactions left after validation and deduplication
    pub accepted: usize,

    /// Valid transactions dropped as exact duplicates
    pub duplicates_removed: usize,

    /// Rows dropped per rejection reason
    pub rejected: BTreeMap<RejectReason, usize>,
}

impl CleaningReport {
    pub fn record_rejection(&mut self, reason: RejectReason) {
        *self.rejected.entry(reason).or_insert(0) += 1;
    }

    /// Rows dropped for `reason` (zero if none).
    pub fn rejected_for(&self, reason: RejectReason) -> usize {
        self.rejected.get(&reason).copied().unwrap_or(0)
    }

    pub fn total_rejected(&self) -> usize {
        self.rejected.values().sum()
    }

    pub fn total_removed(&self) -> usize {
        self.total_rejected() + self.duplicates_removed
    }

    /// True when nothing survived cleaning. Not an error, but callers
    /// report it differently from a healthy run.
    pub fn is_empty_result(&self) -> bool {
        self.accepted == 0
    }
}

impl std::fmt::Display for CleaningReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Raw rows:    {}", self.raw_rows)?;
        writeln!(f, "Clean rows:  {}", self.accepted)?;
        writeln!(f)?;
        for reason in RejectReason::all() {
            let count = self.rejected_for(*reason);
            if count > 0 {
                writeln!(f, "  {}: {} removed", reason, count)?;
            }
        }
        if self.duplicates_removed > 0 {
            writeln!(f, "  duplicates: {} removed", self.duplicates_removed)?;
        }
        writeln!(f)?;
        write!(f, "Total removed: {}", self.total_removed())
    }
}
