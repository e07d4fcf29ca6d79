//! Batch run statistics
//!
//! Every multi-record operation (backfill runners, event replay) reports a
//! summary at the end of the run, whether or not every record succeeded.

use crate::db::UpsertOutcome;

/// Counters for one batch operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Records pulled from the source
    pub processed: usize,
    /// Records that created a new destination row
    pub inserted: usize,
    /// Records that modified an existing destination row
    pub updated: usize,
    /// Records that matched an existing row byte-for-byte (no-op)
    pub unchanged: usize,
    /// Records skipped before reaching the store (missing keys etc.)
    pub skipped: usize,
    /// Records that failed transform or reconcile
    pub errors: usize,
}

impl BatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reconcile outcome
    pub fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Inserted => self.inserted += 1,
            UpsertOutcome::Updated => self.updated += 1,
            UpsertOutcome::Unchanged => self.unchanged += 1,
        }
    }

    pub fn display_string(&self) -> String {
        format!(
            "{} processed ({} inserted, {} updated, {} unchanged, {} skipped, {} errors)",
            self.processed, self.inserted, self.updated, self.unchanged, self.skipped, self.errors
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_string() {
        let stats = BatchStats {
            processed: 10,
            inserted: 4,
            updated: 3,
            unchanged: 1,
            skipped: 1,
            errors: 1,
        };
        assert_eq!(
            stats.display_string(),
            "10 processed (4 inserted, 3 updated, 1 unchanged, 1 skipped, 1 errors)"
        );
    }

    #[test]
    fn test_record_outcomes() {
        let mut stats = BatchStats::new();
        stats.record(UpsertOutcome::Inserted);
        stats.record(UpsertOutcome::Updated);
        stats.record(UpsertOutcome::Updated);
        stats.record(UpsertOutcome::Unchanged);
        assert_eq!(stats.inserted, 1);
        assert_eq!(stats.updated, 2);
        assert_eq!(stats.unchanged, 1);
    }
}
