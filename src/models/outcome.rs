// file: src/models/outcome.rs
// description: per-run and per-batch sync result reporting
// reference: internal data structures

use std::time::Duration;

/// Report for one completed sync run.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub repository_id: i64,
    /// Entries discovered in the remote subtree before filtering.
    pub files_discovered: usize,
    /// Files that survived the extension filter and were aggregated.
    pub files_aggregated: usize,
    pub document_bytes: usize,
    /// SHA-256 of the aggregated document, for operator-side identification.
    pub content_hash: String,
    pub duration: Duration,
}

/// Counters for one fleet-wide sync batch.
#[derive(Debug, Clone, Default)]
pub struct FleetStats {
    pub dispatched: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Runs rejected because the repository was already syncing.
    pub skipped_in_progress: usize,
    pub duration_secs: u64,
}

impl FleetStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every dispatched repository reached a terminal outcome or was skipped.
    pub fn completed(&self) -> usize {
        self.succeeded + self.failed + self.skipped_in_progress
    }

    pub fn success_rate(&self) -> f64 {
        let attempted = self.succeeded + self.failed;
        if attempted == 0 {
            return 0.0;
        }
        (self.succeeded as f64 / attempted as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fleet_stats_completed() {
        let stats = FleetStats {
            dispatched: 12,
            succeeded: 9,
            failed: 2,
            skipped_in_progress: 1,
            duration_secs: 3,
        };
        assert_eq!(stats.completed(), 12);
    }

    #[test]
    fn test_success_rate_ignores_skips() {
        let stats = FleetStats {
            dispatched: 4,
            succeeded: 3,
            failed: 1,
            skipped_in_progress: 0,
            duration_secs: 1,
        };
        assert!((stats.success_rate() - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_success_rate_zero_attempts() {
        assert_eq!(FleetStats::new().success_rate(), 0.0);
    }
}
