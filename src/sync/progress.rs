// file: src/sync/progress.rs
// description: progress reporting for fleet-wide sync batches
// reference: uses indicatif for progress bars

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct FleetProgress {
    bar: ProgressBar,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    skipped: AtomicUsize,
}

impl FleetProgress {
    pub fn new(total: u64) -> Self {
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Failed to create progress bar template")
                .progress_chars("█▓▒░"),
        );

        Self {
            bar,
            succeeded: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
        }
    }

    pub fn record_success(&self) {
        self.succeeded.fetch_add(1, Ordering::SeqCst);
        self.advance();
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
        self.advance();
    }

    pub fn record_skip(&self) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
        self.advance();
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    fn advance(&self) {
        self.bar.inc(1);
        self.bar.set_message(format!(
            "ok: {} | failed: {} | skipped: {}",
            self.succeeded.load(Ordering::SeqCst),
            self.failed.load(Ordering::SeqCst),
            self.skipped.load(Ordering::SeqCst)
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_advance_independently() {
        let progress = FleetProgress::new(3);

        progress.record_success();
        progress.record_failure();
        progress.record_skip();

        assert_eq!(progress.succeeded.load(Ordering::SeqCst), 1);
        assert_eq!(progress.failed.load(Ordering::SeqCst), 1);
        assert_eq!(progress.skipped.load(Ordering::SeqCst), 1);
        progress.finish();
    }
}
