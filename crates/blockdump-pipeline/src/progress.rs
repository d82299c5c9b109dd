use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// How one dequeued height was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Ledger already says `ok` and the file still validates.
    Skipped,
    /// File was present but unrecorded; a synthetic `ok` row was appended.
    Repaired,
    Succeeded { tries: u32 },
    Failed { tries: u32 },
    /// Cancelled mid-flight; nothing was recorded.
    Aborted,
    /// The outcome could not be recorded in the ledger.
    LedgerError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub height:     u64,
    pub resolution: Resolution,
    /// Heights resolved so far, this one included.
    pub processed:  u64,
    pub total:      u64,
}

pub type ProgressCallback = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;

/// Lock-free counters shared by every worker.
#[derive(Debug, Default)]
pub struct RunProgress {
    total:         u64,
    processed:     AtomicU64,
    succeeded:     AtomicU64,
    skipped:       AtomicU64,
    repaired:      AtomicU64,
    failed:        AtomicU64,
    aborted:       AtomicU64,
    ledger_errors: AtomicU64,
}

impl RunProgress {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Count `resolution`; returns the event to publish.
    ///
    /// Aborted heights do not advance `processed`.
    pub fn record(&self, height: u64, resolution: Resolution) -> ProgressEvent {
        let counter = match resolution {
            Resolution::Skipped => &self.skipped,
            Resolution::Repaired => &self.repaired,
            Resolution::Succeeded { .. } => &self.succeeded,
            Resolution::Failed { .. } => &self.failed,
            Resolution::Aborted => &self.aborted,
            Resolution::LedgerError => &self.ledger_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        let processed = if resolution == Resolution::Aborted {
            self.processed.load(Ordering::Relaxed)
        } else {
            self.processed.fetch_add(1, Ordering::Relaxed) + 1
        };

        ProgressEvent {
            height,
            resolution,
            processed,
            total: self.total,
        }
    }

    pub fn report(&self, interrupted: bool) -> RunReport {
        RunReport {
            total: self.total,
            processed: self.processed.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            repaired: self.repaired.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            aborted: self.aborted.load(Ordering::Relaxed),
            ledger_errors: self.ledger_errors.load(Ordering::Relaxed),
            interrupted,
        }
    }
}

/// Final tally of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RunReport {
    pub total:         u64,
    pub processed:     u64,
    pub succeeded:     u64,
    pub skipped:       u64,
    pub repaired:      u64,
    pub failed:        u64,
    pub aborted:       u64,
    pub ledger_errors: u64,
    pub interrupted:   bool,
}

impl RunReport {
    /// `130` interrupted, `1` unresolved failures, `0` otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.interrupted {
            130
        } else if self.failed > 0 || self.ledger_errors > 0 {
            1
        } else {
            0
        }
    }

    /// Heights whose data is on disk and recorded.
    pub fn ok(&self) -> u64 {
        self.succeeded + self.skipped + self.repaired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aborted_items_are_not_processed() {
        let progress = RunProgress::new(3);
        progress.record(1, Resolution::Succeeded { tries: 1 });
        let event = progress.record(2, Resolution::Aborted);
        assert_eq!(event.processed, 1);

        let report = progress.report(true);
        assert_eq!(report.processed, 1);
        assert_eq!(report.aborted, 1);
        assert_eq!(report.exit_code(), 130);
    }

    #[test]
    fn exit_code_reflects_failures() {
        let progress = RunProgress::new(2);
        progress.record(1, Resolution::Skipped);
        assert_eq!(progress.report(false).exit_code(), 0);

        progress.record(2, Resolution::Failed { tries: 8 });
        let report = progress.report(false);
        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.ok(), 1);
    }

    #[test]
    fn ledger_errors_fail_the_run() {
        let progress = RunProgress::new(1);
        progress.record(7, Resolution::LedgerError);
        assert_eq!(progress.report(false).exit_code(), 1);
    }
}
