//! Run counters and reporting
//!
//! This module defines the running totals kept across the migration and
//! the structured progress/summary logging emitted around them.

use std::time::Duration;

/// Running totals for one migration run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Source records consumed from the extraction cursor.
    pub processed: usize,

    /// Records inserted into the target schema.
    pub inserted: usize,

    /// Records reconciled through the update path.
    pub updated: usize,

    /// Records written to a failure log.
    pub failed: usize,

    /// Source pages consumed.
    pub pages: usize,

    /// Elapsed wall-clock time for the run.
    pub duration: Duration,
}

impl RunSummary {
    /// Create a new empty summary.
    pub fn new() -> Self {
        Self {
            processed: 0,
            inserted: 0,
            updated: 0,
            failed: 0,
            pages: 0,
            duration: Duration::from_secs(0),
        }
    }

    /// Set the duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn add_processed(&mut self, count: usize) {
        self.processed += count;
    }

    pub fn add_inserted(&mut self, count: usize) {
        self.inserted += count;
    }

    pub fn add_updated(&mut self, count: usize) {
        self.updated += count;
    }

    pub fn add_failed(&mut self, count: usize) {
        self.failed += count;
    }

    pub fn add_page(&mut self) {
        self.pages += 1;
    }

    /// True when every processed record succeeded.
    pub fn is_successful(&self) -> bool {
        self.failed == 0
    }

    /// Success rate as a percentage of processed records.
    pub fn success_rate(&self) -> f64 {
        if self.processed == 0 {
            return 100.0;
        }
        ((self.processed - self.failed) as f64 / self.processed as f64) * 100.0
    }

    /// Log running totals after a source batch.
    pub fn log_progress(&self) {
        tracing::info!(
            pages = self.pages,
            processed = self.processed,
            inserted = self.inserted,
            updated = self.updated,
            failed = self.failed,
            "Batch complete"
        );
    }

    /// Log the final summary.
    pub fn log_summary(&self) {
        tracing::info!(
            processed = self.processed,
            inserted = self.inserted,
            updated = self.updated,
            failed = self.failed,
            pages = self.pages,
            duration_secs = self.duration.as_secs(),
            success_rate = format!("{:.2}%", self.success_rate()),
            "Migration completed"
        );

        if self.failed > 0 {
            tracing::warn!(
                failed = self.failed,
                "Migration completed with failures; see the failure logs for replay"
            );
        }
    }
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}
