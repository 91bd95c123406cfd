//! Metrics collection for load attempts.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::report::{LoadReport, PerformanceBand};

/// Opaque marker returned by [`LoadMetrics::start_load`].
///
/// Holds the start timestamp; hand it back to
/// [`end_load`](LoadMetrics::end_load) when the attempt finishes.
#[derive(Debug)]
pub struct LoadMarker {
    started_at: Instant,
}

impl LoadMarker {
    /// Time elapsed since the load started.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Aggregates load-attempt timing and outcomes.
///
/// One instance is intentionally shared by many schedulers: wrap it in an
/// `Arc` and clone the handle into each one. The mutation contract is
/// append-only plus counter increments, so concurrent-looking calls from a
/// cooperative scheduler are safe without coordination beyond the internal
/// lock on the history.
///
/// Counters and the duration history grow monotonically for the lifetime of
/// the instance; the average is recomputed from the full history on each
/// read, never maintained incrementally.
#[derive(Debug, Default)]
pub struct LoadMetrics {
    total: AtomicU64,
    loaded: AtomicU64,
    failed: AtomicU64,
    durations: Mutex<Vec<Duration>>,
}

impl LoadMetrics {
    /// Creates an empty metrics sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the start of a load attempt.
    ///
    /// Increments the total-elements counter and returns a marker carrying
    /// the start timestamp.
    pub fn start_load(&self) -> LoadMarker {
        self.total.fetch_add(1, Ordering::Relaxed);
        LoadMarker {
            started_at: Instant::now(),
        }
    }

    /// Records the end of a load attempt started with [`start_load`](Self::start_load).
    pub fn end_load(&self, marker: LoadMarker, success: bool) {
        self.finish(marker.elapsed(), success);
    }

    /// Records a completed attempt with an externally measured duration.
    ///
    /// [`end_load`](Self::end_load) delegates here; callers that time their
    /// own loads can report through this directly.
    pub fn finish(&self, duration: Duration, success: bool) {
        self.durations.lock().push(duration);
        if success {
            self.loaded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Total load attempts started.
    pub fn total_elements(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Attempts that completed successfully.
    pub fn loaded_elements(&self) -> u64 {
        self.loaded.load(Ordering::Relaxed)
    }

    /// Attempts that completed with a failure.
    pub fn failed_elements(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Mean load duration over the entire recorded history.
    ///
    /// Zero when no attempt has completed yet.
    pub fn average_load_time(&self) -> Duration {
        let durations = self.durations.lock();
        if durations.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = durations.iter().sum();
        total / durations.len() as u32
    }

    /// Derives a point-in-time report from the current aggregates.
    pub fn report(&self) -> LoadReport {
        let total = self.total_elements();
        let loaded = self.loaded_elements();
        let success_rate = if total == 0 {
            0.0
        } else {
            loaded as f64 / total as f64 * 100.0
        };

        let average_ms = {
            let durations = self.durations.lock();
            if durations.is_empty() {
                0
            } else {
                let sum_ms: f64 = durations.iter().map(|d| d.as_secs_f64() * 1000.0).sum();
                (sum_ms / durations.len() as f64).round() as u64
            }
        };

        LoadReport {
            total_elements: total,
            loaded_elements: loaded,
            failed_elements: self.failed_elements(),
            success_rate,
            average_load_time_ms: average_ms,
            performance: PerformanceBand::classify(average_ms),
        }
    }
}
