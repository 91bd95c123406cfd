//! Point-in-time report derived from the metrics aggregates.

use std::fmt;

use serde::Serialize;

// =============================================================================
// Band Thresholds
// =============================================================================

/// Upper bound (exclusive) of the `Excellent` band, in milliseconds.
pub const EXCELLENT_BELOW_MS: u64 = 100;

/// Upper bound (exclusive) of the `Good` band, in milliseconds.
pub const GOOD_BELOW_MS: u64 = 300;

/// Upper bound (exclusive) of the `Fair` band, in milliseconds.
pub const FAIR_BELOW_MS: u64 = 1000;

/// Classification of the average load time into ordered bands.
///
/// Band boundaries are half-open on the lower bound and exclusive on the
/// upper: an average of exactly 100ms is `Good`, not `Excellent`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceBand {
    /// Average below 100ms.
    Excellent,
    /// Average below 300ms.
    Good,
    /// Average below 1000ms.
    Fair,
    /// Everything slower.
    Poor,
}

impl PerformanceBand {
    /// Classifies an average load time in whole milliseconds.
    pub fn classify(average_ms: u64) -> Self {
        if average_ms < EXCELLENT_BELOW_MS {
            Self::Excellent
        } else if average_ms < GOOD_BELOW_MS {
            Self::Good
        } else if average_ms < FAIR_BELOW_MS {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    /// Short lowercase label for display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
        }
    }
}

impl fmt::Display for PerformanceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of load performance across all tracked attempts.
///
/// Produced by [`LoadMetrics::report`](super::LoadMetrics::report); values
/// are derived from the full history at the moment of the call.
#[derive(Clone, Debug, Serialize)]
pub struct LoadReport {
    /// Load attempts started.
    pub total_elements: u64,

    /// Attempts that completed successfully.
    pub loaded_elements: u64,

    /// Attempts that failed.
    pub failed_elements: u64,

    /// `loaded / total * 100`; zero when nothing was attempted.
    pub success_rate: f64,

    /// Mean duration over the whole history, rounded to whole milliseconds.
    pub average_load_time_ms: u64,

    /// Band classification of the average load time.
    pub performance: PerformanceBand,
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} loaded ({} failed), {:.1}% success, avg {}ms ({})",
            self.loaded_elements,
            self.total_elements,
            self.failed_elements,
            self.success_rate,
            self.average_load_time_ms,
            self.performance
        )
    }
}
