//! Load telemetry for observability and user feedback.
//!
//! This module provides passive metrics collection across any number of
//! load schedulers. Counters use lock-free atomics; the duration history is
//! append-only behind a short-lived lock.
//!
//! # Architecture
//!
//! ```text
//! Load Schedulers ─────► LoadMetrics ─────► LoadReport ─────► Views
//!                        (atomic counters,  (point-in-time    (CLI, UI)
//!                         duration history)  derivation)
//! ```
//!
//! # Example
//!
//! ```
//! use deferload::telemetry::LoadMetrics;
//! use std::sync::Arc;
//!
//! let metrics = Arc::new(LoadMetrics::new());
//!
//! let marker = metrics.start_load();
//! // ... perform the load ...
//! metrics.end_load(marker, true);
//!
//! let report = metrics.report();
//! assert_eq!(report.total_elements, 1);
//! assert_eq!(report.loaded_elements, 1);
//! ```

mod metrics;
mod report;

pub use metrics::{LoadMarker, LoadMetrics};
pub use report::{LoadReport, PerformanceBand};
