//! Deferload - deferred resource loading for client applications.
//!
//! This library decides *when* to fetch images, UI components, and other
//! deferred assets: on viewport visibility, on explicit prefetch, or during
//! idle time, while tracking per-resource load state and aggregate
//! performance metrics. It performs no rendering and owns no network
//! protocol; the view layer supplies element handles and reads reactive
//! state back.
//!
//! # Architecture
//!
//! ```text
//! view layer ──► ObservationEngine ──► trigger ──► LoadScheduler ──► state
//!                 (IntersectionDriver)               │                signals
//!                                                    └──► LoadMetrics ──► LoadReport
//!
//! call sites ──► PrefetchQueue ──► idle slots ──► loaders ──► PrefetchCache
//!
//! ResponsiveSource: viewport width ──► variant URL (pure, no state)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use deferload::{LazyBinding, LazyConfig, ObservationTarget};
//! use deferload::loader::shared_loader;
//!
//! let binding = LazyBinding::builder()
//!     .config(LazyConfig::new().with_fallback("placeholder.png"))
//!     .driver(host_driver)
//!     .loader(shared_loader(|| async { fetch_image_src().await }))
//!     .build();
//!
//! binding.observe(&ObservationTarget::new("hero-image"));
//! ```

pub mod binding;
pub mod config;
pub mod error;
pub mod loader;
pub mod observer;
pub mod prefetch;
pub mod responsive;
pub mod scheduler;
pub mod signal;
pub mod telemetry;

pub use binding::{LazyBinding, LazyBindingBuilder};
pub use config::LazyConfig;
pub use error::{DriverUnavailable, LoadError};
pub use loader::{shared_loader, HttpFetcher, ResourceFetcher, SharedLoader};
pub use observer::{
    IntersectionDriver, ManualDriver, ObservationEngine, ObservationTarget, TargetId,
    UnsupportedDriver,
};
pub use prefetch::{DelayPacer, IdlePacer, PrefetchCache, PrefetchQueue, YieldPacer};
pub use responsive::{Breakpoint, ResponsiveSource};
pub use scheduler::{LoadScheduler, LoadState};
pub use signal::Signal;
pub use telemetry::{LoadMarker, LoadMetrics, LoadReport, PerformanceBand};
