//! Viewport-intersection observation.
//!
//! This module converts "is this target within the viewport (plus margin)"
//! into a boolean trigger signal. Intersection detection itself lives behind
//! the [`IntersectionDriver`] trait so the engine works against whatever
//! mechanism the host provides; when no mechanism exists the engine fails
//! open and triggers immediately, preferring to load too early over never
//! loading at all.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use deferload::config::LazyConfig;
//! use deferload::observer::{ManualDriver, ObservationEngine, ObservationTarget};
//!
//! let driver = Arc::new(ManualDriver::new());
//! let engine = ObservationEngine::new(driver.clone(), &LazyConfig::default());
//!
//! let target = ObservationTarget::new("hero-image");
//! engine.observe(&target);
//! assert!(!engine.is_intersecting());
//!
//! // The host reports the target entering the viewport.
//! driver.fire(target.id(), true);
//! assert!(engine.is_intersecting());
//! ```

mod driver;
mod engine;
mod target;

pub use driver::{
    IntersectionDriver, IntersectionSink, ManualDriver, UnsupportedDriver, WatchHandle,
    WatchOptions,
};
pub use engine::ObservationEngine;
pub use target::{ObservationTarget, TargetId};
