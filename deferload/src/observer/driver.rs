//! Intersection-detection driver abstraction.
//!
//! The [`IntersectionDriver`] trait hides how the host detects viewport
//! intersection. The engine only needs to register a watch and receive
//! boolean events through a sink; a host that cannot detect intersection at
//! all reports [`DriverUnavailable`] and the engine degrades gracefully.
//!
//! # Implementors
//!
//! - [`ManualDriver`] - tests and headless simulation: events are fired
//!   explicitly by target id
//! - [`UnsupportedDriver`] - capability absent: every watch attempt fails,
//!   which the engine turns into an immediate permanent trigger

use std::sync::Arc;

use dashmap::DashMap;

use super::target::{ObservationTarget, TargetId};
use crate::error::DriverUnavailable;

/// Options passed to the driver when registering a watch.
#[derive(Clone, Debug, PartialEq)]
pub struct WatchOptions {
    /// Intersection ratio (0.0 - 1.0) required to fire a positive event.
    pub threshold: f64,

    /// CSS-margin-like expansion of the viewport test region.
    pub root_margin: String,
}

/// Callback receiving intersection events: `true` when the target enters
/// the (margin-expanded) viewport, `false` when it leaves.
pub type IntersectionSink = Arc<dyn Fn(bool) + Send + Sync>;

/// A registered watch that can be released exactly once.
///
/// Releasing is idempotent; dropping an unreleased handle releases it, so a
/// watch can never outlive its owner.
pub struct WatchHandle {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl WatchHandle {
    /// Wraps a release action supplied by the driver.
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Releases the watch. Safe to call more than once.
    pub fn release(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }

    /// Whether the watch has already been released.
    pub fn is_released(&self) -> bool {
        self.release.is_none()
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle")
            .field("released", &self.is_released())
            .finish()
    }
}

/// Host mechanism for detecting viewport intersection.
///
/// Implementations deliver events through the sink until the returned
/// [`WatchHandle`] is released. A single driver instance may serve many
/// targets concurrently.
pub trait IntersectionDriver: Send + Sync {
    /// Begins watching a target.
    ///
    /// # Arguments
    ///
    /// * `target` - The region to watch
    /// * `options` - Threshold and margin configuration
    /// * `sink` - Callback receiving `true`/`false` intersection events
    ///
    /// # Errors
    ///
    /// Returns [`DriverUnavailable`] when the host lacks the capability;
    /// the engine handles this by failing open.
    fn watch(
        &self,
        target: &ObservationTarget,
        options: WatchOptions,
        sink: IntersectionSink,
    ) -> Result<WatchHandle, DriverUnavailable>;
}

/// Driver for hosts with no intersection-detection capability.
///
/// Every watch attempt fails, which the engine converts into an immediate
/// permanent trigger (fail-open).
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedDriver;

impl IntersectionDriver for UnsupportedDriver {
    fn watch(
        &self,
        _target: &ObservationTarget,
        _options: WatchOptions,
        _sink: IntersectionSink,
    ) -> Result<WatchHandle, DriverUnavailable> {
        Err(DriverUnavailable)
    }
}

/// Driver whose events are fired explicitly, for tests and simulation.
///
/// Registered sinks are keyed by target id; [`fire`](ManualDriver::fire)
/// delivers an event to the watcher of that target, if any. Released
/// watches are removed from the registry, so firing at a released target
/// delivers nothing.
#[derive(Default)]
pub struct ManualDriver {
    watchers: Arc<DashMap<TargetId, IntersectionSink>>,
}

impl ManualDriver {
    /// Creates a driver with no registered watches.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers an intersection event to the watcher of `id`.
    ///
    /// Returns `true` if a watcher received the event, `false` if the
    /// target is not being watched (never registered, or released).
    pub fn fire(&self, id: TargetId, intersecting: bool) -> bool {
        // Clone the sink out so the map shard is not held during delivery;
        // a `once` watcher releases itself (removing its entry) from inside
        // the callback.
        let sink = self.watchers.get(&id).map(|entry| entry.value().clone());
        match sink {
            Some(sink) => {
                sink(intersecting);
                true
            }
            None => false,
        }
    }

    /// Whether a watch is currently registered for `id`.
    pub fn is_watching(&self, id: TargetId) -> bool {
        self.watchers.contains_key(&id)
    }

    /// Number of registered watches.
    pub fn watch_count(&self) -> usize {
        self.watchers.len()
    }
}

impl IntersectionDriver for ManualDriver {
    fn watch(
        &self,
        target: &ObservationTarget,
        _options: WatchOptions,
        sink: IntersectionSink,
    ) -> Result<WatchHandle, DriverUnavailable> {
        let id = target.id();
        self.watchers.insert(id, sink);

        let watchers = Arc::clone(&self.watchers);
        Ok(WatchHandle::new(move || {
            watchers.remove(&id);
        }))
    }
}

impl std::fmt::Debug for ManualDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualDriver")
            .field("watch_count", &self.watch_count())
            .finish()
    }
}
