//! The observation engine: one target, one trigger signal.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;

use super::driver::{IntersectionDriver, IntersectionSink, WatchHandle, WatchOptions};
use super::target::ObservationTarget;
use crate::config::LazyConfig;
use crate::signal::Signal;

/// State shared between the engine and its event sink.
struct EngineShared {
    is_intersecting: Signal<bool>,
    once: bool,
    state: Mutex<WatchState>,
}

#[derive(Default)]
struct WatchState {
    handle: Option<WatchHandle>,
    released: bool,
}

/// Converts viewport intersection of a single target into a boolean trigger.
///
/// The engine registers a watch with its [`IntersectionDriver`] and mirrors
/// the driver's events into the `is_intersecting` signal:
///
/// - positive event: signal becomes `true`; with `once` configured the
///   watch is released immediately afterwards and can never fire again
/// - negative event with `once = false`: signal reverts to `false`
/// - driver unavailable: fail-open, the signal becomes `true` immediately
///   and permanently
///
/// [`disconnect`](ObservationEngine::disconnect) must run on every teardown
/// path of the owning context; it is idempotent and safe to call when not
/// observing.
pub struct ObservationEngine {
    driver: Arc<dyn IntersectionDriver>,
    options: WatchOptions,
    shared: Arc<EngineShared>,
}

impl ObservationEngine {
    /// Creates an engine for the given driver and configuration.
    pub fn new(driver: Arc<dyn IntersectionDriver>, config: &LazyConfig) -> Self {
        Self {
            driver,
            options: WatchOptions {
                threshold: config.threshold,
                root_margin: config.root_margin.clone(),
            },
            shared: Arc::new(EngineShared {
                is_intersecting: Signal::new(false),
                once: config.once,
                state: Mutex::new(WatchState::default()),
            }),
        }
    }

    /// Begins watching a target.
    ///
    /// Any previous watch on this engine is torn down first, so duplicate
    /// watchers never accumulate. If the driver reports that intersection
    /// detection is unavailable, the trigger fires immediately and
    /// permanently instead of surfacing an error.
    pub fn observe(&self, target: &ObservationTarget) {
        let previous = {
            let mut state = self.shared.state.lock();
            state.released = false;
            state.handle.take()
        };
        if let Some(mut handle) = previous {
            handle.release();
        }

        let sink = self.make_sink();
        match self.driver.watch(target, self.options.clone(), sink) {
            Ok(handle) => {
                let mut state = self.shared.state.lock();
                if state.released {
                    // A `once` event fired before the handle was stored.
                    drop(state);
                    let mut handle = handle;
                    handle.release();
                } else {
                    state.handle = Some(handle);
                }
            }
            Err(unavailable) => {
                debug!(observed = %target, %unavailable, "failing open");
                self.shared.state.lock().released = true;
                self.shared.is_intersecting.set(true);
            }
        }
    }

    /// Releases the current watch unconditionally.
    ///
    /// Idempotent; safe to call when not observing.
    pub fn disconnect(&self) {
        let handle = {
            let mut state = self.shared.state.lock();
            state.released = true;
            state.handle.take()
        };
        if let Some(mut handle) = handle {
            handle.release();
        }
    }

    /// Current value of the trigger signal.
    pub fn is_intersecting(&self) -> bool {
        self.shared.is_intersecting.get()
    }

    /// Subscribes to trigger signal changes.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shared.is_intersecting.subscribe()
    }

    /// Whether a live watch is currently registered.
    pub fn is_observing(&self) -> bool {
        self.shared.state.lock().handle.is_some()
    }

    fn make_sink(&self) -> IntersectionSink {
        let shared = Arc::clone(&self.shared);
        Arc::new(move |intersecting| {
            if intersecting {
                shared.is_intersecting.set(true);
                if shared.once {
                    // Release immediately after the first positive event; a
                    // released watch cannot fire again.
                    let handle = {
                        let mut state = shared.state.lock();
                        state.released = true;
                        state.handle.take()
                    };
                    if let Some(mut handle) = handle {
                        handle.release();
                    }
                }
            } else if !shared.once {
                shared.is_intersecting.set(false);
            }
        })
    }
}

impl std::fmt::Debug for ObservationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservationEngine")
            .field("is_intersecting", &self.is_intersecting())
            .field("is_observing", &self.is_observing())
            .field("options", &self.options)
            .finish()
    }
}
