//! Binder between a view-layer element and the loading core.
//!
//! The view layer constructs a [`LazyBinding`], calls
//! [`observe`](LazyBinding::observe) when the element handle becomes
//! available, and [`disconnect`](LazyBinding::disconnect) on teardown.
//! Dropping the binding disconnects too, so every exit path releases the
//! watch. In between, the binding's drive task turns trigger flips into
//! load invocations and the view reads the reactive surface back.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use deferload::binding::LazyBinding;
//! use deferload::config::LazyConfig;
//! use deferload::loader::shared_loader;
//! use deferload::observer::ObservationTarget;
//!
//! let binding = LazyBinding::builder()
//!     .config(LazyConfig::new().with_fallback("placeholder.png"))
//!     .driver(driver)
//!     .loader(shared_loader(|| async { Ok("hero-1024w.jpg".to_string()) }))
//!     .build();
//!
//! let target = ObservationTarget::new("hero");
//! binding.observe(&target);
//! // ... the target scrolls into view; the loader runs ...
//! assert!(binding.is_loaded());
//! ```

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::LazyConfig;
use crate::error::LoadError;
use crate::loader::SharedLoader;
use crate::observer::{IntersectionDriver, ObservationEngine, ObservationTarget, UnsupportedDriver};
use crate::scheduler::{LoadScheduler, LoadState};
use crate::telemetry::LoadMetrics;

/// A lazily loaded source bound to one observable element.
///
/// Owns an [`ObservationEngine`], a [`LoadScheduler`] and the drive task
/// connecting them. The loaded artifact is the source string the view
/// layer renders; callers scheduling other artifact types use
/// [`LoadScheduler`] directly.
pub struct LazyBinding {
    engine: ObservationEngine,
    scheduler: Arc<LoadScheduler<String>>,
    cancel: CancellationToken,
}

impl LazyBinding {
    /// Starts building a binding.
    pub fn builder() -> LazyBindingBuilder {
        LazyBindingBuilder::default()
    }

    /// Begins watching a target; a previous watch is torn down first.
    pub fn observe(&self, target: &ObservationTarget) {
        self.engine.observe(target);
    }

    /// Stops the drive task and releases the watch. Idempotent.
    pub fn disconnect(&self) {
        self.cancel.cancel();
        self.engine.disconnect();
    }

    /// Whether the target currently intersects the viewport.
    pub fn is_intersecting(&self) -> bool {
        self.engine.is_intersecting()
    }

    /// Whether loading is authorized (visible OR prefetch).
    pub fn should_load(&self) -> bool {
        self.scheduler.should_load()
    }

    /// Whether the source loaded successfully.
    pub fn is_loaded(&self) -> bool {
        self.scheduler.is_loaded()
    }

    /// Current load state.
    pub fn state(&self) -> LoadState {
        self.scheduler.state()
    }

    /// The last load failure, if any.
    pub fn error(&self) -> Option<LoadError> {
        self.scheduler.error()
    }

    /// The source to render: the loaded value, else the fallback.
    pub fn current(&self) -> Option<String> {
        self.scheduler.current()
    }

    /// Marks the source loaded out-of-band.
    pub fn set_loaded(&self, value: impl Into<String>) {
        self.scheduler.set_loaded(value.into());
    }

    /// Records a failure out-of-band.
    pub fn set_error(&self, error: LoadError) {
        self.scheduler.set_error(error);
    }

    /// Explicitly reloads from a terminal state.
    pub async fn reload(&self) -> bool {
        self.scheduler.reload().await
    }
}

impl Drop for LazyBinding {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl std::fmt::Debug for LazyBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyBinding")
            .field("state", &self.state())
            .field("is_intersecting", &self.is_intersecting())
            .finish()
    }
}

/// Builder for [`LazyBinding`].
#[derive(Default)]
pub struct LazyBindingBuilder {
    config: LazyConfig,
    driver: Option<Arc<dyn IntersectionDriver>>,
    loader: Option<SharedLoader<String>>,
    metrics: Option<Arc<LoadMetrics>>,
}

impl LazyBindingBuilder {
    /// Sets the configuration (threshold, margin, once, prefetch, fallback).
    pub fn config(mut self, config: LazyConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the intersection driver.
    ///
    /// Without one the binding behaves as if the capability were absent
    /// and fails open on `observe`.
    pub fn driver(mut self, driver: Arc<dyn IntersectionDriver>) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Sets the load action producing the source.
    pub fn loader(mut self, loader: SharedLoader<String>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Reports load timings into a shared metrics sink.
    pub fn metrics(mut self, metrics: Arc<LoadMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Builds the binding and spawns its drive task.
    ///
    /// Requires a Tokio runtime context. With `prefetch` configured the
    /// load starts eagerly, before any intersection event.
    ///
    /// # Panics
    ///
    /// Panics if no loader was supplied. That is a contract violation, not a
    /// runtime failure.
    pub fn build(self) -> LazyBinding {
        let loader = self.loader.expect("a loader must be supplied");
        let driver = self
            .driver
            .unwrap_or_else(|| Arc::new(UnsupportedDriver));

        let engine = ObservationEngine::new(driver, &self.config);

        let mut scheduler =
            LoadScheduler::new(loader, engine.subscribe()).with_prefetch(self.config.prefetch);
        if let Some(fallback) = self.config.fallback.clone() {
            scheduler = scheduler.with_fallback(fallback);
        }
        if let Some(metrics) = self.metrics {
            scheduler = scheduler.with_metrics(metrics);
        }
        let scheduler = Arc::new(scheduler);

        let cancel = CancellationToken::new();
        tokio::spawn(drive(
            Arc::clone(&scheduler),
            engine.subscribe(),
            cancel.clone(),
        ));

        LazyBinding {
            engine,
            scheduler,
            cancel,
        }
    }
}

/// Turns trigger flips into load invocations until cancelled.
async fn drive(
    scheduler: Arc<LoadScheduler<String>>,
    mut trigger: watch::Receiver<bool>,
    cancel: CancellationToken,
) {
    // Prefetch-configured bindings (or an already-latched trigger) load
    // before any further event arrives.
    if scheduler.should_load() {
        scheduler.try_load().await;
    }

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            changed = trigger.changed() => {
                if changed.is_err() {
                    return;
                }
                if *trigger.borrow_and_update() {
                    scheduler.try_load().await;
                }
            }
        }
    }
}
