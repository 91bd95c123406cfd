//! The load scheduler: bind a load action to a trigger source.
//!
//! A [`LoadScheduler`] couples a caller-supplied loader to a trigger
//! condition (the visibility signal of an observation engine OR an
//! explicit `prefetch` flag) and exposes the resulting state machine
//! through reactive getters. Load failures are recorded in the `error`
//! state and never thrown past the scheduler boundary.
//!
//! # Serialization guarantee
//!
//! At most one load is in flight per scheduler instance. The transition
//! into `Loading` happens under a single lock, so concurrent triggers
//! observe `Loading` and no-op.
//!
//! # Example
//!
//! ```
//! use deferload::loader::shared_loader;
//! use deferload::scheduler::LoadScheduler;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let scheduler = LoadScheduler::detached(shared_loader(|| async {
//!     Ok("resolved.jpg".to_string())
//! }))
//! .with_prefetch(true);
//!
//! scheduler.try_load().await;
//! assert!(scheduler.is_loaded());
//! assert_eq!(scheduler.current(), Some("resolved.jpg".to_string()));
//! # }
//! ```

mod state;

pub use state::LoadState;

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::LoadError;
use crate::loader::SharedLoader;
use crate::signal::Signal;
use crate::telemetry::LoadMetrics;

/// Value and error slots guarded by one lock.
///
/// The same lock serializes state transitions, which is what makes the
/// `Loading` guard atomic.
struct Slots<T> {
    value: Option<T>,
    error: Option<LoadError>,
}

/// State machine that runs a loader when its trigger authorizes it.
///
/// Construct with [`new`](LoadScheduler::new) (bound to an intersection
/// signal) or [`detached`](LoadScheduler::detached) (no visibility source,
/// useful with `prefetch`), then chain `with_*` methods.
pub struct LoadScheduler<T> {
    loader: SharedLoader<T>,
    prefetch: bool,
    fallback: Option<T>,
    intersection: watch::Receiver<bool>,
    state: Signal<LoadState>,
    slots: Mutex<Slots<T>>,
    metrics: Option<Arc<LoadMetrics>>,
    // Keeps the private channel alive for detached schedulers.
    _detached: Option<watch::Sender<bool>>,
}

impl<T: Clone + Send + Sync + 'static> LoadScheduler<T> {
    /// Creates a scheduler whose trigger follows an intersection signal.
    pub fn new(loader: SharedLoader<T>, intersection: watch::Receiver<bool>) -> Self {
        Self {
            loader,
            prefetch: false,
            fallback: None,
            intersection,
            state: Signal::new(LoadState::NotStarted),
            slots: Mutex::new(Slots {
                value: None,
                error: None,
            }),
            metrics: None,
            _detached: None,
        }
    }

    /// Creates a scheduler with no visibility source.
    ///
    /// Its trigger is the `prefetch` flag alone; pair with
    /// [`with_prefetch`](Self::with_prefetch) for eager loading.
    pub fn detached(loader: SharedLoader<T>) -> Self {
        let (tx, rx) = watch::channel(false);
        let mut scheduler = Self::new(loader, rx);
        scheduler._detached = Some(tx);
        scheduler
    }

    /// Forces eager loading independent of visibility.
    pub fn with_prefetch(mut self, prefetch: bool) -> Self {
        self.prefetch = prefetch;
        self
    }

    /// Sets the value exposed while unloaded or after a failure.
    pub fn with_fallback(mut self, fallback: T) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Reports load start/end into a shared metrics sink.
    pub fn with_metrics(mut self, metrics: Arc<LoadMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Whether loading is currently authorized: visible OR prefetching.
    pub fn should_load(&self) -> bool {
        self.prefetch || *self.intersection.borrow()
    }

    /// Runs the loader if the trigger authorizes it and no load has
    /// happened yet.
    ///
    /// Returns `true` if a load ran to completion (successfully or not)
    /// during this call. Calls while `should_load` is false, while a load
    /// is in flight, or after a terminal state are no-ops.
    pub async fn try_load(&self) -> bool {
        if !self.should_load() {
            return false;
        }
        {
            let _slots = self.slots.lock();
            if self.state.get() != LoadState::NotStarted {
                return false;
            }
            self.state.set(LoadState::Loading);
        }
        self.run_load().await;
        true
    }

    /// Explicitly re-enters `Loading` from a terminal state.
    ///
    /// Returns `false` without side effects when the state is
    /// `NotStarted` (use [`try_load`](Self::try_load)) or `Loading`
    /// (a load is already in flight).
    pub async fn reload(&self) -> bool {
        {
            let mut slots = self.slots.lock();
            if !self.state.get().is_terminal() {
                return false;
            }
            slots.error = None;
            self.state.set(LoadState::Loading);
        }
        self.run_load().await;
        true
    }

    async fn run_load(&self) {
        let marker = self.metrics.as_ref().map(|m| m.start_load());
        debug!("load started");

        let outcome = (self.loader)().await;
        let success = outcome.is_ok();
        match outcome {
            Ok(value) => {
                let mut slots = self.slots.lock();
                slots.value = Some(value);
                slots.error = None;
                self.state.set(LoadState::Loaded);
                debug!("load completed");
            }
            Err(error) => {
                warn!(%error, "load failed");
                let mut slots = self.slots.lock();
                slots.error = Some(error);
                self.state.set(LoadState::Error);
            }
        }

        if let (Some(metrics), Some(marker)) = (&self.metrics, marker) {
            metrics.end_load(marker, success);
        }
    }

    /// Marks the resource loaded with a value produced out-of-band.
    pub fn set_loaded(&self, value: T) {
        let mut slots = self.slots.lock();
        slots.value = Some(value);
        slots.error = None;
        self.state.set(LoadState::Loaded);
    }

    /// Records a failure produced out-of-band.
    pub fn set_error(&self, error: LoadError) {
        let mut slots = self.slots.lock();
        slots.error = Some(error);
        self.state.set(LoadState::Error);
    }

    /// Current state of the load state machine.
    pub fn state(&self) -> LoadState {
        self.state.get()
    }

    /// Subscribes to state transitions.
    pub fn state_changes(&self) -> watch::Receiver<LoadState> {
        self.state.subscribe()
    }

    /// Whether the resource has loaded successfully.
    pub fn is_loaded(&self) -> bool {
        self.state.get() == LoadState::Loaded
    }

    /// The last load failure, if the scheduler is in the `Error` state.
    pub fn error(&self) -> Option<LoadError> {
        self.slots.lock().error.clone()
    }

    /// The value to expose right now.
    ///
    /// The loaded value when state is `Loaded`; otherwise the configured
    /// fallback (`None` if there is none); a failed load restores the
    /// fallback rather than a stale value.
    pub fn current(&self) -> Option<T> {
        if self.state.get() == LoadState::Loaded {
            self.slots.lock().value.clone()
        } else {
            self.fallback.clone()
        }
    }
}

impl<T> std::fmt::Debug for LoadScheduler<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadScheduler")
            .field("state", &self.state.get())
            .field("prefetch", &self.prefetch)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::shared_loader;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_loader(calls: Arc<AtomicUsize>) -> SharedLoader<String> {
        shared_loader(move || {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("loaded.jpg".to_string())
            }
        })
    }

    fn failing_loader(message: &str) -> SharedLoader<String> {
        let message = message.to_string();
        shared_loader(move || {
            let message = message.clone();
            async move { Err(LoadError::loader(message)) }
        })
    }

    #[tokio::test]
    async fn test_no_trigger_means_no_load() {
        let calls = Arc::new(AtomicUsize::new(0));
        let scheduler = LoadScheduler::detached(counting_loader(Arc::clone(&calls)));

        assert!(!scheduler.try_load().await);
        assert_eq!(scheduler.state(), LoadState::NotStarted);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_prefetch_forces_eager_load() {
        let calls = Arc::new(AtomicUsize::new(0));
        let scheduler =
            LoadScheduler::detached(counting_loader(Arc::clone(&calls))).with_prefetch(true);

        assert!(scheduler.should_load());
        assert!(scheduler.try_load().await);
        assert!(scheduler.is_loaded());
        assert_eq!(scheduler.current(), Some("loaded.jpg".to_string()));
    }

    #[tokio::test]
    async fn test_visibility_trigger_authorizes_load() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(false);
        let scheduler = LoadScheduler::new(counting_loader(Arc::clone(&calls)), rx);

        assert!(!scheduler.try_load().await);

        tx.send_replace(true);
        assert!(scheduler.try_load().await);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_double_trigger_loads_exactly_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let scheduler =
            LoadScheduler::detached(counting_loader(Arc::clone(&calls))).with_prefetch(true);

        assert!(scheduler.try_load().await);
        assert!(!scheduler.try_load().await);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_triggers_serialize_to_one_load() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let scheduler = Arc::new(
            LoadScheduler::detached(shared_loader(move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                    Ok("loaded.jpg".to_string())
                }
            }))
            .with_prefetch(true),
        );

        let (a, b) = tokio::join!(scheduler.try_load(), scheduler.try_load());
        // Exactly one of the two racing triggers ran the loader.
        assert!(a ^ b);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_records_error_and_restores_fallback() {
        let scheduler = LoadScheduler::detached(failing_loader("network"))
            .with_prefetch(true)
            .with_fallback("placeholder.png".to_string());

        assert!(scheduler.try_load().await);
        assert_eq!(scheduler.state(), LoadState::Error);
        assert!(!scheduler.is_loaded());
        assert_eq!(scheduler.error(), Some(LoadError::loader("network")));
        assert_eq!(scheduler.current(), Some("placeholder.png".to_string()));
    }

    #[tokio::test]
    async fn test_failure_does_not_retry_automatically() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let scheduler = LoadScheduler::detached(shared_loader(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<String, _>(LoadError::loader("boom"))
            }
        }))
        .with_prefetch(true);

        scheduler.try_load().await;
        assert!(!scheduler.try_load().await);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reload_reenters_from_terminal_states() {
        let calls = Arc::new(AtomicUsize::new(0));
        let scheduler =
            LoadScheduler::detached(counting_loader(Arc::clone(&calls))).with_prefetch(true);

        assert!(!scheduler.reload().await); // NotStarted: no-op
        scheduler.try_load().await;
        assert!(scheduler.reload().await); // Loaded: re-enters loading
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_set_loaded_and_set_error_hooks() {
        let scheduler =
            LoadScheduler::detached(counting_loader(Arc::new(AtomicUsize::new(0))));

        scheduler.set_loaded("external.jpg".to_string());
        assert!(scheduler.is_loaded());
        assert_eq!(scheduler.current(), Some("external.jpg".to_string()));

        scheduler.set_error(LoadError::loader("decode"));
        assert_eq!(scheduler.state(), LoadState::Error);
        assert!(scheduler.error().is_some());
    }

    #[tokio::test]
    async fn test_metrics_are_reported() {
        let metrics = Arc::new(LoadMetrics::new());
        let scheduler = LoadScheduler::detached(counting_loader(Arc::new(AtomicUsize::new(0))))
            .with_prefetch(true)
            .with_metrics(Arc::clone(&metrics));

        scheduler.try_load().await;

        assert_eq!(metrics.total_elements(), 1);
        assert_eq!(metrics.loaded_elements(), 1);
    }

    #[tokio::test]
    async fn test_state_changes_are_observable() {
        let scheduler = Arc::new(
            LoadScheduler::detached(counting_loader(Arc::new(AtomicUsize::new(0))))
                .with_prefetch(true),
        );
        let mut rx = scheduler.state_changes();

        scheduler.try_load().await;

        // The receiver sees the latest state even if intermediate
        // transitions were conflated.
        rx.changed().await.expect("signal alive");
        assert_eq!(*rx.borrow_and_update(), LoadState::Loaded);
    }
}
