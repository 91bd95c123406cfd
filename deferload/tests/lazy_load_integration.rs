//! Integration tests for the lazy-loading core.
//!
//! These tests verify the complete flow across components:
//! - intersection event -> trigger -> scheduler -> reactive state
//! - once-semantics and capability fallback of the observation engine
//! - FIFO draining and failure isolation of the prefetch queue
//! - metrics aggregation and report derivation
//!
//! Run with: `cargo test --test lazy_load_integration`

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt};

use deferload::loader::shared_loader;
use deferload::telemetry::LoadMetrics;
use deferload::{
    Breakpoint, LazyBinding, LazyConfig, LoadError, LoadState, ManualDriver, ObservationTarget,
    PerformanceBand, PrefetchQueue, ResourceFetcher, ResponsiveSource, UnsupportedDriver,
    YieldPacer,
};

// ============================================================================
// Helper Functions
// ============================================================================

/// Polls a condition until it holds, failing the test after two seconds.
async fn wait_until(condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("condition met in time");
}

/// Waits for the queue's drain cycle to finish.
async fn wait_for_drain(queue: &PrefetchQueue) {
    wait_until(|| !queue.is_prefetching()).await;
}

/// A loader that counts invocations and resolves to `src`.
fn counting_loader(
    calls: Arc<AtomicUsize>,
    src: &str,
) -> deferload::SharedLoader<String> {
    let src = src.to_string();
    shared_loader(move || {
        calls.fetch_add(1, Ordering::SeqCst);
        let src = src.clone();
        async move { Ok(src) }
    })
}

/// Fetcher resolving every URL to a fixed payload.
struct StaticFetcher(Bytes);

impl ResourceFetcher for StaticFetcher {
    fn fetch(&self, _url: &str) -> BoxFuture<'static, Result<Bytes, LoadError>> {
        let payload = self.0.clone();
        async move { Ok(payload) }.boxed()
    }
}

// ============================================================================
// Visibility-Driven Loading
// ============================================================================

/// An intersection event flows through to a loaded source, exactly once,
/// even when the trigger path fires twice.
#[tokio::test]
async fn test_intersection_triggers_exactly_one_load() {
    let driver = Arc::new(ManualDriver::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let binding = LazyBinding::builder()
        .config(LazyConfig::new().with_once(false))
        .driver(driver.clone())
        .loader(counting_loader(Arc::clone(&calls), "hero-1024w.jpg"))
        .build();

    let target = ObservationTarget::new("hero");
    binding.observe(&target);

    driver.fire(target.id(), true);
    wait_until(|| binding.is_loaded()).await;
    // A second positive event while already loaded is a no-op.
    driver.fire(target.id(), true);
    tokio::task::yield_now().await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(binding.current(), Some("hero-1024w.jpg".to_string()));
}

/// With `once` configured, the watch is released after the first positive
/// intersection; a later real event reaches no watcher.
#[tokio::test]
async fn test_once_releases_watch_after_first_trigger() {
    let driver = Arc::new(ManualDriver::new());
    let binding = LazyBinding::builder()
        .config(LazyConfig::new().with_once(true))
        .driver(driver.clone())
        .loader(counting_loader(Arc::new(AtomicUsize::new(0)), "a.jpg"))
        .build();

    let target = ObservationTarget::new("a");
    binding.observe(&target);

    assert!(driver.fire(target.id(), true));
    wait_until(|| binding.is_loaded()).await;

    assert!(!driver.is_watching(target.id()));
    assert!(!driver.fire(target.id(), true));
}

/// Leaving the viewport reverts the trigger but does not unload an
/// already-loaded resource.
#[tokio::test]
async fn test_leaving_viewport_keeps_loaded_resource() {
    let driver = Arc::new(ManualDriver::new());
    let binding = LazyBinding::builder()
        .config(LazyConfig::new().with_once(false))
        .driver(driver.clone())
        .loader(counting_loader(Arc::new(AtomicUsize::new(0)), "a.jpg"))
        .build();

    let target = ObservationTarget::new("a");
    binding.observe(&target);

    driver.fire(target.id(), true);
    wait_until(|| binding.is_loaded()).await;

    driver.fire(target.id(), false);
    wait_until(|| !binding.is_intersecting()).await;

    assert!(binding.is_loaded());
    assert_eq!(binding.current(), Some("a.jpg".to_string()));
}

/// Without intersection-detection capability, observing fails open: the
/// trigger fires immediately and the load proceeds.
#[tokio::test]
async fn test_capability_fallback_triggers_immediately() {
    let binding = LazyBinding::builder()
        .driver(Arc::new(UnsupportedDriver))
        .loader(counting_loader(Arc::new(AtomicUsize::new(0)), "a.jpg"))
        .build();

    let target = ObservationTarget::new("a");
    binding.observe(&target);

    assert!(binding.is_intersecting());
    wait_until(|| binding.is_loaded()).await;
}

// ============================================================================
// Failure Semantics
// ============================================================================

/// A rejecting loader surfaces through the error signal and the exposed
/// source falls back to the placeholder.
#[tokio::test]
async fn test_load_failure_restores_fallback() {
    let driver = Arc::new(ManualDriver::new());
    let binding = LazyBinding::builder()
        .config(LazyConfig::new().with_fallback("placeholder.png"))
        .driver(driver.clone())
        .loader(shared_loader(|| async { Err(LoadError::loader("network")) }))
        .build();

    let target = ObservationTarget::new("hero");
    binding.observe(&target);
    driver.fire(target.id(), true);

    wait_until(|| binding.state() == LoadState::Error).await;
    assert!(binding.error().is_some());
    assert!(!binding.is_loaded());
    assert_eq!(binding.current(), Some("placeholder.png".to_string()));
}

// ============================================================================
// Prefetch Queue
// ============================================================================

/// Three enqueued loaders run in order; the failing second item neither
/// halts the queue nor leaves the cycle flagged active.
#[tokio::test]
async fn test_queue_survives_failing_item() {
    let queue = PrefetchQueue::builder().pacer(YieldPacer).build();
    let order = Arc::new(Mutex::new(Vec::new()));

    for (index, fails) in [(1usize, false), (2, true), (3, false)] {
        let order = Arc::clone(&order);
        queue.enqueue(format!("item-{}", index), move || async move {
            order.lock().unwrap().push(index);
            if fails {
                Err(LoadError::loader("simulated"))
            } else {
                Ok(())
            }
        });
    }

    wait_for_drain(&queue).await;

    assert_eq!(*order.lock().unwrap(), vec![1, 2, 3]);
    assert!(queue.is_empty());
    assert!(!queue.is_prefetching());
}

/// Prefetched images land in the cache and later lookups hit memory.
#[tokio::test]
async fn test_prefetched_image_is_cached() {
    let queue = PrefetchQueue::builder()
        .pacer(YieldPacer)
        .fetcher(Arc::new(StaticFetcher(Bytes::from_static(b"pixels"))))
        .build();

    queue.prefetch_image("cdn/hero-480w.jpg");
    wait_for_drain(&queue).await;

    let cache = queue.cache().expect("default cache");
    assert_eq!(
        cache.get("cdn/hero-480w.jpg").await,
        Some(Bytes::from_static(b"pixels"))
    );
}

// ============================================================================
// Responsive Resolution
// ============================================================================

/// Tier selection across boundaries, ties resolving to the lower tier.
#[test]
fn test_responsive_tier_boundaries() {
    let source = ResponsiveSource::new("photo.jpg");

    assert_eq!(source.current_src(480), "photo-480w.jpg");
    assert_eq!(source.current_src(481), "photo-768w.jpg");
    assert_eq!(source.current_src(768), "photo-768w.jpg");
    assert_eq!(source.current_src(1024), "photo-1024w.jpg");
    assert_eq!(source.current_src(2000), "photo-1920w.jpg");
}

/// Caller-supplied variants override derived defaults key-for-key.
#[test]
fn test_responsive_overrides_and_src_set() {
    let source = ResponsiveSource::new("photo.jpg")
        .with_variant(Breakpoint::W1920, "photo-huge.jpg");

    assert_eq!(source.current_src(2000), "photo-huge.jpg");
    assert!(source.src_set().contains("photo-huge.jpg 1920w"));
    assert!(source.src_set().starts_with("photo-480w.jpg 480w"));
}

// ============================================================================
// Metrics
// ============================================================================

/// A report over an empty tracker is well-defined.
#[test]
fn test_empty_tracker_reports_zero_success_rate() {
    let metrics = LoadMetrics::new();
    let report = metrics.report();

    assert_eq!(report.total_elements, 0);
    assert_eq!(report.success_rate, 0.0);
    assert_eq!(report.performance, PerformanceBand::Excellent);
}

/// Durations of 50ms and 150ms average to exactly 100ms, which classifies
/// as `good` (100 is not `< 100`).
#[test]
fn test_average_duration_and_band_boundary() {
    let metrics = LoadMetrics::new();
    let _ = metrics.start_load();
    let _ = metrics.start_load();
    metrics.finish(Duration::from_millis(50), true);
    metrics.finish(Duration::from_millis(150), true);

    let report = metrics.report();
    assert_eq!(report.average_load_time_ms, 100);
    assert_eq!(report.performance, PerformanceBand::Good);
    assert_eq!(report.success_rate, 100.0);
}

/// Many bindings reporting into one shared sink aggregate correctly.
#[tokio::test]
async fn test_shared_metrics_across_bindings() {
    let driver = Arc::new(ManualDriver::new());
    let metrics = Arc::new(LoadMetrics::new());

    let mut bindings = Vec::new();
    let mut targets = Vec::new();
    for index in 0..3 {
        let fails = index == 2;
        let binding = LazyBinding::builder()
            .driver(driver.clone())
            .metrics(Arc::clone(&metrics))
            .loader(shared_loader(move || async move {
                if fails {
                    Err(LoadError::loader("boom"))
                } else {
                    Ok("ok.jpg".to_string())
                }
            }))
            .build();
        let target = ObservationTarget::new(format!("img-{}", index));
        binding.observe(&target);
        targets.push(target);
        bindings.push(binding);
    }

    for target in &targets {
        driver.fire(target.id(), true);
    }
    wait_until(|| bindings.iter().all(|b| b.state().is_terminal())).await;

    let report = metrics.report();
    assert_eq!(report.total_elements, 3);
    assert_eq!(report.loaded_elements, 2);
    assert_eq!(report.failed_elements, 1);
}
