//! Idle-slot pacing abstraction.
//!
//! The prefetch queue runs at most one item per idle slot so background
//! work never contends with interactive loads. What counts as an "idle
//! slot" is host-dependent, so it sits behind the [`IdlePacer`] trait:
//!
//! - [`DelayPacer`] - the preferred primitive: a fixed quiet interval
//!   between items, standing in for a host idle callback
//! - [`YieldPacer`] - the degraded fallback when no idle primitive exists:
//!   defer to the next task-scheduling turn and proceed

use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};

/// Default quiet interval between prefetch items.
pub const DEFAULT_IDLE_INTERVAL_MS: u64 = 50;

/// Decides when the next background work slot begins.
///
/// The queue awaits [`idle_slot`](IdlePacer::idle_slot) before every item,
/// so implementations control the drain cadence without knowing anything
/// about the work itself.
pub trait IdlePacer: Send + Sync {
    /// Resolves when the next idle slot begins.
    fn idle_slot(&self) -> BoxFuture<'static, ()>;

    /// Human-readable name for logging.
    fn name(&self) -> &'static str;
}

/// Paces items by waiting a fixed quiet interval.
#[derive(Clone, Copy, Debug)]
pub struct DelayPacer {
    interval: Duration,
}

impl DelayPacer {
    /// Creates a pacer with the given quiet interval.
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// The configured interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for DelayPacer {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_IDLE_INTERVAL_MS))
    }
}

impl IdlePacer for DelayPacer {
    fn idle_slot(&self) -> BoxFuture<'static, ()> {
        let interval = self.interval;
        async move {
            tokio::time::sleep(interval).await;
        }
        .boxed()
    }

    fn name(&self) -> &'static str {
        "delay"
    }
}

/// Defers to the next task-scheduling turn and proceeds.
///
/// Fallback for hosts without an idle-time primitive; also keeps tests
/// fast and deterministic.
#[derive(Clone, Copy, Debug, Default)]
pub struct YieldPacer;

impl IdlePacer for YieldPacer {
    fn idle_slot(&self) -> BoxFuture<'static, ()> {
        async {
            tokio::task::yield_now().await;
        }
        .boxed()
    }

    fn name(&self) -> &'static str {
        "yield"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_delay_pacer_waits_for_interval() {
        let pacer = DelayPacer::new(Duration::from_millis(20));
        let start = Instant::now();
        pacer.idle_slot().await;
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_yield_pacer_resolves_immediately() {
        YieldPacer.idle_slot().await;
    }

    #[test]
    fn test_pacer_names() {
        assert_eq!(DelayPacer::default().name(), "delay");
        assert_eq!(YieldPacer.name(), "yield");
    }

    #[test]
    fn test_default_delay_interval() {
        assert_eq!(
            DelayPacer::default().interval(),
            Duration::from_millis(DEFAULT_IDLE_INTERVAL_MS)
        );
    }
}
