//! Background idle-time work queue.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::cache::PrefetchCache;
use super::pacer::{DelayPacer, IdlePacer};
use super::routes::RouteRegistry;
use crate::error::LoadError;
use crate::loader::ResourceFetcher;

/// A queued one-shot loader.
pub type QueueLoader = Box<dyn FnOnce() -> BoxFuture<'static, Result<(), LoadError>> + Send>;

/// A pending unit of background work.
struct QueueItem {
    label: String,
    loader: QueueLoader,
}

struct QueueInner {
    pending: Mutex<VecDeque<QueueItem>>,
    // Mutated only while holding `pending`; atomic so getters stay lock-free.
    draining: AtomicBool,
    pacer: Arc<dyn IdlePacer>,
    fetcher: Option<Arc<dyn ResourceFetcher>>,
    cache: Option<Arc<PrefetchCache>>,
    routes: RouteRegistry,
    cancel: CancellationToken,
}

/// FIFO queue that drains caller-supplied loaders during idle slots.
///
/// Many producers may [`enqueue`](PrefetchQueue::enqueue) independently; a
/// single consumer cycle drains the queue one item per idle slot, so at
/// most one background load executes at any moment. A failing item is
/// logged and never halts or poisons the queue.
///
/// Cloning the queue clones a handle to the same underlying state.
///
/// # Example
///
/// ```
/// use deferload::prefetch::{PrefetchQueue, YieldPacer};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let queue = PrefetchQueue::builder().pacer(YieldPacer).build();
///
/// queue.enqueue("warm-up", || async {
///     // fetch something ahead of need
///     Ok(())
/// });
/// # }
/// ```
#[derive(Clone)]
pub struct PrefetchQueue {
    inner: Arc<QueueInner>,
}

impl PrefetchQueue {
    /// Creates a queue with the default pacer and cache.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts building a queue.
    pub fn builder() -> PrefetchQueueBuilder {
        PrefetchQueueBuilder::default()
    }

    /// Appends a loader to the FIFO and starts draining if idle.
    ///
    /// Requires a Tokio runtime context: the drain cycle is spawned as a
    /// background task. A re-entrant call while a cycle is already
    /// draining only appends; exactly one cycle runs at a time.
    pub fn enqueue<F, Fut>(&self, label: impl Into<String>, load: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), LoadError>> + Send + 'static,
    {
        self.enqueue_boxed(label.into(), Box::new(move || load().boxed()));
    }

    fn enqueue_boxed(&self, label: String, loader: QueueLoader) {
        if self.inner.cancel.is_cancelled() {
            warn!(item = %label, "queue is shut down; dropping item");
            return;
        }

        // The draining flag flips only while `pending` is held, so an item
        // pushed here is guaranteed to be seen by the running cycle or to
        // start a new one, never stranded.
        let start_cycle = {
            let mut pending = self.inner.pending.lock();
            pending.push_back(QueueItem { label, loader });
            !self.inner.draining.swap(true, Ordering::AcqRel)
        };

        if start_cycle {
            debug!(pacer = self.inner.pacer.name(), "starting prefetch drain cycle");
            tokio::spawn(drain(Arc::clone(&self.inner)));
        }
    }

    /// Enqueues an image fetch through the configured fetcher.
    ///
    /// The payload lands in the prefetch cache (when one is configured) so
    /// a later interactive load hits memory. Already-cached sources are
    /// skipped. Without a fetcher this logs and does nothing.
    pub fn prefetch_image(&self, src: impl Into<String>) {
        let src = src.into();
        let Some(fetcher) = self.inner.fetcher.clone() else {
            warn!(%src, "no fetcher configured; skipping image prefetch");
            return;
        };
        let cache = self.inner.cache.clone();
        let label = format!("image:{}", src);

        self.enqueue(label, move || async move {
            if let Some(cache) = &cache {
                if cache.contains(&src) {
                    debug!(%src, "already cached; skipping fetch");
                    return Ok(());
                }
            }
            let bytes = fetcher.fetch(&src).await?;
            if let Some(cache) = &cache {
                cache.put(src, bytes).await;
            }
            Ok(())
        });
    }

    /// Enqueues the loader registered for a route name.
    ///
    /// Unknown names log a warning and are skipped: prefetching is
    /// advisory, never an error.
    pub fn prefetch_route(&self, name: &str) {
        match self.inner.routes.get(name) {
            Some(loader) => self.enqueue(format!("route:{}", name), move || loader()),
            None => warn!(route = %name, "route not registered; skipping prefetch"),
        }
    }

    /// Whether a drain cycle is currently active.
    pub fn is_prefetching(&self) -> bool {
        self.inner.draining.load(Ordering::Acquire)
    }

    /// Number of items waiting in the FIFO.
    pub fn len(&self) -> usize {
        self.inner.pending.lock().len()
    }

    /// Whether the FIFO is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.pending.lock().is_empty()
    }

    /// The route registry backing [`prefetch_route`](Self::prefetch_route).
    pub fn routes(&self) -> &RouteRegistry {
        &self.inner.routes
    }

    /// The prefetch cache, when one is configured.
    pub fn cache(&self) -> Option<&Arc<PrefetchCache>> {
        self.inner.cache.as_ref()
    }

    /// Stops the drain cycle and rejects further items.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }
}

impl Default for PrefetchQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PrefetchQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrefetchQueue")
            .field("len", &self.len())
            .field("is_prefetching", &self.is_prefetching())
            .finish()
    }
}

/// Single consumer cycle: one item per idle slot until the queue is empty.
async fn drain(inner: Arc<QueueInner>) {
    loop {
        tokio::select! {
            _ = inner.cancel.cancelled() => {
                let pending = inner.pending.lock();
                inner.draining.store(false, Ordering::Release);
                debug!(dropped = pending.len(), "prefetch drain cancelled");
                return;
            }
            _ = inner.pacer.idle_slot() => {}
        }

        let item = {
            let mut pending = inner.pending.lock();
            match pending.pop_front() {
                Some(item) => item,
                None => {
                    // Flag clears under the lock; see enqueue_boxed.
                    inner.draining.store(false, Ordering::Release);
                    debug!("prefetch queue drained");
                    return;
                }
            }
        };

        debug!(item = %item.label, "prefetching");
        if let Err(error) = (item.loader)().await {
            warn!(item = %item.label, %error, "prefetch item failed; continuing");
        }
    }
}

#[derive(Default)]
pub struct PrefetchQueueBuilder {
    pacer: Option<Arc<dyn IdlePacer>>,
    fetcher: Option<Arc<dyn ResourceFetcher>>,
    cache: Option<Arc<PrefetchCache>>,
    no_cache: bool,
}

impl PrefetchQueueBuilder {
    /// Sets the idle pacer (default: [`DelayPacer`] with its default interval).
    pub fn pacer(mut self, pacer: impl IdlePacer + 'static) -> Self {
        self.pacer = Some(Arc::new(pacer));
        self
    }

    /// Sets the fetcher backing [`PrefetchQueue::prefetch_image`].
    pub fn fetcher(mut self, fetcher: Arc<dyn ResourceFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Uses an existing cache instead of the default one.
    pub fn cache(mut self, cache: Arc<PrefetchCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Disables payload caching entirely.
    pub fn no_cache(mut self) -> Self {
        self.no_cache = true;
        self
    }

    /// Builds the queue.
    pub fn build(self) -> PrefetchQueue {
        let cache = if self.no_cache {
            None
        } else {
            Some(self.cache.unwrap_or_default())
        };

        PrefetchQueue {
            inner: Arc::new(QueueInner {
                pending: Mutex::new(VecDeque::new()),
                draining: AtomicBool::new(false),
                pacer: self
                    .pacer
                    .unwrap_or_else(|| Arc::new(DelayPacer::default())),
                fetcher: self.fetcher,
                cache,
                routes: RouteRegistry::new(),
                cancel: CancellationToken::new(),
            }),
        }
    }
}
