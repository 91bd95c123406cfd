//! Background prefetching.
//!
//! This module runs caller-supplied loaders in the background without
//! blocking interactive work: one item at a time, strict FIFO, paced by
//! idle slots. Producer calls are decoupled from the single consumer
//! cycle, bounding concurrent background work to one executing item so
//! prefetching never contends with interactive loads for bandwidth.
//!
//! # Architecture
//!
//! ```text
//! enqueue() ──┐
//! prefetch_image() ──┤──► FIFO ──► drain cycle ──► idle slot ──► run item
//! prefetch_route() ──┘              (at most one)      │
//!                                                      └──► PrefetchCache
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use deferload::loader::HttpFetcher;
//! use deferload::prefetch::PrefetchQueue;
//!
//! let queue = PrefetchQueue::builder()
//!     .fetcher(Arc::new(HttpFetcher::new()?))
//!     .build();
//!
//! queue.prefetch_image("cdn/hero-1920w.jpg");
//! queue.routes().register("reports", || load_reports_chunk());
//! queue.prefetch_route("reports");
//! ```

mod cache;
mod pacer;
mod queue;
mod routes;

pub use cache::{CacheStats, PrefetchCache, DEFAULT_CACHE_CAPACITY_BYTES};
pub use pacer::{DelayPacer, IdlePacer, YieldPacer, DEFAULT_IDLE_INTERVAL_MS};
pub use queue::{PrefetchQueue, PrefetchQueueBuilder, QueueLoader};
pub use routes::{RouteLoader, RouteRegistry};
