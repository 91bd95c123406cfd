//! In-memory cache for prefetched payloads.
//!
//! Backed by `moka::future::Cache`, which uses lock-free structures
//! internally and is safe to touch from async contexts without blocking the
//! runtime. Entries are weighted by payload size so the cache stays within
//! a byte budget under LRU-style eviction.

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use moka::future::Cache;

/// Default capacity for the prefetch cache (16 MiB).
pub const DEFAULT_CACHE_CAPACITY_BYTES: u64 = 16 * 1024 * 1024;

/// Point-in-time cache statistics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that found an entry.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Entries currently cached.
    pub entry_count: u64,
    /// Total cached payload bytes.
    pub weighted_size: u64,
}

/// Byte cache keyed by resource URL.
///
/// Prefetched payloads land here so a later interactive load of the same
/// URL hits memory instead of the network.
pub struct PrefetchCache {
    cache: Cache<String, Bytes>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl PrefetchCache {
    /// Creates a cache bounded to `capacity_bytes` of payload.
    pub fn new(capacity_bytes: u64) -> Self {
        let cache = Cache::builder()
            // Weight each entry by its payload size; moka weights are u32.
            .weigher(|_key: &String, value: &Bytes| -> u32 {
                value.len().min(u32::MAX as usize) as u32
            })
            .max_capacity(capacity_bytes)
            .build();

        Self {
            cache,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Looks up a payload by URL.
    pub async fn get(&self, url: &str) -> Option<Bytes> {
        match self.cache.get(url).await {
            Some(bytes) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(bytes)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Stores a payload; eviction is automatic when over capacity.
    pub async fn put(&self, url: String, bytes: Bytes) {
        self.cache.insert(url, bytes).await;
        self.cache.run_pending_tasks().await;
    }

    /// Whether the URL is currently cached (does not count as a lookup).
    pub fn contains(&self, url: &str) -> bool {
        self.cache.contains_key(url)
    }

    /// Current statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: self.cache.entry_count(),
            weighted_size: self.cache.weighted_size(),
        }
    }
}

impl Default for PrefetchCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY_BYTES)
    }
}

impl std::fmt::Debug for PrefetchCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrefetchCache")
            .field("stats", &self.stats())
            .finish()
    }
}
