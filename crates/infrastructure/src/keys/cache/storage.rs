use super::{CacheEntry, CacheLookup, CacheMetrics};
use dashmap::DashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Upper bound for expiries so huge TTLs cannot overflow the clock.
const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

/// In-memory key → (value, expiry) store.
///
/// Expiry only decides whether an entry is fresh; expired entries stay in the
/// map until removed or cleared so they can be served as a degraded fallback.
/// There is no size-based eviction.
pub struct CacheStore {
    entries: DashMap<String, CacheEntry>,
    metrics: Arc<CacheMetrics>,
}

impl CacheStore {
    pub fn new() -> Self {
        info!("Initializing key cache");
        Self {
            entries: DashMap::new(),
            metrics: Arc::new(CacheMetrics::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read an entry and classify it as fresh or stale. Updates metrics.
    pub fn get(&self, key: &str) -> Option<CacheLookup> {
        match self.peek(key) {
            Some(lookup) => {
                if lookup.fresh {
                    CacheMetrics::incr(&self.metrics.hits);
                } else {
                    CacheMetrics::incr(&self.metrics.stale_hits);
                }
                Some(lookup)
            }
            None => {
                CacheMetrics::incr(&self.metrics.misses);
                None
            }
        }
    }

    /// Same as [`get`](Self::get) without touching the metrics.
    pub fn peek(&self, key: &str) -> Option<CacheLookup> {
        let now = Instant::now();
        self.entries.get(key).map(|entry| CacheLookup {
            value: Arc::clone(&entry.value),
            fresh: entry.is_fresh(now),
        })
    }

    /// Insert or overwrite `key`, fresh for `ttl` from now.
    pub fn put(&self, key: &str, value: impl Into<Arc<str>>, ttl: Duration) {
        let expires_at = Instant::now() + ttl.min(MAX_TTL);
        self.entries
            .insert(key.to_string(), CacheEntry::new(value.into(), expires_at));
        CacheMetrics::incr(&self.metrics.inserts);
        debug!(key = %key, ttl_secs = ttl.as_secs(), "Cache entry stored");
    }

    /// Returns true when an entry was present.
    pub fn remove(&self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            CacheMetrics::incr(&self.metrics.removals);
            debug!(key = %key, "Cache entry removed");
        }
        removed
    }

    /// Drop every entry, returning how many were present.
    pub fn clear(&self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.metrics.removals.fetch_add(count as u64, Ordering::Relaxed);
        info!(removed = count, "Key cache cleared");
        count
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }

    /// Number of entries whose TTL has elapsed.
    pub fn stale_count(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| !e.is_fresh(now)).count()
    }

    pub fn metrics(&self) -> Arc<CacheMetrics> {
        Arc::clone(&self.metrics)
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}
