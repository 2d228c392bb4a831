use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free cache counters.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    /// Reads that found a fresh entry
    pub hits: AtomicU64,
    /// Reads that found an expired entry
    pub stale_hits: AtomicU64,
    /// Reads that found nothing
    pub misses: AtomicU64,
    pub inserts: AtomicU64,
    pub removals: AtomicU64,
    /// Resolutions answered from an expired entry after a failed fetch
    pub stale_served: AtomicU64,
}

impl CacheMetrics {
    #[inline]
    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Fraction of reads answered by a fresh entry.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let total = hits
            + self.stale_hits.load(Ordering::Relaxed)
            + self.misses.load(Ordering::Relaxed);
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}
