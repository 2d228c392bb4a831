use std::sync::Arc;
use tokio::time::Instant;

/// Cached credential value with its expiry.
///
/// Entries are immutable: a refresh replaces the whole entry, so a reader
/// never sees a value paired with another value's expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: Arc<str>,
    pub expires_at: Instant,
}

impl CacheEntry {
    pub fn new(value: Arc<str>, expires_at: Instant) -> Self {
        Self { value, expires_at }
    }

    #[inline]
    pub fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Result of a cache read: the value and whether its TTL is still running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLookup {
    pub value: Arc<str>,
    pub fresh: bool,
}

impl CacheLookup {
    pub fn is_stale(&self) -> bool {
        !self.fresh
    }
}
