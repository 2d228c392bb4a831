use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Lifetime in seconds of a fetched or reconciled entry before it turns
    /// stale (default: 3600). Stale entries are kept and served as fallback.
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,

    /// Capacity of the channel between the subscription and the reconciler
    /// (default: 256). A full channel back-pressures the producer.
    #[serde(default = "default_change_buffer")]
    pub change_buffer: usize,
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: default_ttl_secs(),
            change_buffer: default_change_buffer(),
        }
    }
}

fn default_ttl_secs() -> u64 {
    3600
}

fn default_change_buffer() -> usize {
    256
}
