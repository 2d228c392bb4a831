// Key cache module

pub mod entry;
pub mod metrics;
pub mod storage;

pub use entry::{CacheEntry, CacheLookup};
pub use metrics::CacheMetrics;
pub use storage::CacheStore;
