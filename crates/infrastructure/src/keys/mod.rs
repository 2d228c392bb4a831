pub mod cache;
pub mod initializer;
pub mod reconciler;
pub mod resolver;
pub mod service;

pub use cache::{CacheLookup, CacheMetrics, CacheStore};
pub use initializer::{InitPhase, SingleFlightInitializer};
pub use reconciler::{ChangeReconciler, ReconcileStats};
pub use resolver::{CachedKeyResolver, FallbackLayer};
pub use service::{KeyService, ServiceStats};
