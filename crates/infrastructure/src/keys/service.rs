use super::cache::CacheStore;
use super::initializer::{InitPhase, SingleFlightInitializer};
use super::reconciler::ReconcileStats;
use super::resolver::{CachedKeyResolver, FallbackLayer};
use keycache_application::ports::{KeyResolver, RemoteKeyStore, Resolution, StaticKeySource};
use keycache_domain::config::CacheConfig;
use keycache_domain::{Config, DomainError};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

/// Point-in-time view of the service.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceStats {
    pub entries: usize,
    pub stale_entries: usize,
    pub hits: u64,
    pub stale_hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub removals: u64,
    pub stale_served: u64,
    pub hit_rate: f64,
    pub init_phase: InitPhase,
    pub init_attempts: u64,
    pub subscription_active: bool,
    pub static_fallback_enabled: bool,
}

/// Owned resolution service: cache, initializer, resolver and fallback layer.
///
/// Construct one per process (or per test) and share it by `Arc`.
/// `start` warms the cache; `teardown` releases the subscription, stops the
/// reconciler and discards every entry.
pub struct KeyService {
    cache: Arc<CacheStore>,
    initializer: Arc<SingleFlightInitializer>,
    resolver: Arc<CachedKeyResolver>,
    fallback: FallbackLayer,
}

impl KeyService {
    pub fn new(
        remote: Arc<dyn RemoteKeyStore>,
        static_source: Arc<dyn StaticKeySource>,
        cache_config: &CacheConfig,
        static_fallback: bool,
    ) -> Self {
        let cache = Arc::new(CacheStore::new());
        let initializer = Arc::new(SingleFlightInitializer::new(
            Arc::clone(&remote),
            Arc::clone(&cache),
            cache_config.default_ttl(),
            cache_config.change_buffer,
        ));
        let resolver = Arc::new(CachedKeyResolver::new(
            remote,
            Arc::clone(&cache),
            Arc::clone(&initializer),
            cache_config.default_ttl(),
        ));
        let fallback = FallbackLayer::new(
            Arc::clone(&resolver) as Arc<dyn KeyResolver>,
            static_source,
            static_fallback,
        );

        info!(
            default_ttl_secs = cache_config.default_ttl_secs,
            change_buffer = cache_config.change_buffer,
            static_fallback,
            "Key service created"
        );

        Self {
            cache,
            initializer,
            resolver,
            fallback,
        }
    }

    pub fn from_config(
        config: &Config,
        remote: Arc<dyn RemoteKeyStore>,
        static_source: Arc<dyn StaticKeySource>,
    ) -> Self {
        Self::new(remote, static_source, &config.cache, config.fallback.enabled)
    }

    /// Trigger initialization eagerly. Failure is logged and returned; the
    /// service stays usable and retries on the next `resolve`.
    pub async fn start(&self) -> Result<(), DomainError> {
        let result = self.initializer.ensure_initialized().await;
        if let Err(e) = &result {
            warn!(error = %e, "Key service started without a warm cache");
        }
        result
    }

    pub async fn resolve(&self, key: &str) -> Result<Resolution, DomainError> {
        self.resolver.resolve(key).await
    }

    pub fn resolve_cached(&self, key: &str) -> Option<Arc<str>> {
        self.resolver.resolve_cached(key)
    }

    pub async fn get(&self, key: &str) -> Option<Arc<str>> {
        self.fallback.get(key).await
    }

    pub fn get_cached(&self, key: &str) -> Option<Arc<str>> {
        self.fallback.get_cached(key)
    }

    pub fn clear_cache(&self, key: Option<&str>) -> usize {
        self.resolver.clear_cache(key)
    }

    pub fn enable_static_fallback(&self) {
        self.fallback.enable_static_fallback();
    }

    pub fn disable_static_fallback(&self) {
        self.fallback.disable_static_fallback();
    }

    pub fn resolver(&self) -> Arc<CachedKeyResolver> {
        Arc::clone(&self.resolver)
    }

    pub fn fallback(&self) -> &FallbackLayer {
        &self.fallback
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    pub fn initializer(&self) -> &Arc<SingleFlightInitializer> {
        &self.initializer
    }

    pub async fn stats(&self) -> ServiceStats {
        let metrics = self.cache.metrics();
        ServiceStats {
            entries: self.cache.len(),
            stale_entries: self.cache.stale_count(),
            hits: metrics.hits.load(Ordering::Relaxed),
            stale_hits: metrics.stale_hits.load(Ordering::Relaxed),
            misses: metrics.misses.load(Ordering::Relaxed),
            inserts: metrics.inserts.load(Ordering::Relaxed),
            removals: metrics.removals.load(Ordering::Relaxed),
            stale_served: metrics.stale_served.load(Ordering::Relaxed),
            hit_rate: metrics.hit_rate(),
            init_phase: self.initializer.phase(),
            init_attempts: self.initializer.attempts(),
            subscription_active: self.initializer.subscription_active().await,
            static_fallback_enabled: self.fallback.is_static_fallback_enabled(),
        }
    }

    /// Release the subscription, stop reconciliation and drop all entries.
    pub async fn teardown(&self) -> Option<ReconcileStats> {
        let stats = self.initializer.reset().await;
        let dropped = self.cache.clear();
        info!(dropped, "Key service torn down");
        stats
    }
}
