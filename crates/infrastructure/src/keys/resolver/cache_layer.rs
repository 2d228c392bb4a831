use super::super::cache::{CacheMetrics, CacheStore};
use super::super::initializer::SingleFlightInitializer;
use async_trait::async_trait;
use keycache_application::ports::{KeyResolver, RemoteKeyStore, Resolution, ResolutionOrigin};
use keycache_domain::{validate_key, DomainError, KeyDocument};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Cache-first resolver backed by a remote key store.
///
/// Resolution order for `resolve`:
///   1. Make sure the bulk load and subscription ran (or were attempted)
///   2. Fresh cache entry
///   3. Point fetch from the remote store, stored with the default TTL
///   4. Expired cache entry, with a warning
///
/// `resolve_cached` only ever reads the cache.
pub struct CachedKeyResolver {
    remote: Arc<dyn RemoteKeyStore>,
    cache: Arc<CacheStore>,
    initializer: Arc<SingleFlightInitializer>,
    cache_ttl: Duration,
}

impl CachedKeyResolver {
    pub fn new(
        remote: Arc<dyn RemoteKeyStore>,
        cache: Arc<CacheStore>,
        initializer: Arc<SingleFlightInitializer>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            remote,
            cache,
            initializer,
            cache_ttl,
        }
    }

    /// Drop one key, or every key when `key` is None. Returns how many
    /// entries were removed.
    pub fn clear_cache(&self, key: Option<&str>) -> usize {
        match key {
            Some(key) => usize::from(self.cache.remove(key)),
            None => self.cache.clear(),
        }
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    pub fn initializer(&self) -> &Arc<SingleFlightInitializer> {
        &self.initializer
    }

    /// Point fetch. A document without a usable value counts as absent.
    async fn fetch_valid(&self, key: &str) -> Result<String, DomainError> {
        let document = KeyDocument::new(key, self.remote.fetch_one(key).await?);
        if let Err(e) = document.validate() {
            warn!(key = %key, error = %e, "Ignoring unusable remote document");
            return Err(DomainError::KeyNotFound(key.to_string()));
        }
        Ok(document.value)
    }

    /// Serve whatever the cache still holds after a failed fetch.
    fn fall_back_to_cache(&self, key: &str, error: DomainError) -> Result<Resolution, DomainError> {
        // Read again: the reconciler may have refreshed the entry while the
        // fetch was in flight.
        match self.cache.peek(key) {
            Some(lookup) if lookup.fresh => Ok(Resolution::new(lookup.value, ResolutionOrigin::Cache)),
            Some(lookup) => {
                CacheMetrics::incr(&self.cache.metrics().stale_served);
                warn!(key = %key, error = %error, "Using expired cache entry");
                Ok(Resolution::new(lookup.value, ResolutionOrigin::StaleCache))
            }
            None => Err(match error {
                DomainError::KeyNotFound(_) => DomainError::KeyNotFound(key.to_string()),
                other => DomainError::Unreachable {
                    key: key.to_string(),
                    reason: other.to_string(),
                },
            }),
        }
    }
}

#[async_trait]
impl KeyResolver for CachedKeyResolver {
    #[instrument(skip(self))]
    async fn resolve(&self, key: &str) -> Result<Resolution, DomainError> {
        validate_key(key)?;

        if let Err(e) = self.initializer.ensure_initialized().await {
            warn!(error = %e, "Initialization unavailable, resolving by point fetch");
        }

        if let Some(lookup) = self.cache.get(key) {
            if lookup.fresh {
                debug!("Cache HIT");
                return Ok(Resolution::new(lookup.value, ResolutionOrigin::Cache));
            }
            debug!("Cache entry expired, refreshing");
        } else {
            debug!("Cache MISS");
        }

        match self.fetch_valid(key).await {
            Ok(value) => {
                let value: Arc<str> = Arc::from(value);
                self.cache.put(key, Arc::clone(&value), self.cache_ttl);
                Ok(Resolution::new(value, ResolutionOrigin::Remote))
            }
            Err(e) => self.fall_back_to_cache(key, e),
        }
    }

    fn resolve_cached(&self, key: &str) -> Option<Arc<str>> {
        self.cache.get(key).map(|lookup| lookup.value)
    }
}
