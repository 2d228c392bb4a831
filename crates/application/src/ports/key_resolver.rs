use async_trait::async_trait;
use keycache_domain::DomainError;
use std::fmt;
use std::sync::Arc;

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionOrigin {
    /// Fresh cache entry
    Cache,
    /// Point fetch from the remote store
    Remote,
    /// Expired cache entry served because the remote fetch failed
    StaleCache,
}

impl ResolutionOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Remote => "remote",
            Self::StaleCache => "stale_cache",
        }
    }
}

impl fmt::Display for ResolutionOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub value: Arc<str>,
    pub origin: ResolutionOrigin,
}

impl Resolution {
    pub fn new(value: Arc<str>, origin: ResolutionOrigin) -> Self {
        Self { value, origin }
    }

    /// True when the value is a degraded answer from an expired entry.
    pub fn is_stale(&self) -> bool {
        self.origin == ResolutionOrigin::StaleCache
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Caller-facing key resolution contract.
#[async_trait]
pub trait KeyResolver: Send + Sync {
    /// Resolve a key, reaching the remote store when the cache cannot answer.
    async fn resolve(&self, key: &str) -> Result<Resolution, DomainError>;

    /// Answer from the cache only, fresh or stale. Never blocks, never errors.
    fn resolve_cached(&self, key: &str) -> Option<Arc<str>>;
}
