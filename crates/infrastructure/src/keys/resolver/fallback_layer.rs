use keycache_application::ports::{KeyResolver, StaticKeySource};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Second resolution strategy behind a [`KeyResolver`].
///
/// The inner resolver always goes first, so a stale remote-sourced value beats
/// a static default. The static source is consulted only when the inner chain
/// produced nothing and the fallback is enabled. Nothing is cached here.
pub struct FallbackLayer {
    inner: Arc<dyn KeyResolver>,
    static_source: Arc<dyn StaticKeySource>,
    static_enabled: AtomicBool,
}

impl FallbackLayer {
    pub fn new(
        inner: Arc<dyn KeyResolver>,
        static_source: Arc<dyn StaticKeySource>,
        static_enabled: bool,
    ) -> Self {
        Self {
            inner,
            static_source,
            static_enabled: AtomicBool::new(static_enabled),
        }
    }

    /// Resolve through the inner chain, then the static source.
    pub async fn get(&self, key: &str) -> Option<Arc<str>> {
        match self.inner.resolve(key).await {
            Ok(resolution) => Some(resolution.value),
            Err(e) => {
                debug!(key = %key, error = %e, "Resolver yielded nothing");
                self.lookup_static(key)
            }
        }
    }

    /// Cache-only variant of [`get`](Self::get); never suspends.
    pub fn get_cached(&self, key: &str) -> Option<Arc<str>> {
        self.inner
            .resolve_cached(key)
            .or_else(|| self.lookup_static(key))
    }

    pub fn enable_static_fallback(&self) {
        self.static_enabled.store(true, Ordering::Release);
        info!("Static fallback enabled");
    }

    /// Force remote-only behavior.
    pub fn disable_static_fallback(&self) {
        self.static_enabled.store(false, Ordering::Release);
        info!("Static fallback disabled");
    }

    pub fn is_static_fallback_enabled(&self) -> bool {
        self.static_enabled.load(Ordering::Acquire)
    }

    fn lookup_static(&self, key: &str) -> Option<Arc<str>> {
        if !self.is_static_fallback_enabled() {
            return None;
        }
        let value = self.static_source.lookup(key).filter(|v| !v.is_empty())?;
        debug!(key = %key, "Resolved from static fallback");
        Some(Arc::from(value))
    }
}
