use keycache_application::ports::{RemoteKeyStore, StaticKeySource};
use keycache_domain::Config;
use keycache_infrastructure::keys::KeyService;
use keycache_infrastructure::remote::{InMemoryKeyStore, JsonFileKeyStore};
use keycache_infrastructure::static_source::{EnvKeySource, LayeredKeySource, MapKeySource};
use std::sync::Arc;
use tracing::{info, warn};

/// Remote store selected by `[remote]`: the JSON document file when a path
/// is set, an empty in-memory store otherwise.
pub fn remote_store(config: &Config) -> Arc<dyn RemoteKeyStore> {
    match &config.remote.documents_path {
        Some(path) => {
            info!(path = %path, "Using JSON document store");
            Arc::new(JsonFileKeyStore::new(path, config.remote.poll_interval()))
        }
        None => {
            warn!("No documents path configured, using an empty in-memory store");
            Arc::new(InMemoryKeyStore::new())
        }
    }
}

/// `[fallback.values]` first, then the (optionally prefixed) environment.
pub fn static_source(config: &Config) -> Arc<dyn StaticKeySource> {
    let values = MapKeySource::new(config.fallback.values.clone());
    let env = match &config.fallback.env_prefix {
        Some(prefix) => EnvKeySource::with_prefix(prefix.as_str()),
        None => EnvKeySource::new(),
    };
    Arc::new(
        LayeredKeySource::new()
            .with_source(Arc::new(values))
            .with_source(Arc::new(env)),
    )
}

pub fn build_service(config: &Config) -> Arc<KeyService> {
    Arc::new(KeyService::from_config(
        config,
        remote_store(config),
        static_source(config),
    ))
}
