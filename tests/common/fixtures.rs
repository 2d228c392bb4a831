use keycache_domain::config::CacheConfig;
use keycache_infrastructure::keys::KeyService;
use keycache_infrastructure::remote::InMemoryKeyStore;
use keycache_infrastructure::static_source::MapKeySource;
use std::sync::Arc;
use std::time::Duration;

/// Common test keys
pub struct TestKeys;

impl TestKeys {
    pub fn groq_url() -> &'static str {
        "GROQ_URL"
    }

    pub fn api_token() -> &'static str {
        "API_TOKEN"
    }

    pub fn feature_flag() -> &'static str {
        "FEATURE_FLAG"
    }

    pub fn nonexistent() -> &'static str {
        "NOT_A_KEY"
    }

    /// Documents the remote store starts with.
    pub fn seed() -> Vec<(&'static str, &'static str)> {
        vec![
            (Self::groq_url(), "https://api.groq.example/v1"),
            (Self::api_token(), "tok-123"),
        ]
    }
}

/// Builds a `KeyService` over an `InMemoryKeyStore`.
pub struct TestServiceBuilder {
    documents: Vec<(String, String)>,
    statics: Vec<(String, String)>,
    ttl: Duration,
    static_fallback: bool,
}

impl TestServiceBuilder {
    pub fn new() -> Self {
        Self {
            documents: TestKeys::seed()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            statics: Vec::new(),
            ttl: Duration::from_secs(3600),
            static_fallback: true,
        }
    }

    pub fn empty() -> Self {
        Self {
            documents: Vec::new(),
            ..Self::new()
        }
    }

    pub fn with_document(mut self, key: &str, value: &str) -> Self {
        self.documents.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_static(mut self, key: &str, value: &str) -> Self {
        self.statics.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_static_fallback(mut self, enabled: bool) -> Self {
        self.static_fallback = enabled;
        self
    }

    pub fn build(self) -> (Arc<InMemoryKeyStore>, KeyService) {
        let store = Arc::new(InMemoryKeyStore::with_documents(self.documents));
        let statics: MapKeySource = self.statics.into_iter().collect();
        let config = CacheConfig {
            default_ttl_secs: self.ttl.as_secs(),
            ..CacheConfig::default()
        };
        let service = KeyService::new(
            store.clone(),
            Arc::new(statics),
            &config,
            self.static_fallback,
        );
        (store, service)
    }
}

impl Default for TestServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Poll `condition` until it holds or five seconds pass.
pub async fn eventually<F: Fn() -> bool>(condition: F) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
