use async_trait::async_trait;
use keycache_application::ports::{RemoteKeyStore, SubscriptionHandle};
use keycache_domain::{ChangeEvent, DomainError, KeyDocument};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::debug;

struct Subscriber {
    id: u64,
    sink: mpsc::Sender<ChangeEvent>,
    token: CancellationToken,
}

/// Key store held entirely in memory.
///
/// Writes through `upsert`/`delete` are pushed to every live subscriber in the
/// order they happen. Latency and outages can be injected, and every port
/// call is counted, which makes it the store of choice for tests and for
/// embedding a fixed document set.
pub struct InMemoryKeyStore {
    documents: RwLock<BTreeMap<String, String>>,
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
    next_subscription_id: AtomicU64,
    unreachable: AtomicBool,
    reject_subscriptions: AtomicBool,
    latency_ms: AtomicU64,
    fetch_all_calls: AtomicU64,
    fetch_one_calls: AtomicU64,
    subscribe_calls: AtomicU64,
}

impl InMemoryKeyStore {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(BTreeMap::new()),
            subscribers: Arc::new(Mutex::new(Vec::new())),
            next_subscription_id: AtomicU64::new(1),
            unreachable: AtomicBool::new(false),
            reject_subscriptions: AtomicBool::new(false),
            latency_ms: AtomicU64::new(0),
            fetch_all_calls: AtomicU64::new(0),
            fetch_one_calls: AtomicU64::new(0),
            subscribe_calls: AtomicU64::new(0),
        }
    }

    pub fn with_documents<K, V>(documents: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let documents = documents
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            documents: RwLock::new(documents),
            ..Self::new()
        }
    }

    /// Insert or replace a document and notify subscribers.
    pub async fn upsert(&self, key: &str, value: &str) {
        let mut subscribers = self.subscribers.lock().await;
        let previous = self
            .documents
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        let event = match previous {
            Some(_) => ChangeEvent::modified(key, value),
            None => ChangeEvent::added(key, value),
        };
        Self::broadcast(&mut subscribers, event).await;
    }

    /// Delete a document and notify subscribers. Returns false if absent.
    pub async fn delete(&self, key: &str) -> bool {
        let mut subscribers = self.subscribers.lock().await;
        let existed = self.documents.write().await.remove(key).is_some();
        if existed {
            Self::broadcast(&mut subscribers, ChangeEvent::removed(key)).await;
        }
        existed
    }

    /// Push a raw event to subscribers without touching the documents.
    pub async fn emit(&self, event: ChangeEvent) {
        let mut subscribers = self.subscribers.lock().await;
        Self::broadcast(&mut subscribers, event).await;
    }

    /// Make every fetch fail as if the network were down.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::Relaxed);
    }

    pub fn set_reject_subscriptions(&self, reject: bool) {
        self.reject_subscriptions.store(reject, Ordering::Relaxed);
    }

    /// Delay applied to every fetch.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn fetch_all_calls(&self) -> u64 {
        self.fetch_all_calls.load(Ordering::Relaxed)
    }

    pub fn fetch_one_calls(&self) -> u64 {
        self.fetch_one_calls.load(Ordering::Relaxed)
    }

    pub fn subscribe_calls(&self) -> u64 {
        self.subscribe_calls.load(Ordering::Relaxed)
    }

    pub async fn active_subscriptions(&self) -> usize {
        self.subscribers
            .lock()
            .await
            .iter()
            .filter(|s| !s.token.is_cancelled())
            .count()
    }

    async fn broadcast(subscribers: &mut Vec<Subscriber>, event: ChangeEvent) {
        subscribers.retain(|s| !s.token.is_cancelled());
        for subscriber in subscribers.iter() {
            if subscriber.sink.send(event.clone()).await.is_err() {
                debug!(subscription_id = subscriber.id, "Subscriber went away");
                subscriber.token.cancel();
            }
        }
        subscribers.retain(|s| !s.token.is_cancelled());
    }

    async fn simulate_network(&self) -> Result<(), DomainError> {
        let latency = self.latency_ms.load(Ordering::Relaxed);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.unreachable.load(Ordering::Relaxed) {
            return Err(DomainError::StoreUnavailable(
                "in-memory store marked unreachable".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for InMemoryKeyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteKeyStore for InMemoryKeyStore {
    async fn fetch_all(&self) -> Result<Vec<KeyDocument>, DomainError> {
        self.fetch_all_calls.fetch_add(1, Ordering::Relaxed);
        self.simulate_network().await?;

        Ok(self
            .documents
            .read()
            .await
            .iter()
            .map(|(k, v)| KeyDocument::new(k.as_str(), v.as_str()))
            .collect())
    }

    async fn fetch_one(&self, key: &str) -> Result<String, DomainError> {
        self.fetch_one_calls.fetch_add(1, Ordering::Relaxed);
        self.simulate_network().await?;

        self.documents
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| DomainError::KeyNotFound(key.to_string()))
    }

    async fn subscribe(
        &self,
        sink: mpsc::Sender<ChangeEvent>,
    ) -> Result<SubscriptionHandle, DomainError> {
        self.subscribe_calls.fetch_add(1, Ordering::Relaxed);
        if self.reject_subscriptions.load(Ordering::Relaxed) {
            return Err(DomainError::StoreUnavailable(
                "subscriptions rejected".to_string(),
            ));
        }

        let id = self.next_subscription_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        self.subscribers.lock().await.push(Subscriber {
            id,
            sink,
            token: token.clone(),
        });

        // Drop the sender as soon as the handle is released so the consumer
        // sees the channel close.
        let subscribers = Arc::clone(&self.subscribers);
        let released = token.clone();
        tokio::spawn(async move {
            released.cancelled().await;
            subscribers.lock().await.retain(|s| s.id != id);
            debug!(subscription_id = id, "Subscription released");
        });

        Ok(SubscriptionHandle::new(id, token))
    }
}
