#![allow(dead_code)]

use async_trait::async_trait;
use keycache_application::ports::{RemoteKeyStore, SubscriptionHandle};
use keycache_domain::{ChangeEvent, DomainError, KeyDocument};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tokio_util::sync::CancellationToken;

// ============================================================================
// Mock RemoteKeyStore
// ============================================================================

/// Remote store double with call counters, failure toggles and a gate that
/// holds `fetch_all` until the test opens it.
pub struct MockRemoteKeyStore {
    documents: Arc<RwLock<HashMap<String, String>>>,
    fetch_all_calls: Arc<AtomicU64>,
    fetch_one_calls: Arc<AtomicU64>,
    subscribe_calls: Arc<AtomicU64>,
    fail_fetch_all: Arc<AtomicBool>,
    fail_fetch_one: Arc<AtomicBool>,
    fail_subscribe: Arc<AtomicBool>,
    gate: watch::Sender<bool>,
    sinks: Arc<Mutex<Vec<mpsc::Sender<ChangeEvent>>>>,
    tokens: Arc<Mutex<Vec<CancellationToken>>>,
}

impl MockRemoteKeyStore {
    pub fn new() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            documents: Arc::new(RwLock::new(HashMap::new())),
            fetch_all_calls: Arc::new(AtomicU64::new(0)),
            fetch_one_calls: Arc::new(AtomicU64::new(0)),
            subscribe_calls: Arc::new(AtomicU64::new(0)),
            fail_fetch_all: Arc::new(AtomicBool::new(false)),
            fail_fetch_one: Arc::new(AtomicBool::new(false)),
            fail_subscribe: Arc::new(AtomicBool::new(false)),
            gate,
            sinks: Arc::new(Mutex::new(Vec::new())),
            tokens: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn with_documents(entries: Vec<(&str, &str)>) -> Self {
        let store = Self::new();
        for (key, value) in entries {
            store.set_document(key, value).await;
        }
        store
    }

    pub async fn set_document(&self, key: &str, value: &str) {
        self.documents
            .write()
            .await
            .insert(key.to_string(), value.to_string());
    }

    pub async fn remove_document(&self, key: &str) {
        self.documents.write().await.remove(key);
    }

    /// Push an event to every registered sink.
    pub async fn push(&self, event: ChangeEvent) {
        for sink in self.sinks.lock().await.iter() {
            let _ = sink.send(event.clone()).await;
        }
    }

    /// Block `fetch_all` until `open_gate` is called.
    pub fn close_gate(&self) {
        self.gate.send_replace(false);
    }

    pub fn open_gate(&self) {
        self.gate.send_replace(true);
    }

    pub fn set_fail_fetch_all(&self, fail: bool) {
        self.fail_fetch_all.store(fail, Ordering::Relaxed);
    }

    pub fn set_fail_fetch_one(&self, fail: bool) {
        self.fail_fetch_one.store(fail, Ordering::Relaxed);
    }

    pub fn set_fail_subscribe(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::Relaxed);
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

    /// Subscriptions registered and not yet released.
    pub async fn live_subscriptions(&self) -> usize {
        self.tokens
            .lock()
            .await
            .iter()
            .filter(|t| !t.is_cancelled())
            .count()
    }

    /// End every subscription from the store side.
    pub async fn drop_subscriptions(&self) {
        for token in self.tokens.lock().await.iter() {
            token.cancel();
        }
        self.sinks.lock().await.clear();
    }

    /// Wait until `fetch_all` has been entered `n` times.
    pub async fn wait_for_fetch_all_calls(&self, n: u64) {
        while self.fetch_all_calls() < n {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl RemoteKeyStore for MockRemoteKeyStore {
    async fn fetch_all(&self) -> Result<Vec<KeyDocument>, DomainError> {
        self.fetch_all_calls.fetch_add(1, Ordering::SeqCst);

        let mut gate = self.gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;

        if self.fail_fetch_all.load(Ordering::Relaxed) {
            return Err(DomainError::StoreUnavailable("bulk fetch failed".to_string()));
        }
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
        if self.fail_fetch_one.load(Ordering::Relaxed) {
            return Err(DomainError::StoreUnavailable("network down".to_string()));
        }
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
        let id = self.subscribe_calls.fetch_add(1, Ordering::Relaxed) + 1;
        if self.fail_subscribe.load(Ordering::Relaxed) {
            return Err(DomainError::StoreUnavailable("subscribe failed".to_string()));
        }
        let token = CancellationToken::new();
        self.sinks.lock().await.push(sink);
        self.tokens.lock().await.push(token.clone());
        Ok(SubscriptionHandle::new(id, token))
    }
}
