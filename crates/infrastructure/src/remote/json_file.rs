use async_trait::async_trait;
use keycache_application::ports::{RemoteKeyStore, SubscriptionHandle};
use keycache_domain::{ChangeEvent, DomainError, KeyDocument};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Body of one document in the collection file.
#[derive(Debug, Deserialize)]
struct DocumentBody {
    #[serde(default)]
    value: Option<String>,
}

type Snapshot = BTreeMap<String, String>;

/// Document collection stored as a JSON object on disk:
///
/// ```json
/// { "GROQ_URL": { "value": "https://api.example.com" } }
/// ```
///
/// Each top-level member is a document whose id is the key. Documents without
/// a non-empty `value` are skipped. Subscriptions poll the file and push the
/// difference between consecutive reads as change events. The first diff is
/// taken against the snapshot the preceding `fetch_all` returned, so edits
/// landing between the bulk load and `subscribe` are still reported.
pub struct JsonFileKeyStore {
    path: PathBuf,
    poll_interval: Duration,
    next_subscription_id: AtomicU64,
    last_bulk: Mutex<Option<Snapshot>>,
}

impl JsonFileKeyStore {
    pub fn new(path: impl Into<PathBuf>, poll_interval: Duration) -> Self {
        Self {
            path: path.into(),
            poll_interval,
            next_subscription_id: AtomicU64::new(1),
            last_bulk: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_snapshot(path: &Path) -> Result<Snapshot, DomainError> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            DomainError::StoreUnavailable(format!("cannot read {}: {e}", path.display()))
        })?;
        parse_snapshot(&raw).map_err(|e| {
            DomainError::StoreUnavailable(format!("malformed {}: {e}", path.display()))
        })
    }
}

/// Parse the collection, keeping only documents with a usable value.
fn parse_snapshot(raw: &str) -> Result<Snapshot, serde_json::Error> {
    let documents: BTreeMap<String, DocumentBody> = serde_json::from_str(raw)?;
    let mut snapshot = Snapshot::new();
    for (key, body) in documents {
        let document = KeyDocument::new(key, body.value.unwrap_or_default());
        match document.validate() {
            Ok(()) => {
                snapshot.insert(document.key, document.value);
            }
            Err(e) => warn!(key = %document.key, error = %e, "Skipping invalid document"),
        }
    }
    Ok(snapshot)
}

/// Change events turning `previous` into `current`.
fn diff(previous: &Snapshot, current: &Snapshot) -> Vec<ChangeEvent> {
    let mut events = Vec::new();
    for (key, value) in current {
        match previous.get(key) {
            None => events.push(ChangeEvent::added(key.as_str(), value.as_str())),
            Some(old) if old != value => {
                events.push(ChangeEvent::modified(key.as_str(), value.as_str()))
            }
            Some(_) => {}
        }
    }
    for key in previous.keys() {
        if !current.contains_key(key) {
            events.push(ChangeEvent::removed(key.as_str()));
        }
    }
    events
}

#[async_trait]
impl RemoteKeyStore for JsonFileKeyStore {
    async fn fetch_all(&self) -> Result<Vec<KeyDocument>, DomainError> {
        let snapshot = Self::read_snapshot(&self.path).await?;
        *self.last_bulk.lock().unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());
        Ok(snapshot
            .into_iter()
            .map(|(key, value)| KeyDocument { key, value })
            .collect())
    }

    async fn fetch_one(&self, key: &str) -> Result<String, DomainError> {
        Self::read_snapshot(&self.path)
            .await?
            .remove(key)
            .ok_or_else(|| DomainError::KeyNotFound(key.to_string()))
    }

    async fn subscribe(
        &self,
        sink: mpsc::Sender<ChangeEvent>,
    ) -> Result<SubscriptionHandle, DomainError> {
        let bulk = self.last_bulk.lock().unwrap_or_else(PoisonError::into_inner).take();
        let baseline = match bulk {
            Some(snapshot) => snapshot,
            None => Self::read_snapshot(&self.path).await?,
        };
        let id = self.next_subscription_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();

        let path = self.path.clone();
        let poll_interval = self.poll_interval;
        let shutdown = token.clone();
        tokio::spawn(async move {
            info!(
                subscription_id = id,
                path = %path.display(),
                interval_ms = poll_interval.as_millis() as u64,
                "Polling document file for changes"
            );

            let mut previous = baseline;
            let mut interval = tokio::time::interval(poll_interval);
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        debug!(subscription_id = id, "Document file subscription released");
                        break;
                    }
                    _ = interval.tick() => {
                        let current = match Self::read_snapshot(&path).await {
                            Ok(current) => current,
                            Err(e) => {
                                warn!(subscription_id = id, error = %e, "Document file poll failed");
                                continue;
                            }
                        };
                        for event in diff(&previous, &current) {
                            if sink.send(event).await.is_err() {
                                debug!(subscription_id = id, "Change consumer went away");
                                shutdown.cancel();
                                return;
                            }
                        }
                        previous = current;
                    }
                }
            }
        });

        Ok(SubscriptionHandle::new(id, token))
    }
}
