use async_trait::async_trait;
use keycache_domain::{ChangeEvent, DomainError, KeyDocument};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Registration of a change subscription with a [`RemoteKeyStore`].
///
/// The store keeps a clone of the token and stops producing events once it is
/// cancelled. Dropping the handle releases the registration, so a handle can
/// never leak a live subscription.
#[derive(Debug)]
pub struct SubscriptionHandle {
    id: u64,
    token: CancellationToken,
}

impl SubscriptionHandle {
    pub fn new(id: u64, token: CancellationToken) -> Self {
        Self { id, token }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// False once released by the holder or ended by the store.
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }

    pub fn release(&self) {
        self.token.cancel();
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Keyed document collection holding credentials.
///
/// Every document is exposed as a [`KeyDocument`]; adapters reject documents
/// without a usable `value` at this boundary.
#[async_trait]
pub trait RemoteKeyStore: Send + Sync {
    /// One-shot fetch of every document in the collection.
    async fn fetch_all(&self) -> Result<Vec<KeyDocument>, DomainError>;

    /// One-shot fetch of a single document.
    ///
    /// # Errors
    ///
    /// * `DomainError::KeyNotFound` - The collection has no such document
    /// * `DomainError::StoreUnavailable` - The store could not be reached
    async fn fetch_one(&self, key: &str) -> Result<String, DomainError>;

    /// Register for incremental changes.
    ///
    /// Events are pushed into `sink` in the order the store observes them. The
    /// store drops `sink` when the returned handle is released, which closes
    /// the channel for the consumer.
    async fn subscribe(
        &self,
        sink: mpsc::Sender<ChangeEvent>,
    ) -> Result<SubscriptionHandle, DomainError>;
}
