use super::cache::CacheStore;
use super::reconciler::{ChangeReconciler, ReconcileStats};
use futures::future::{BoxFuture, FutureExt, Shared};
use keycache_application::ports::{RemoteKeyStore, SubscriptionHandle};
use keycache_domain::DomainError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::task::{AbortHandle, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

type InitFuture = Shared<BoxFuture<'static, Result<(), DomainError>>>;

/// Observable initialization phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitPhase {
    NotStarted,
    InProgress,
    Completed,
}

impl InitPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

enum InitState {
    NotStarted,
    InProgress {
        attempt: u64,
        future: InitFuture,
        abort: AbortHandle,
    },
    Completed,
}

/// The live subscription and the reconciler task draining it.
struct ActiveSubscription {
    handle: SubscriptionHandle,
    shutdown: CancellationToken,
    reconciler: JoinHandle<ReconcileStats>,
}

impl ActiveSubscription {
    fn is_live(&self) -> bool {
        self.handle.is_active() && !self.reconciler.is_finished()
    }

    async fn stop(self) -> Option<ReconcileStats> {
        self.handle.release();
        self.shutdown.cancel();
        match self.reconciler.await {
            Ok(stats) => Some(stats),
            Err(e) => {
                error!(error = %e, "Change reconciler task failed");
                None
            }
        }
    }
}

struct Inner {
    remote: Arc<dyn RemoteKeyStore>,
    cache: Arc<CacheStore>,
    reconciler: ChangeReconciler,
    ttl: Duration,
    change_buffer: usize,
    state: Mutex<InitState>,
    subscription: AsyncMutex<Option<ActiveSubscription>>,
    attempts: AtomicU64,
}

/// Runs the bulk fetch and the subscription setup at most once at a time.
///
/// State machine: `NotStarted → InProgress → Completed`. The first caller
/// starts an attempt; every caller arriving while it runs awaits the same
/// shared future and sees the same outcome. A failed attempt moves the state
/// back to `NotStarted` so the next call retries; there is no retry loop.
///
/// The attempt runs in its own task, so a caller dropping its future never
/// cancels the fetch other callers are waiting on. `reset` does cancel it.
pub struct SingleFlightInitializer {
    inner: Arc<Inner>,
}

impl SingleFlightInitializer {
    pub fn new(
        remote: Arc<dyn RemoteKeyStore>,
        cache: Arc<CacheStore>,
        ttl: Duration,
        change_buffer: usize,
    ) -> Self {
        let reconciler = ChangeReconciler::new(Arc::clone(&cache), ttl);
        Self {
            inner: Arc::new(Inner {
                remote,
                cache,
                reconciler,
                ttl,
                change_buffer: change_buffer.max(1),
                state: Mutex::new(InitState::NotStarted),
                subscription: AsyncMutex::new(None),
                attempts: AtomicU64::new(0),
            }),
        }
    }

    /// Wait until initialization has completed, starting it if needed.
    ///
    /// # Errors
    ///
    /// * `DomainError::InitializationFailed` - The bulk fetch or the
    ///   subscription setup of the attempt this caller joined failed
    pub async fn ensure_initialized(&self) -> Result<(), DomainError> {
        let attempt = {
            let mut state = self.inner.lock_state();
            match &*state {
                InitState::Completed => return Ok(()),
                InitState::InProgress { future, .. } => future.clone(),
                InitState::NotStarted => {
                    let attempt = self.inner.attempts.fetch_add(1, Ordering::Relaxed) + 1;
                    let (future, abort) = Inner::spawn_attempt(Arc::clone(&self.inner), attempt);
                    *state = InitState::InProgress {
                        attempt,
                        future: future.clone(),
                        abort,
                    };
                    future
                }
            }
        };

        attempt.await
    }

    pub fn phase(&self) -> InitPhase {
        match &*self.inner.lock_state() {
            InitState::NotStarted => InitPhase::NotStarted,
            InitState::InProgress { .. } => InitPhase::InProgress,
            InitState::Completed => InitPhase::Completed,
        }
    }

    /// Number of initialization attempts started so far.
    pub fn attempts(&self) -> u64 {
        self.inner.attempts.load(Ordering::Relaxed)
    }

    pub async fn subscription_active(&self) -> bool {
        self.inner
            .subscription
            .lock()
            .await
            .as_ref()
            .is_some_and(ActiveSubscription::is_live)
    }

    /// Release the subscription, stop the reconciler and forget the completed
    /// initialization. An attempt still in flight is aborted and cannot
    /// write to the cache or subscribe afterwards. The next
    /// `ensure_initialized` starts a new attempt.
    pub async fn reset(&self) -> Option<ReconcileStats> {
        let previous = std::mem::replace(&mut *self.inner.lock_state(), InitState::NotStarted);
        if let InitState::InProgress { attempt, abort, .. } = previous {
            abort.abort();
            info!(attempt, "In-flight initialization aborted by reset");
        }

        let active = self.inner.subscription.lock().await.take();
        match active {
            Some(active) => {
                let id = active.handle.id();
                let stats = active.stop().await;
                info!(subscription_id = id, "Change subscription released");
                stats
            }
            None => None,
        }
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, InitState> {
        // The guarded section never panics mid-update; a poisoned lock still
        // holds a consistent state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn spawn_attempt(inner: Arc<Self>, attempt: u64) -> (InitFuture, AbortHandle) {
        info!(attempt, "Starting key store initialization");

        let task = tokio::spawn({
            let inner = Arc::clone(&inner);
            async move {
                let outcome = inner.run(attempt).await;
                inner.finish(attempt, &outcome);
                outcome
            }
        });
        let abort = task.abort_handle();

        let future = async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    let outcome = Err(DomainError::InitializationFailed(format!(
                        "initialization task aborted: {e}"
                    )));
                    inner.finish(attempt, &outcome);
                    outcome
                }
            }
        }
        .boxed()
        .shared();

        (future, abort)
    }

    fn is_current(&self, attempt: u64) -> bool {
        matches!(&*self.lock_state(), InitState::InProgress { attempt: a, .. } if *a == attempt)
    }

    fn superseded(attempt: u64) -> DomainError {
        DomainError::InitializationFailed(format!("attempt {attempt} superseded by reset"))
    }

    /// Settle the state for `attempt`, unless a reset already replaced it.
    fn finish(&self, attempt: u64, outcome: &Result<(), DomainError>) {
        let mut state = self.lock_state();
        let current = matches!(&*state, InitState::InProgress { attempt: a, .. } if *a == attempt);
        if !current {
            debug!(attempt, "Initialization outcome superseded by reset");
            return;
        }

        match outcome {
            Ok(()) => {
                *state = InitState::Completed;
                info!(attempt, entries = self.cache.len(), "Key store initialization completed");
            }
            Err(e) => {
                *state = InitState::NotStarted;
                error!(attempt, error = %e, "Key store initialization failed, will retry on next call");
            }
        }
    }

    /// Bulk load then subscribe. Cache writes and the subscription happen
    /// under the subscription lock, and only while this attempt is still the
    /// current one; `reset` replaces the state before taking that lock.
    async fn run(&self, attempt: u64) -> Result<(), DomainError> {
        let documents = self.remote.fetch_all().await.map_err(|e| {
            DomainError::InitializationFailed(format!("bulk fetch failed: {e}"))
        })?;

        let mut slot = self.subscription.lock().await;
        if !self.is_current(attempt) {
            debug!(attempt, "Attempt replaced during bulk fetch, discarding documents");
            return Err(Self::superseded(attempt));
        }

        let mut loaded = 0usize;
        let mut rejected = 0usize;
        for document in documents {
            match document.validate() {
                Ok(()) => {
                    self.cache.put(&document.key, document.value, self.ttl);
                    loaded += 1;
                }
                Err(e) => {
                    rejected += 1;
                    warn!(key = %document.key, error = %e, "Skipping invalid document");
                }
            }
        }
        info!(loaded, rejected, "Bulk fetch loaded into cache");

        self.ensure_subscription(&mut *slot).await
    }

    async fn ensure_subscription(
        &self,
        slot: &mut Option<ActiveSubscription>,
    ) -> Result<(), DomainError> {
        if let Some(active) = slot.as_ref() {
            if active.is_live() {
                debug!(
                    subscription_id = active.handle.id(),
                    "Subscription already live, not registering another"
                );
                return Ok(());
            }
        }

        if let Some(previous) = slot.take() {
            let id = previous.handle.id();
            previous.stop().await;
            info!(subscription_id = id, "Released dead subscription before re-registering");
        }

        let (sink, events) = mpsc::channel(self.change_buffer);
        let handle = self.remote.subscribe(sink).await.map_err(|e| {
            DomainError::InitializationFailed(format!("subscription setup failed: {e}"))
        })?;

        let shutdown = CancellationToken::new();
        let reconciler = self.reconciler.clone().start(events, shutdown.clone());
        info!(subscription_id = handle.id(), "Change subscription registered");

        *slot = Some(ActiveSubscription {
            handle,
            shutdown,
            reconciler,
        });
        Ok(())
    }
}
