use super::cache::CacheStore;
use keycache_domain::{ChangeEvent, ChangeKind, DomainError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Counters returned when a reconciler task stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub upserts: u64,
    pub removals: u64,
    pub rejected: u64,
}

/// Applies subscription change events to the cache.
///
/// A single consumer task drains the channel, so events are applied in
/// arrival order and the last write for a key wins. A bad event is logged and
/// skipped; it never stops the stream and never reaches a resolver caller.
///
/// The task ends when the producer drops its sender (subscription released)
/// or when the shutdown token is cancelled.
#[derive(Clone)]
pub struct ChangeReconciler {
    cache: Arc<CacheStore>,
    ttl: Duration,
}

impl ChangeReconciler {
    pub fn new(cache: Arc<CacheStore>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    /// Apply one event. Additions and modifications refresh the entry with the
    /// default TTL; removals drop it.
    pub fn apply(&self, event: &ChangeEvent) -> Result<ChangeKind, DomainError> {
        event.validate()?;

        match event {
            ChangeEvent::Added { key, value } | ChangeEvent::Modified { key, value } => {
                self.cache.put(key, value.as_str(), self.ttl);
            }
            ChangeEvent::Removed { key } => {
                self.cache.remove(key);
            }
        }

        Ok(event.kind())
    }

    /// Spawn the consumer task.
    pub fn start(
        self,
        mut events: mpsc::Receiver<ChangeEvent>,
        shutdown: CancellationToken,
    ) -> JoinHandle<ReconcileStats> {
        tokio::spawn(async move {
            info!(ttl_secs = self.ttl.as_secs(), "Change reconciler started");
            let mut stats = ReconcileStats::default();

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        info!("Change reconciler: shutting down");
                        break;
                    }
                    event = events.recv() => match event {
                        Some(event) => self.apply_logged(&event, &mut stats),
                        None => {
                            info!("Change stream closed");
                            break;
                        }
                    }
                }
            }

            info!(
                upserts = stats.upserts,
                removals = stats.removals,
                rejected = stats.rejected,
                "Change reconciler stopped"
            );
            stats
        })
    }

    fn apply_logged(&self, event: &ChangeEvent, stats: &mut ReconcileStats) {
        match self.apply(event) {
            Ok(ChangeKind::Removed) => {
                stats.removals += 1;
                debug!(key = %event.key(), "Change applied: removed");
            }
            Ok(kind) => {
                stats.upserts += 1;
                debug!(key = %event.key(), kind = %kind, "Change applied");
            }
            Err(e) => {
                stats.rejected += 1;
                warn!(
                    key = %event.key(),
                    kind = %event.kind(),
                    error = %e,
                    "Rejected change event"
                );
            }
        }
    }
}
