//! Per-status and per-priority counts over the user's whole task set.
//!
//! Refreshing is best-effort: failures keep the previous snapshot and are
//! only logged. Responses carry the sequence number of the refresh that
//! requested them, and one issued before the last applied refresh is dropped,
//! so the snapshot never moves backward.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::models::StatsSnapshot;
use crate::remote::TaskService;
use crate::session::SessionManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied { seq: u64 },
    Stale { seq: u64, applied: u64 },
    Failed,
    /// No authenticated session, nothing was requested.
    Skipped,
}

#[derive(Clone)]
pub struct StatsAggregator {
    inner: Arc<StatsInner>,
}

struct StatsInner {
    service: Arc<dyn TaskService>,
    session: SessionManager,
    state: RwLock<AppliedStats>,
    next_seq: AtomicU64,
}

#[derive(Default)]
struct AppliedStats {
    snapshot: StatsSnapshot,
    seq: u64,
}

impl StatsAggregator {
    pub fn new(service: Arc<dyn TaskService>, session: SessionManager) -> Self {
        Self {
            inner: Arc::new(StatsInner {
                service,
                session,
                state: RwLock::new(AppliedStats::default()),
                next_seq: AtomicU64::new(0),
            }),
        }
    }

    pub async fn snapshot(&self) -> StatsSnapshot {
        self.inner.state.read().await.snapshot.clone()
    }

    pub async fn refresh(&self) -> RefreshOutcome {
        let Ok(token) = self.inner.session.require_token().await else {
            tracing::debug!(target: "taskdeck.stats", stage = "stats.refresh.skip");
            return RefreshOutcome::Skipped;
        };

        let seq = self.inner.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(target: "taskdeck.stats", stage = "stats.refresh.in", seq = seq);

        let snapshot = match self.inner.service.task_stats(&token).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::debug!(
                    target: "taskdeck.stats",
                    stage = "stats.refresh.failed",
                    seq = seq,
                    error = %err
                );
                return RefreshOutcome::Failed;
            }
        };

        let mut state = self.inner.state.write().await;
        if seq <= state.seq {
            let applied = state.seq;
            tracing::debug!(
                target: "taskdeck.stats",
                stage = "stats.refresh.stale",
                seq = seq,
                applied = applied
            );
            return RefreshOutcome::Stale { seq, applied };
        }
        state.seq = seq;
        state.snapshot = snapshot;
        tracing::debug!(
            target: "taskdeck.stats",
            stage = "stats.refresh.out",
            seq = seq,
            total = state.snapshot.total
        );
        RefreshOutcome::Applied { seq }
    }

    /// Empties the snapshot; refreshes already in flight are discarded.
    pub async fn reset(&self) {
        let mut state = self.inner.state.write().await;
        state.snapshot = StatsSnapshot::default();
        state.seq = self.inner.next_seq.load(Ordering::SeqCst);
    }
}
