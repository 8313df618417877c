//! Task cache controller.
//!
//! Owns the cached task sequence and the query that produced it. Every
//! change is confirm-then-apply: the cache is only touched after the remote
//! service acknowledged the request, and it always holds the response of the
//! latest-issued reload that has arrived so far.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, RwLock};

use super::debounce::Debouncer;
use super::locks::KeyedLocks;
use super::types::{CacheEvent, DeleteOutcome, ReloadOutcome};
use crate::confirm::ConfirmPrompt;
use crate::error::ServiceError;
use crate::models::{Task, TaskDraft, TaskPatch, TaskPriority, TaskStatus};
use crate::notify::{Notice, Notifier};
use crate::query::{QueryState, SortField, SortOrder};
use crate::remote::TaskService;
use crate::session::SessionManager;
use crate::stats::StatsAggregator;
use crate::validation;

pub const DELETE_CONFIRMATION: &str = "Are you sure you want to delete this task?";

#[derive(Clone)]
pub struct TaskCacheController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    service: Arc<dyn TaskService>,
    session: SessionManager,
    stats: StatsAggregator,
    confirm: Arc<dyn ConfirmPrompt>,
    notifier: Arc<dyn Notifier>,
    query: RwLock<QueryState>,
    cache: RwLock<CacheState>,
    /// Last sequence number handed to a reload.
    next_seq: AtomicU64,
    search: Debouncer,
    locks: KeyedLocks,
    event_tx: broadcast::Sender<CacheEvent>,
}

#[derive(Default)]
struct CacheState {
    tasks: Vec<Task>,
    /// Sequence number of the reload the cache currently mirrors.
    applied_seq: u64,
    /// Bumped by `clear`; a mutation dispatched under an older generation
    /// must not touch the cache.
    generation: u64,
}

struct Messages {
    success: &'static str,
    failure: &'static str,
}

const UPDATE: Messages = Messages {
    success: "Task updated successfully",
    failure: "Failed to update task",
};

const STATUS_CHANGE: Messages = Messages {
    success: "Task status updated",
    failure: "Failed to update task status",
};

impl TaskCacheController {
    pub fn new(
        service: Arc<dyn TaskService>,
        session: SessionManager,
        stats: StatsAggregator,
        confirm: Arc<dyn ConfirmPrompt>,
        notifier: Arc<dyn Notifier>,
        search_debounce: Duration,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            inner: Arc::new(ControllerInner {
                service,
                session,
                stats,
                confirm,
                notifier,
                query: RwLock::new(QueryState::default()),
                cache: RwLock::new(CacheState::default()),
                next_seq: AtomicU64::new(0),
                search: Debouncer::new(search_debounce),
                locks: KeyedLocks::new(),
                event_tx,
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.inner.event_tx.subscribe()
    }

    fn emit(&self, event: CacheEvent) {
        let _ = self.inner.event_tx.send(event);
    }

    pub async fn tasks(&self) -> Vec<Task> {
        self.inner.cache.read().await.tasks.clone()
    }

    pub async fn task(&self, id: &str) -> Option<Task> {
        self.inner
            .cache
            .read()
            .await
            .tasks
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    pub async fn query(&self) -> QueryState {
        self.inner.query.read().await.clone()
    }

    pub async fn applied_seq(&self) -> u64 {
        self.inner.cache.read().await.applied_seq
    }

    pub fn search_pending(&self) -> bool {
        self.inner.search.is_pending()
    }

    fn fail(&self, err: ServiceError, fallback: &str) -> ServiceError {
        tracing::warn!(
            target: "taskdeck.tasks",
            stage = "tasks.failed",
            code = err.code().as_u16(),
            error = %err
        );
        self.inner.notifier.notify(Notice::error(err.reason_or(fallback)));
        err
    }

    async fn guard(&self, fallback: &str) -> Result<String, ServiceError> {
        self.inner
            .session
            .require_token()
            .await
            .map_err(|err| self.fail(err, fallback))
    }

    async fn generation(&self) -> u64 {
        self.inner.cache.read().await.generation
    }

    /// The cache was cleared while the request was in flight.
    fn superseded(&self, id: &str, fallback: &str) -> ServiceError {
        tracing::debug!(target: "taskdeck.tasks", stage = "tasks.superseded", task_id = %id);
        self.fail(ServiceError::Unauthenticated, fallback)
    }

    /// Fetches the task list for the current query.
    ///
    /// The response replaces the cache only if no reload issued after this one
    /// has been applied already.
    pub async fn reload(&self) -> Result<ReloadOutcome, ServiceError> {
        const FAILED: &str = "Failed to load tasks";
        let token = self.guard(FAILED).await?;
        let query = self.query().await;
        let seq = self.inner.next_seq.fetch_add(1, Ordering::SeqCst) + 1;

        tracing::debug!(
            target: "taskdeck.tasks",
            stage = "tasks.reload.in",
            seq = seq,
            search_len = query.search_term.len(),
            status = ?query.status_filter,
            priority = ?query.priority_filter,
            sort_by = %query.sort_by,
            sort_order = %query.sort_order
        );

        match self.inner.service.list_tasks(&token, &query).await {
            Ok(tasks) => Ok(self.apply_reload(seq, tasks).await),
            Err(err) => Err(self.fail(err, FAILED)),
        }
    }

    async fn apply_reload(&self, seq: u64, tasks: Vec<Task>) -> ReloadOutcome {
        let mut cache = self.inner.cache.write().await;
        if seq <= cache.applied_seq {
            let applied = cache.applied_seq;
            drop(cache);
            tracing::debug!(
                target: "taskdeck.tasks",
                stage = "tasks.reload.stale",
                seq = seq,
                applied = applied
            );
            self.emit(CacheEvent::StaleDiscarded {
                seq,
                applied,
                timestamp: Utc::now(),
            });
            return ReloadOutcome::Stale { seq, applied };
        }

        let len = tasks.len();
        cache.applied_seq = seq;
        cache.tasks = tasks;
        drop(cache);

        tracing::debug!(
            target: "taskdeck.tasks",
            stage = "tasks.reload.applied",
            seq = seq,
            len = len
        );
        self.emit(CacheEvent::Reloaded {
            seq,
            len,
            timestamp: Utc::now(),
        });
        ReloadOutcome::Applied { seq, len }
    }

    /// Records the search term and schedules a debounced reload.
    ///
    /// Each call cancels a reload that is still waiting on its timer, so a
    /// burst of keystrokes produces one request for the last term.
    pub async fn set_search_term(&self, term: impl Into<String>) {
        let term = term.into();
        let term_len = term.len();
        self.inner.query.write().await.set_search_term(term);

        let this = self.clone();
        self.inner.search.schedule(async move {
            if let Err(err) = this.reload().await {
                tracing::debug!(
                    target: "taskdeck.tasks",
                    stage = "tasks.search.reload_failed",
                    error = %err
                );
            }
        });
        tracing::trace!(
            target: "taskdeck.tasks",
            stage = "tasks.search.scheduled",
            term_len = term_len,
            delay_ms = self.inner.search.delay().as_millis() as u64
        );
    }

    /// Drops a debounced search reload that has not fired yet.
    pub fn cancel_pending_search(&self) -> bool {
        self.inner.search.cancel()
    }

    /// Replaces the whole query and reloads once. A pending search reload is
    /// dropped since its term is overwritten.
    pub async fn set_query(&self, query: QueryState) -> Result<ReloadOutcome, ServiceError> {
        self.inner.search.cancel();
        *self.inner.query.write().await = query;
        self.reload().await
    }

    async fn reload_if(&self, changed: bool) -> Result<Option<ReloadOutcome>, ServiceError> {
        if changed {
            self.reload().await.map(Some)
        } else {
            Ok(None)
        }
    }

    // Filter and sort changes reload immediately; `None` means the value was
    // unchanged and nothing was requested.

    pub async fn set_status_filter(
        &self,
        status: Option<TaskStatus>,
    ) -> Result<Option<ReloadOutcome>, ServiceError> {
        let changed = self.inner.query.write().await.set_status_filter(status);
        self.reload_if(changed).await
    }

    pub async fn set_priority_filter(
        &self,
        priority: Option<TaskPriority>,
    ) -> Result<Option<ReloadOutcome>, ServiceError> {
        let changed = self.inner.query.write().await.set_priority_filter(priority);
        self.reload_if(changed).await
    }

    pub async fn set_sort_by(
        &self,
        field: SortField,
    ) -> Result<Option<ReloadOutcome>, ServiceError> {
        let changed = self.inner.query.write().await.set_sort_by(field);
        self.reload_if(changed).await
    }

    pub async fn set_sort_order(
        &self,
        order: SortOrder,
    ) -> Result<Option<ReloadOutcome>, ServiceError> {
        let changed = self.inner.query.write().await.set_sort_order(order);
        self.reload_if(changed).await
    }

    /// Creates a task and puts the server's copy at the head of the cache,
    /// whatever the current sort order.
    pub async fn create(&self, draft: TaskDraft) -> Result<Task, ServiceError> {
        const FAILED: &str = "Failed to create task";
        let token = self.guard(FAILED).await?;
        validation::ensure_valid(validation::validate_task_draft(&draft))
            .map_err(|err| self.fail(err, FAILED))?;
        let generation = self.generation().await;

        let task = self
            .inner
            .service
            .create_task(&token, draft)
            .await
            .map_err(|err| self.fail(err, FAILED))?;

        {
            let mut cache = self.inner.cache.write().await;
            if cache.generation != generation {
                drop(cache);
                return Err(self.superseded(&task.id, FAILED));
            }
            cache.tasks.insert(0, task.clone());
        }
        tracing::info!(target: "taskdeck.tasks", stage = "tasks.create.out", task_id = %task.id);
        self.emit(CacheEvent::Inserted {
            id: task.id.clone(),
            timestamp: Utc::now(),
        });

        self.inner.stats.refresh().await;
        self.inner
            .notifier
            .notify(Notice::success("Task created successfully"));
        Ok(task)
    }

    pub async fn update(&self, id: &str, patch: TaskPatch) -> Result<Task, ServiceError> {
        self.patch_task(id, patch, &UPDATE).await
    }

    pub async fn change_status(&self, id: &str, status: TaskStatus) -> Result<Task, ServiceError> {
        self.patch_task(id, TaskPatch::status(status), &STATUS_CHANGE)
            .await
    }

    /// Sends a partial update and swaps the cached entry for the server's copy.
    ///
    /// An id that is not cached leaves the cache as it is.
    async fn patch_task(
        &self,
        id: &str,
        patch: TaskPatch,
        messages: &Messages,
    ) -> Result<Task, ServiceError> {
        let token = self.guard(messages.failure).await?;
        validation::ensure_valid(validation::validate_task_patch(&patch))
            .map_err(|err| self.fail(err, messages.failure))?;
        let generation = self.generation().await;
        let serial = self.inner.locks.acquire(id).await;

        let task = self
            .inner
            .service
            .update_task(&token, id, patch)
            .await
            .map_err(|err| self.fail(err, messages.failure))?;

        let replaced = {
            let mut cache = self.inner.cache.write().await;
            if cache.generation != generation {
                None
            } else {
                Some(match cache.tasks.iter_mut().find(|t| t.id == id) {
                    Some(slot) => {
                        *slot = task.clone();
                        true
                    }
                    None => false,
                })
            }
        };
        drop(serial);
        let Some(replaced) = replaced else {
            return Err(self.superseded(id, messages.failure));
        };

        if replaced {
            tracing::info!(target: "taskdeck.tasks", stage = "tasks.update.out", task_id = %id);
            self.emit(CacheEvent::Replaced {
                id: id.to_string(),
                timestamp: Utc::now(),
            });
        } else {
            tracing::debug!(target: "taskdeck.tasks", stage = "tasks.update.not_cached", task_id = %id);
        }

        self.inner.stats.refresh().await;
        self.inner.notifier.notify(Notice::success(messages.success));
        Ok(task)
    }

    /// Deletes a task after the user confirmed it.
    pub async fn delete(&self, id: &str) -> Result<DeleteOutcome, ServiceError> {
        const FAILED: &str = "Failed to delete task";
        let token = self.guard(FAILED).await?;
        let generation = self.generation().await;

        if !self.inner.confirm.confirm(DELETE_CONFIRMATION).await {
            tracing::debug!(target: "taskdeck.tasks", stage = "tasks.delete.declined", task_id = %id);
            return Ok(DeleteOutcome::Declined);
        }

        let serial = self.inner.locks.acquire(id).await;
        self.inner
            .service
            .delete_task(&token, id)
            .await
            .map_err(|err| self.fail(err, FAILED))?;

        let removed = {
            let mut cache = self.inner.cache.write().await;
            if cache.generation != generation {
                None
            } else {
                Some(match cache.tasks.iter().position(|t| t.id == id) {
                    Some(index) => {
                        cache.tasks.remove(index);
                        true
                    }
                    None => false,
                })
            }
        };
        drop(serial);
        let Some(removed) = removed else {
            return Err(self.superseded(id, FAILED));
        };

        tracing::info!(
            target: "taskdeck.tasks",
            stage = "tasks.delete.out",
            task_id = %id,
            cached = removed
        );
        if removed {
            self.emit(CacheEvent::Removed {
                id: id.to_string(),
                timestamp: Utc::now(),
            });
        }

        self.inner.stats.refresh().await;
        self.inner
            .notifier
            .notify(Notice::success("Task deleted successfully"));
        Ok(DeleteOutcome::Deleted)
    }

    /// Empties the cache and resets the query. Reloads and changes still in
    /// flight are discarded when they land.
    pub async fn clear(&self) {
        self.inner.search.cancel();
        {
            let mut cache = self.inner.cache.write().await;
            cache.tasks.clear();
            cache.applied_seq = self.inner.next_seq.load(Ordering::SeqCst);
            cache.generation += 1;
        }
        *self.inner.query.write().await = QueryState::default();
        self.emit(CacheEvent::Cleared {
            timestamp: Utc::now(),
        });
    }
}
