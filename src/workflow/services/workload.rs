//! Rebuildable index of open tasks per worker.

use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::workflow::{
    domain::{Task, TaskId, TaskStatus, TaskType, Worker, WorkerId},
    ports::{ChangeEvent, TaskFilter, TaskStore, WorkerDirectory},
};

use super::WorkflowResult;

/// Default bound on index staleness before assignment forces a reload.
pub const DEFAULT_WORKLOAD_MAX_AGE_SECS: i64 = 30;

/// Per-worker view of open (pending or in-progress) tasks.
///
/// Tasks are tracked as id sets rather than counters so replaying the same
/// change event leaves the index unchanged. The index tolerates bounded
/// staleness: assignment only needs to avoid gross imbalance.
pub struct WorkloadIndex<S, D>
where
    S: TaskStore,
    D: WorkerDirectory,
{
    store: Arc<S>,
    directory: Arc<D>,
    max_age: Duration,
    state: RwLock<WorkloadState>,
}

#[derive(Debug, Default)]
struct WorkloadState {
    owners: HashMap<TaskId, WorkerId>,
    open_by_worker: HashMap<WorkerId, HashSet<TaskId>>,
    loaded_at: Option<DateTime<Utc>>,
}

impl WorkloadState {
    fn forget(&mut self, task_id: TaskId) {
        let Some(owner) = self.owners.remove(&task_id) else {
            return;
        };
        if let Some(open) = self.open_by_worker.get_mut(&owner) {
            open.remove(&task_id);
            if open.is_empty() {
                self.open_by_worker.remove(&owner);
            }
        }
    }

    fn track(&mut self, task: &Task) {
        self.forget(task.id());
        if task.is_open() {
            self.owners.insert(task.id(), task.assignee_id().clone());
            self.open_by_worker
                .entry(task.assignee_id().clone())
                .or_default()
                .insert(task.id());
        }
    }
}

impl<S, D> WorkloadIndex<S, D>
where
    S: TaskStore,
    D: WorkerDirectory,
{
    /// Creates an empty index that reloads once older than `max_age`.
    #[must_use]
    pub fn new(store: Arc<S>, directory: Arc<D>, max_age: Duration) -> Self {
        Self {
            store,
            directory,
            max_age,
            state: RwLock::new(WorkloadState::default()),
        }
    }

    /// Rebuilds the index from a full store listing.
    ///
    /// # Errors
    ///
    /// Returns [`super::WorkflowError::CollaboratorUnavailable`] when the
    /// store listing fails.
    pub async fn refresh(&self, now: DateTime<Utc>) -> WorkflowResult<()> {
        let filter = TaskFilter::all().with_statuses([TaskStatus::Pending, TaskStatus::InProgress]);
        let open_tasks = self.store.list(&filter).await?;
        self.rebuild_from(&open_tasks, now);
        Ok(())
    }

    /// Replaces the index with the open tasks in a full listing.
    ///
    /// Closed tasks in `tasks` are ignored, so a reload snapshot can be
    /// passed as is.
    pub fn rebuild_from(&self, tasks: &[Task], now: DateTime<Utc>) {
        let mut rebuilt = WorkloadState {
            loaded_at: Some(now),
            ..WorkloadState::default()
        };
        for task in tasks {
            rebuilt.track(task);
        }
        let open_tasks = rebuilt.owners.len();
        *self.write() = rebuilt;
        tracing::debug!(open_tasks, "workload index rebuilt");
    }

    /// Reloads the index when it has never loaded or is older than the
    /// staleness bound.
    ///
    /// # Errors
    ///
    /// Returns [`super::WorkflowError::CollaboratorUnavailable`] when the
    /// store listing fails.
    pub async fn ensure_fresh(&self, now: DateTime<Utc>) -> WorkflowResult<()> {
        if self.is_stale(now) {
            self.refresh(now).await?;
        }
        Ok(())
    }

    /// Returns `true` when the next assignment decision must reload.
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.read()
            .loaded_at
            .is_none_or(|loaded_at| now - loaded_at > self.max_age)
    }

    /// Forces the next assignment decision to reload.
    pub fn invalidate(&self) {
        self.write().loaded_at = None;
    }

    /// Returns the number of open tasks held by the worker.
    #[must_use]
    pub fn open_count_for(&self, worker_id: &WorkerId) -> usize {
        self.read()
            .open_by_worker
            .get(worker_id)
            .map_or(0, HashSet::len)
    }

    /// Returns the workers eligible for `task_type`, in directory order.
    ///
    /// # Errors
    ///
    /// Returns [`super::WorkflowError::CollaboratorUnavailable`] when the
    /// directory lookup fails.
    pub async fn eligible_workers_for(&self, task_type: TaskType) -> WorkflowResult<Vec<Worker>> {
        Ok(self
            .directory
            .list_by_role(task_type.eligible_role())
            .await?)
    }

    /// Folds a change-feed event into the index.
    ///
    /// Idempotent: duplicate or coalesced events converge on the state of
    /// the newest row carried.
    pub fn apply_change(&self, event: &ChangeEvent) {
        let mut state = self.write();
        match event.after() {
            Some(task) => state.track(task),
            None => state.forget(event.task_id()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, WorkloadState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, WorkloadState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
