//! Store port for task persistence, querying, and change notification.

use crate::workflow::domain::{Task, TaskId, TaskPatch, TaskStatus, TaskType, WorkerId};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

/// Result type for task store operations.
pub type TaskStoreResult<T> = Result<T, TaskStoreError>;

/// Task persistence contract.
///
/// Implementations persist data and publish changes; they enforce no
/// workflow rules.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Stores a new task and returns the stored record.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Validation`] when the id already exists or a
    /// required field is missing.
    async fn create(&self, task: Task) -> TaskStoreResult<Task>;

    /// Applies a partial update to an existing task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::NotFound`] when the task does not exist and
    /// [`TaskStoreError::Validation`] when the patch is malformed.
    async fn update(&self, id: TaskId, patch: TaskPatch) -> TaskStoreResult<()>;

    /// Applies a partial update only if the stored status equals `expected`.
    ///
    /// Returns `false` without writing when the status has moved on.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::NotFound`] when the task does not exist and
    /// [`TaskStoreError::Validation`] when the patch is malformed.
    async fn update_if_status(
        &self,
        id: TaskId,
        expected: TaskStatus,
        patch: TaskPatch,
    ) -> TaskStoreResult<bool>;

    /// Hard-deletes a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::NotFound`] when the task does not exist.
    async fn delete(&self, id: TaskId) -> TaskStoreResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn get(&self, id: TaskId) -> TaskStoreResult<Option<Task>>;

    /// Returns tasks matching the filter.
    async fn list(&self, filter: &TaskFilter) -> TaskStoreResult<Vec<Task>>;

    /// Returns every task assigned to the worker, in storage order.
    async fn list_by_assignee(&self, worker_id: &WorkerId) -> TaskStoreResult<Vec<Task>>;

    /// Subscribes to row changes.
    ///
    /// Delivery is at-least-once and events may be coalesced. Dropping the
    /// receiver unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;
}

/// Errors returned by task store implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskStoreError {
    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// A required field is missing or malformed.
    #[error("invalid task data: {0}")]
    Validation(String),

    /// The backing service failed.
    #[error("task store unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskStoreError {
    /// Wraps a backing-service error.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}

/// Kind of row change published by a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// A task was created.
    Insert,
    /// A task was modified.
    Update,
    /// A task was removed.
    Delete,
}

impl ChangeKind {
    /// Returns a lowercase label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Row change published on the store's change feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    kind: ChangeKind,
    task_id: TaskId,
    before: Option<Task>,
    after: Option<Task>,
}

impl ChangeEvent {
    /// Builds an insert event.
    #[must_use]
    pub fn insert(task: Task) -> Self {
        Self {
            kind: ChangeKind::Insert,
            task_id: task.id(),
            before: None,
            after: Some(task),
        }
    }

    /// Builds an update event.
    ///
    /// `before` may be absent when the feed only carries the new row.
    #[must_use]
    pub fn update(before: Option<Task>, after: Task) -> Self {
        Self {
            kind: ChangeKind::Update,
            task_id: after.id(),
            before,
            after: Some(after),
        }
    }

    /// Builds a delete event.
    #[must_use]
    pub fn delete(task_id: TaskId, before: Option<Task>) -> Self {
        Self {
            kind: ChangeKind::Delete,
            task_id,
            before,
            after: None,
        }
    }

    /// Returns the change kind.
    #[must_use]
    pub const fn kind(&self) -> ChangeKind {
        self.kind
    }

    /// Returns the changed task id.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the row before the change, when known.
    #[must_use]
    pub const fn before(&self) -> Option<&Task> {
        self.before.as_ref()
    }

    /// Returns the row after the change, when it still exists.
    #[must_use]
    pub const fn after(&self) -> Option<&Task> {
        self.after.as_ref()
    }
}

/// Result ordering for [`TaskFilter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskOrder {
    /// Storage insertion order.
    #[default]
    Insertion,
    /// Earliest due date (then due time) first.
    DueDate,
}

/// Query predicate for [`TaskStore::list`].
///
/// Every unset criterion matches all tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    assignee: Option<WorkerId>,
    statuses: Vec<TaskStatus>,
    task_type: Option<TaskType>,
    created_by: Option<WorkerId>,
    parent_task_id: Option<TaskId>,
    due_from: Option<NaiveDate>,
    due_until: Option<NaiveDate>,
    order: TaskOrder,
    limit: Option<usize>,
}

impl TaskFilter {
    /// Creates a filter that matches every task.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Restricts to one assignee.
    #[must_use]
    pub fn assigned_to(mut self, worker_id: WorkerId) -> Self {
        self.assignee = Some(worker_id);
        self
    }

    /// Restricts to the given statuses.
    #[must_use]
    pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = TaskStatus>) -> Self {
        self.statuses = statuses.into_iter().collect();
        self
    }

    /// Restricts to one task type.
    #[must_use]
    pub const fn of_type(mut self, task_type: TaskType) -> Self {
        self.task_type = Some(task_type);
        self
    }

    /// Restricts to tasks created by one worker.
    #[must_use]
    pub fn created_by(mut self, worker_id: WorkerId) -> Self {
        self.created_by = Some(worker_id);
        self
    }

    /// Restricts to tasks spawned from one parent.
    #[must_use]
    pub const fn with_parent(mut self, parent_task_id: TaskId) -> Self {
        self.parent_task_id = Some(parent_task_id);
        self
    }

    /// Restricts to tasks due within an inclusive date range.
    #[must_use]
    pub const fn due_between(mut self, from: Option<NaiveDate>, until: Option<NaiveDate>) -> Self {
        self.due_from = from;
        self.due_until = until;
        self
    }

    /// Sets the result ordering.
    #[must_use]
    pub const fn ordered_by(mut self, order: TaskOrder) -> Self {
        self.order = order;
        self
    }

    /// Caps the number of results.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns `true` when the task satisfies every criterion.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.assignee.as_ref().is_none_or(|id| task.assignee_id() == id)
            && (self.statuses.is_empty() || self.statuses.contains(&task.status()))
            && self.task_type.is_none_or(|t| task.task_type() == Some(t))
            && self.created_by.as_ref().is_none_or(|id| task.created_by() == id)
            && self
                .parent_task_id
                .is_none_or(|id| task.parent_task_id() == Some(id))
            && self.due_from.is_none_or(|from| task.due_date() >= from)
            && self.due_until.is_none_or(|until| task.due_date() <= until)
    }

    /// Filters, orders, and truncates tasks given in storage order.
    ///
    /// Sorting is stable, so ties keep storage order.
    #[must_use]
    pub fn apply<'a>(&self, tasks: impl IntoIterator<Item = &'a Task>) -> Vec<Task> {
        let mut matched: Vec<Task> = tasks
            .into_iter()
            .filter(|task| self.matches(task))
            .cloned()
            .collect();
        if self.order == TaskOrder::DueDate {
            matched.sort_by_key(|task| (task.due_date(), task.due_time()));
        }
        if let Some(limit) = self.limit {
            matched.truncate(limit);
        }
        matched
    }
}
