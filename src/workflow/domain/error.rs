//! Error types for workflow domain validation and parsing.

use super::{TaskId, TaskStatus, TaskType};
use thiserror::Error;

/// Errors returned while constructing or mutating domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// A worker identity is empty after trimming.
    #[error("worker identity must not be empty")]
    EmptyWorkerId,

    /// The assignee display name is empty after trimming.
    #[error("assignee name must not be empty")]
    EmptyAssigneeName,

    /// A printing type was supplied for a task that is not a printing task.
    #[error("printing type is only meaningful for printing tasks")]
    PrintingTypeOnNonPrintingTask,

    /// The requested status change is not legal for the task.
    #[error("task {task_id} cannot move from {from} to {to} (task type: {task_type})")]
    InvalidStatusTransition {
        /// Task being transitioned.
        task_id: TaskId,
        /// Current status.
        from: TaskStatus,
        /// Requested status.
        to: TaskStatus,
        /// Task type, rendered for diagnostics.
        task_type: TaskTypeLabel,
    },
}

/// Display helper for an optional task type inside error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskTypeLabel(pub Option<TaskType>);

impl std::fmt::Display for TaskTypeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(task_type) => f.write_str(task_type.as_str()),
            None => f.write_str("ad-hoc"),
        }
    }
}

/// Error returned while parsing task statuses from persistence or input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing task types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task type: {0}")]
pub struct ParseTaskTypeError(pub String);

/// Error returned while parsing priorities.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown priority: {0}")]
pub struct ParsePriorityError(pub String);

/// Error returned while parsing worker roles.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);
