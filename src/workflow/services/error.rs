//! Service-level error taxonomy for workflow operations.

use crate::workflow::{
    domain::{Role, TaskDomainError, TaskId, TaskStatus, TaskType, TaskTypeLabel, WorkerId},
    ports::{DirectoryError, LedgerError, TaskStoreError},
};
use thiserror::Error;

/// Errors returned by workflow services.
///
/// Every business-rule variant is raised before any write is issued.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A required field is missing or malformed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The worker may not own tasks of this type.
    #[error("worker {worker_id} is not eligible for {task_type} tasks")]
    InvalidAssignee {
        /// Rejected worker.
        worker_id: WorkerId,
        /// Task type the worker was chosen for.
        task_type: TaskTypeLabel,
    },

    /// The status change is not permitted from the current state.
    #[error("task {task_id} cannot move from {from} to {to} (task type: {task_type})")]
    IllegalTransition {
        /// Task being transitioned.
        task_id: TaskId,
        /// Current status.
        from: TaskStatus,
        /// Requested status.
        to: TaskStatus,
        /// Task type.
        task_type: TaskTypeLabel,
    },

    /// The task no longer exists.
    #[error("task {0} no longer exists")]
    NotFound(TaskId),

    /// Automatic assignment found no candidate.
    #[error("no eligible worker for {0} tasks")]
    NoEligibleWorker(TaskType),

    /// The actor's role does not allow the operation.
    #[error("{role} may not {action}")]
    NotPermitted {
        /// Acting role.
        role: Role,
        /// Refused operation.
        action: &'static str,
    },

    /// The task changed concurrently between read and write.
    #[error("task {task_id} changed concurrently; now {current}")]
    StaleState {
        /// Affected task.
        task_id: TaskId,
        /// Status observed after the failed write.
        current: TaskStatus,
    },

    /// A collaborator call failed; the caller may retry.
    #[error("collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),
}

/// Result type for workflow service operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

impl WorkflowError {
    pub(crate) const fn not_permitted(role: Role, action: &'static str) -> Self {
        Self::NotPermitted { role, action }
    }

    pub(crate) const fn invalid_assignee(worker_id: WorkerId, task_type: Option<TaskType>) -> Self {
        Self::InvalidAssignee {
            worker_id,
            task_type: TaskTypeLabel(task_type),
        }
    }
}

impl From<TaskDomainError> for WorkflowError {
    fn from(err: TaskDomainError) -> Self {
        match err {
            TaskDomainError::InvalidStatusTransition {
                task_id,
                from,
                to,
                task_type,
            } => Self::IllegalTransition {
                task_id,
                from,
                to,
                task_type,
            },
            other => Self::Validation(other.to_string()),
        }
    }
}

impl From<TaskStoreError> for WorkflowError {
    fn from(err: TaskStoreError) -> Self {
        match err {
            TaskStoreError::NotFound(task_id) => Self::NotFound(task_id),
            TaskStoreError::Validation(reason) => Self::Validation(reason),
            TaskStoreError::Unavailable(source) => Self::CollaboratorUnavailable(source.to_string()),
        }
    }
}

impl From<DirectoryError> for WorkflowError {
    fn from(err: DirectoryError) -> Self {
        Self::CollaboratorUnavailable(err.to_string())
    }
}

impl From<LedgerError> for WorkflowError {
    fn from(err: LedgerError) -> Self {
        Self::CollaboratorUnavailable(err.to_string())
    }
}
