//! Request payloads and outcomes for the public workflow operations.

use chrono::{NaiveDate, NaiveTime};

use crate::workflow::domain::{Priority, Task, TaskId, TaskType, WorkerId};

use super::{CounterDelta, HandoffOutcome};

/// How the assignee of a new task is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssigneeChoice {
    /// The creating actor picked this worker.
    Worker(WorkerId),
    /// Pick the least-loaded eligible worker.
    Automatic,
}

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    pub(crate) title: String,
    pub(crate) assignee: AssigneeChoice,
    pub(crate) due_date: NaiveDate,
    pub(crate) task_type: Option<TaskType>,
    pub(crate) order_number: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) due_time: Option<NaiveTime>,
    pub(crate) priority: Priority,
    pub(crate) attachment: Option<String>,
    pub(crate) customer_contact: Option<String>,
    pub(crate) printing_type: Option<String>,
}

impl CreateTaskRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(title: impl Into<String>, assignee: AssigneeChoice, due_date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            assignee,
            due_date,
            task_type: None,
            order_number: None,
            description: None,
            due_time: None,
            priority: Priority::default(),
            attachment: None,
            customer_contact: None,
            printing_type: None,
        }
    }

    /// Sets the production stage.
    #[must_use]
    pub const fn with_task_type(mut self, task_type: TaskType) -> Self {
        self.task_type = Some(task_type);
        self
    }

    /// Sets the order number.
    #[must_use]
    pub fn with_order_number(mut self, order_number: impl Into<String>) -> Self {
        self.order_number = Some(order_number.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the due time.
    #[must_use]
    pub const fn with_due_time(mut self, due_time: NaiveTime) -> Self {
        self.due_time = Some(due_time);
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the attachment reference.
    #[must_use]
    pub fn with_attachment(mut self, attachment: impl Into<String>) -> Self {
        self.attachment = Some(attachment.into());
        self
    }

    /// Sets the customer contact.
    #[must_use]
    pub fn with_customer_contact(mut self, contact: impl Into<String>) -> Self {
        self.customer_contact = Some(contact.into());
        self
    }

    /// Sets the printing type.
    #[must_use]
    pub fn with_printing_type(mut self, printing_type: impl Into<String>) -> Self {
        self.printing_type = Some(printing_type.into());
        self
    }
}

/// Field edits for an existing task. Status changes go through
/// transitions instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskEdit {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<Option<String>>,
    pub(crate) priority: Option<Priority>,
    pub(crate) due_date: Option<NaiveDate>,
    pub(crate) due_time: Option<Option<NaiveTime>>,
    pub(crate) attachment: Option<Option<String>>,
    pub(crate) customer_contact: Option<Option<String>>,
    pub(crate) printing_type: Option<Option<String>>,
    pub(crate) assignee: Option<WorkerId>,
}

impl TaskEdit {
    /// Creates an empty edit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Replaces or clears the description.
    #[must_use]
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    /// Replaces the priority.
    #[must_use]
    pub const fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Replaces the due date.
    #[must_use]
    pub const fn due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Replaces or clears the due time.
    #[must_use]
    pub const fn due_time(mut self, due_time: Option<NaiveTime>) -> Self {
        self.due_time = Some(due_time);
        self
    }

    /// Replaces or clears the attachment reference.
    #[must_use]
    pub fn attachment(mut self, attachment: Option<String>) -> Self {
        self.attachment = Some(attachment);
        self
    }

    /// Replaces or clears the customer contact.
    #[must_use]
    pub fn customer_contact(mut self, contact: Option<String>) -> Self {
        self.customer_contact = Some(contact);
        self
    }

    /// Replaces or clears the printing type.
    #[must_use]
    pub fn printing_type(mut self, printing_type: Option<String>) -> Self {
        self.printing_type = Some(printing_type);
        self
    }

    /// Reassigns the task.
    #[must_use]
    pub fn reassign(mut self, worker_id: WorkerId) -> Self {
        self.assignee = Some(worker_id);
        self
    }

    /// Returns `true` when the edit changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Request payload for a manual stage hand-off.
///
/// The new task inherits the source's due date and due time. The fallback
/// due time only applies when the source never had one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextStageRequest {
    pub(crate) source_id: TaskId,
    pub(crate) assignee: WorkerId,
    pub(crate) fallback_due_time: Option<NaiveTime>,
    pub(crate) printing_type: Option<String>,
}

impl NextStageRequest {
    /// Hands the completed `source_id` on to `assignee`.
    #[must_use]
    pub const fn new(source_id: TaskId, assignee: WorkerId) -> Self {
        Self {
            source_id,
            assignee,
            fallback_due_time: None,
            printing_type: None,
        }
    }

    /// Sets the due time used when the source has none.
    #[must_use]
    pub const fn with_fallback_due_time(mut self, due_time: NaiveTime) -> Self {
        self.fallback_due_time = Some(due_time);
        self
    }

    /// Sets the printing type when handing off to printing.
    #[must_use]
    pub fn with_printing_type(mut self, printing_type: impl Into<String>) -> Self {
        self.printing_type = Some(printing_type.into());
        self
    }
}

/// Side effect that failed after a status write committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    /// The productivity counter was not adjusted.
    ProductivityCounter,
    /// The next stage was not created.
    Handoff,
}

/// A recoverable inconsistency left by a committed transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideEffectFailure {
    /// Which side effect failed.
    pub effect: SideEffect,
    /// Rendered cause.
    pub reason: String,
}

/// Details of a committed status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionReport {
    /// The task after the write.
    pub task: Task,
    /// Counter change attributed to this transition.
    pub counter: CounterDelta,
    /// Next-stage result.
    pub handoff: HandoffOutcome,
    /// Side effects that need a retry or a reconciliation pass.
    pub failures: Vec<SideEffectFailure>,
}

/// Result of [`super::WorkflowService::apply_transition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The task already had the requested status; nothing was written.
    Unchanged(Task),
    /// The status was written.
    Applied(TransitionReport),
    /// Delivery was confirmed and the task record consumed.
    Deleted(TaskId),
}

impl TransitionOutcome {
    /// Returns the resulting task, or `None` when it was deleted.
    #[must_use]
    pub const fn task(&self) -> Option<&Task> {
        match self {
            Self::Unchanged(task) => Some(task),
            Self::Applied(report) => Some(&report.task),
            Self::Deleted(_) => None,
        }
    }
}
