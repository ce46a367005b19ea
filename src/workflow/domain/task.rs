//! Task aggregate root, creation drafts, and partial updates.

use super::{Priority, TaskDomainError, TaskId, TaskStatus, TaskType, WorkerId};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    order_number: Option<String>,
    title: String,
    description: Option<String>,
    task_type: Option<TaskType>,
    workflow_stage: Option<TaskType>,
    assignee_id: WorkerId,
    assignee_name: String,
    created_by: WorkerId,
    due_date: NaiveDate,
    due_time: Option<NaiveTime>,
    status: TaskStatus,
    priority: Priority,
    parent_task_id: Option<TaskId>,
    original_order_id: Option<TaskId>,
    external_id: Option<WorkerId>,
    external_parent_id: Option<WorkerId>,
    attachment: Option<String>,
    customer_contact: Option<String>,
    printing_type: Option<String>,
    created_at: DateTime<Utc>,
    last_updated: DateTime<Utc>,
}

impl Task {
    /// Creates a pending task from a draft.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] when the title or assignee name is blank,
    /// or when a printing type is set on a non-printing task.
    pub fn new(draft: TaskDraft, clock: &impl Clock) -> Result<Self, TaskDomainError> {
        let title = non_blank(&draft.title).ok_or(TaskDomainError::EmptyTitle)?;
        let assignee_name =
            non_blank(&draft.assignee_name).ok_or(TaskDomainError::EmptyAssigneeName)?;
        if draft.printing_type.is_some() && draft.task_type != Some(TaskType::Printing) {
            return Err(TaskDomainError::PrintingTypeOnNonPrintingTask);
        }

        let timestamp = clock.utc();
        Ok(Self {
            id: TaskId::new(),
            order_number: draft.order_number,
            title,
            description: draft.description,
            task_type: draft.task_type,
            workflow_stage: draft.task_type,
            assignee_id: draft.assignee_id,
            assignee_name,
            created_by: draft.created_by,
            due_date: draft.due_date,
            due_time: draft.due_time,
            status: TaskStatus::Pending,
            priority: draft.priority,
            parent_task_id: draft.parent_task_id,
            original_order_id: draft.original_order_id,
            external_id: draft.external_id,
            external_parent_id: draft.external_parent_id,
            attachment: draft.attachment,
            customer_contact: draft.customer_contact,
            printing_type: draft.printing_type,
            created_at: timestamp,
            last_updated: timestamp,
        })
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the human-facing order number, if one was assigned.
    #[must_use]
    pub fn order_number(&self) -> Option<&str> {
        self.order_number.as_deref()
    }

    /// Returns the order number, or a truncated id when none was assigned.
    #[must_use]
    pub fn display_order_number(&self) -> String {
        self.order_number
            .clone()
            .unwrap_or_else(|| self.id.short())
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the free-text description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the production stage, or `None` for ad-hoc tasks.
    #[must_use]
    pub const fn task_type(&self) -> Option<TaskType> {
        self.task_type
    }

    /// Returns the workflow stage marker, mirroring [`Self::task_type`].
    #[must_use]
    pub const fn workflow_stage(&self) -> Option<TaskType> {
        self.workflow_stage
    }

    /// Returns the assignee identity.
    #[must_use]
    pub const fn assignee_id(&self) -> &WorkerId {
        &self.assignee_id
    }

    /// Returns the assignee display name.
    #[must_use]
    pub fn assignee_name(&self) -> &str {
        &self.assignee_name
    }

    /// Returns the creator identity.
    #[must_use]
    pub const fn created_by(&self) -> &WorkerId {
        &self.created_by
    }

    /// Returns the due date.
    #[must_use]
    pub const fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    /// Returns the due time of day, if set.
    #[must_use]
    pub const fn due_time(&self) -> Option<NaiveTime> {
        self.due_time
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the task this one was spawned from.
    #[must_use]
    pub const fn parent_task_id(&self) -> Option<TaskId> {
        self.parent_task_id
    }

    /// Returns the root task of the order chain.
    #[must_use]
    pub const fn original_order_id(&self) -> Option<TaskId> {
        self.original_order_id
    }

    /// Returns the identity of the worker who designed the order.
    #[must_use]
    pub const fn external_id(&self) -> Option<&WorkerId> {
        self.external_id.as_ref()
    }

    /// Returns the identity of the worker who printed the order.
    #[must_use]
    pub const fn external_parent_id(&self) -> Option<&WorkerId> {
        self.external_parent_id.as_ref()
    }

    /// Returns the attachment reference.
    #[must_use]
    pub fn attachment(&self) -> Option<&str> {
        self.attachment.as_deref()
    }

    /// Returns the customer contact.
    #[must_use]
    pub fn customer_contact(&self) -> Option<&str> {
        self.customer_contact.as_deref()
    }

    /// Returns the printing type for printing tasks.
    #[must_use]
    pub fn printing_type(&self) -> Option<&str> {
        self.printing_type.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the timestamp of the latest mutation.
    #[must_use]
    pub const fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    /// Returns `true` when the task still counts towards open load.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// Returns `true` when the task is unfinished and past its due moment.
    ///
    /// Without a due time the whole due date counts, so the task becomes
    /// overdue the day after.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        if matches!(
            self.status,
            TaskStatus::Completed | TaskStatus::Delivered | TaskStatus::NotDelivered
        ) {
            return false;
        }
        match self.due_time {
            Some(time) => now.naive_utc() > self.due_date.and_time(time),
            None => now.date_naive() > self.due_date,
        }
    }

    /// Applies a partial update.
    ///
    /// The patch is validated as a whole before any field changes, so a
    /// rejected patch leaves the task untouched.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] when the patch blanks a required field,
    /// puts a delivery outcome on a non-delivery task, or sets a printing
    /// type on a non-printing task.
    pub fn apply_patch(&mut self, patch: TaskPatch) -> Result<(), TaskDomainError> {
        let title = match patch.title {
            Some(title) => Some(non_blank(&title).ok_or(TaskDomainError::EmptyTitle)?),
            None => None,
        };
        let assignee = match patch.assignee {
            Some((id, name)) => Some((
                id,
                non_blank(&name).ok_or(TaskDomainError::EmptyAssigneeName)?,
            )),
            None => None,
        };
        if let Some(status) = patch.status {
            if !status.is_legal_for(self.task_type) {
                return Err(TaskDomainError::InvalidStatusTransition {
                    task_id: self.id,
                    from: self.status,
                    to: status,
                    task_type: super::TaskTypeLabel(self.task_type),
                });
            }
        }
        if matches!(patch.printing_type, Some(Some(_)))
            && self.task_type != Some(TaskType::Printing)
        {
            return Err(TaskDomainError::PrintingTypeOnNonPrintingTask);
        }

        if let Some(title) = title {
            self.title = title;
        }
        if let Some((id, name)) = assignee {
            self.assignee_id = id;
            self.assignee_name = name;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        assign(&mut self.description, patch.description);
        assign(&mut self.priority, patch.priority);
        assign(&mut self.due_date, patch.due_date);
        assign(&mut self.due_time, patch.due_time);
        assign(&mut self.attachment, patch.attachment);
        assign(&mut self.customer_contact, patch.customer_contact);
        assign(&mut self.printing_type, patch.printing_type);
        assign(&mut self.external_id, patch.external_id);
        assign(&mut self.external_parent_id, patch.external_parent_id);
        if let Some(timestamp) = patch.last_updated {
            self.last_updated = timestamp;
        }
        Ok(())
    }
}

fn assign<T>(field: &mut T, value: Option<T>) {
    if let Some(new_value) = value {
        *field = new_value;
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Creation payload for a new task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    title: String,
    assignee_id: WorkerId,
    assignee_name: String,
    created_by: WorkerId,
    due_date: NaiveDate,
    task_type: Option<TaskType>,
    order_number: Option<String>,
    description: Option<String>,
    due_time: Option<NaiveTime>,
    priority: Priority,
    parent_task_id: Option<TaskId>,
    original_order_id: Option<TaskId>,
    external_id: Option<WorkerId>,
    external_parent_id: Option<WorkerId>,
    attachment: Option<String>,
    customer_contact: Option<String>,
    printing_type: Option<String>,
}

impl TaskDraft {
    /// Creates a draft with the required fields.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        assignee_id: WorkerId,
        assignee_name: impl Into<String>,
        created_by: WorkerId,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            title: title.into(),
            assignee_id,
            assignee_name: assignee_name.into(),
            created_by,
            due_date,
            task_type: None,
            order_number: None,
            description: None,
            due_time: None,
            priority: Priority::default(),
            parent_task_id: None,
            original_order_id: None,
            external_id: None,
            external_parent_id: None,
            attachment: None,
            customer_contact: None,
            printing_type: None,
        }
    }

    /// Returns the draft's task type.
    #[must_use]
    pub const fn task_type(&self) -> Option<TaskType> {
        self.task_type
    }

    /// Returns the draft's assignee.
    #[must_use]
    pub const fn assignee_id(&self) -> &WorkerId {
        &self.assignee_id
    }

    /// Sets the production stage.
    #[must_use]
    pub const fn with_task_type(mut self, task_type: TaskType) -> Self {
        self.task_type = Some(task_type);
        self
    }

    /// Sets the human-facing order number.
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

    /// Replaces the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = due_date;
        self
    }

    /// Sets the due time of day.
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

    /// Sets the task this one was spawned from.
    #[must_use]
    pub const fn with_parent_task(mut self, parent_task_id: TaskId) -> Self {
        self.parent_task_id = Some(parent_task_id);
        self
    }

    /// Sets the root task of the order chain.
    #[must_use]
    pub const fn with_original_order(mut self, original_order_id: TaskId) -> Self {
        self.original_order_id = Some(original_order_id);
        self
    }

    /// Sets the designer identity marker.
    #[must_use]
    pub fn with_external_id(mut self, external_id: WorkerId) -> Self {
        self.external_id = Some(external_id);
        self
    }

    /// Sets the printer identity marker.
    #[must_use]
    pub fn with_external_parent_id(mut self, external_parent_id: WorkerId) -> Self {
        self.external_parent_id = Some(external_parent_id);
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
    pub fn with_customer_contact(mut self, customer_contact: impl Into<String>) -> Self {
        self.customer_contact = Some(customer_contact.into());
        self
    }

    /// Sets the printing type.
    #[must_use]
    pub fn with_printing_type(mut self, printing_type: impl Into<String>) -> Self {
        self.printing_type = Some(printing_type.into());
        self
    }

    /// Replaces the assignee.
    #[must_use]
    pub fn with_assignee(mut self, assignee_id: WorkerId, assignee_name: impl Into<String>) -> Self {
        self.assignee_id = assignee_id;
        self.assignee_name = assignee_name.into();
        self
    }
}

/// Partial update for a stored task.
///
/// `None` leaves a field unchanged. Optional task fields take a nested
/// `Option` so they can be cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<Option<String>>,
    /// New priority.
    pub priority: Option<Priority>,
    /// New due date.
    pub due_date: Option<NaiveDate>,
    /// New due time.
    pub due_time: Option<Option<NaiveTime>>,
    /// New status.
    pub status: Option<TaskStatus>,
    /// New assignee identity and display name.
    pub assignee: Option<(WorkerId, String)>,
    /// New attachment reference.
    pub attachment: Option<Option<String>>,
    /// New customer contact.
    pub customer_contact: Option<Option<String>>,
    /// New printing type.
    pub printing_type: Option<Option<String>>,
    /// New designer marker.
    pub external_id: Option<Option<WorkerId>>,
    /// New printer marker.
    pub external_parent_id: Option<Option<WorkerId>>,
    /// Mutation timestamp.
    pub last_updated: Option<DateTime<Utc>>,
}

impl TaskPatch {
    /// Creates a patch that only changes the status.
    #[must_use]
    pub fn status(status: TaskStatus, at: DateTime<Utc>) -> Self {
        Self {
            status: Some(status),
            last_updated: Some(at),
            ..Self::default()
        }
    }

    /// Returns `true` when the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
