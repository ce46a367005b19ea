//! Stage hand-off: spawning the next stage's task from a completed one.

use mockable::Clock;
use std::sync::Arc;

use crate::workflow::{
    domain::{Actor, Task, TaskDraft, TaskId, TaskStatus, TaskType, Worker},
    ports::{TaskFilter, TaskStore, WorkerDirectory},
};

use super::{AssignmentOutcome, AssignmentResolver, WorkflowResult};

/// What happened to the next stage after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandoffOutcome {
    /// The transition does not trigger a hand-off.
    NotApplicable,
    /// A next-stage task was created.
    Created(Task),
    /// The source already has a next-stage task, so none was added.
    AlreadyProgressed(TaskId),
    /// Nobody holds the next stage's role; the chain ends here.
    NoEligibleWorker,
    /// The hand-off failed after the status write committed. The status is
    /// kept and the hand-off can be retried.
    Failed,
}

/// Builds the next stage's task from a completed source task.
///
/// Scheduling, priority, attachment, customer contact, and order number
/// carry over. The designer marker is set when leaving designing and kept
/// afterwards; the printer marker is set when leaving printing.
#[must_use]
pub fn successor_draft(
    source: &Task,
    next_stage: TaskType,
    assignee: &Worker,
    actor: &Actor,
) -> TaskDraft {
    let title = format!("{}: {}", stage_label(next_stage), source.title());
    let mut draft = TaskDraft::new(
        title,
        assignee.id().clone(),
        assignee.display_name(),
        actor.worker_id().clone(),
        source.due_date(),
    )
    .with_task_type(next_stage)
    .with_priority(source.priority())
    .with_parent_task(source.id())
    .with_original_order(source.original_order_id().unwrap_or_else(|| source.id()));

    if let Some(order_number) = source.order_number() {
        draft = draft.with_order_number(order_number);
    }
    if let Some(description) = source.description() {
        draft = draft.with_description(description);
    }
    if let Some(due_time) = source.due_time() {
        draft = draft.with_due_time(due_time);
    }
    if let Some(attachment) = source.attachment() {
        draft = draft.with_attachment(attachment);
    }
    if let Some(contact) = source.customer_contact() {
        draft = draft.with_customer_contact(contact);
    }

    let designer = source.external_id().cloned().or_else(|| {
        (source.task_type() == Some(TaskType::Designing)).then(|| source.assignee_id().clone())
    });
    if let Some(designer) = designer {
        draft = draft.with_external_id(designer);
    }
    let printer = source.external_parent_id().cloned().or_else(|| {
        (source.task_type() == Some(TaskType::Printing)).then(|| source.assignee_id().clone())
    });
    if let Some(printer) = printer {
        draft = draft.with_external_parent_id(printer);
    }
    draft
}

const fn stage_label(stage: TaskType) -> &'static str {
    match stage {
        TaskType::Designing => "Design",
        TaskType::Printing => "Printing",
        TaskType::Delivery => "Delivery",
    }
}

/// Creates next-stage tasks, automatically or for a chosen worker.
pub struct WorkflowProgression<S, D, C>
where
    S: TaskStore,
    D: WorkerDirectory,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    resolver: Arc<AssignmentResolver<S, D>>,
    clock: Arc<C>,
}

impl<S, D, C> WorkflowProgression<S, D, C>
where
    S: TaskStore,
    D: WorkerDirectory,
    C: Clock + Send + Sync,
{
    /// Creates the orchestrator.
    #[must_use]
    pub const fn new(
        store: Arc<S>,
        resolver: Arc<AssignmentResolver<S, D>>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            store,
            resolver,
            clock,
        }
    }

    /// Spawns the delivery task for a printing task that just completed.
    ///
    /// The delivery task goes to the least-loaded delivery supervisor. With
    /// no supervisor on the roster the chain simply stops.
    ///
    /// # Errors
    ///
    /// Returns [`super::WorkflowError`] when a collaborator call fails or the
    /// built task is invalid.
    pub async fn advance_completed_printing(
        &self,
        source: &Task,
        actor: &Actor,
    ) -> WorkflowResult<HandoffOutcome> {
        if source.task_type() != Some(TaskType::Printing)
            || source.status() != TaskStatus::Completed
        {
            return Ok(HandoffOutcome::NotApplicable);
        }
        if let Some(existing) = self.find_successor(source.id(), TaskType::Delivery).await? {
            tracing::debug!(
                source_id = %source.id(),
                successor_id = %existing.id(),
                "printing task already handed off"
            );
            return Ok(HandoffOutcome::AlreadyProgressed(existing.id()));
        }

        let supervisor = match self
            .resolver
            .resolve_automatic(TaskType::Delivery, self.clock.utc())
            .await?
        {
            AssignmentOutcome::Assigned(worker) => worker,
            AssignmentOutcome::NoEligibleWorker(_) => {
                tracing::info!(
                    source_id = %source.id(),
                    "no delivery supervisor available; order chain ends at printing"
                );
                return Ok(HandoffOutcome::NoEligibleWorker);
            }
        };

        let created = self
            .spawn(source, TaskType::Delivery, &supervisor, actor, |draft| draft)
            .await?;
        Ok(HandoffOutcome::Created(created))
    }

    /// Creates the next stage's task for an already validated worker.
    ///
    /// `adjust` may override scheduling fields on the built draft.
    ///
    /// # Errors
    ///
    /// Returns [`super::WorkflowError`] when the built task is invalid or the
    /// store rejects it.
    pub async fn spawn(
        &self,
        source: &Task,
        next_stage: TaskType,
        assignee: &Worker,
        actor: &Actor,
        adjust: impl FnOnce(TaskDraft) -> TaskDraft + Send,
    ) -> WorkflowResult<Task> {
        let draft = adjust(successor_draft(source, next_stage, assignee, actor));
        let task = Task::new(draft, &*self.clock)?;
        let created = self.store.create(task).await?;
        tracing::info!(
            source_id = %source.id(),
            successor_id = %created.id(),
            stage = %next_stage,
            assignee = %assignee.id(),
            "stage handed off"
        );
        Ok(created)
    }

    /// Returns the existing next-stage task spawned from `source_id`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`super::WorkflowError::CollaboratorUnavailable`] when the
    /// store listing fails.
    pub async fn find_successor(
        &self,
        source_id: TaskId,
        stage: TaskType,
    ) -> WorkflowResult<Option<Task>> {
        let filter = TaskFilter::all()
            .with_parent(source_id)
            .of_type(stage)
            .limit(1);
        Ok(self.store.list(&filter).await?.into_iter().next())
    }
}
