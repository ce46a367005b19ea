//! Public workflow operations.

use chrono::Duration;
use mockable::Clock;
use std::sync::Arc;

use crate::workflow::{
    domain::{
        Actor, DEFAULT_MAX_PROVENANCE_DEPTH, ProvenanceChain, ProvenanceWalk, Task, TaskDraft,
        TaskId, TaskPatch, TaskStatus, TaskType, TaskTypeLabel, WalkStep, Worker,
    },
    ports::{ChangeEvent, ProductivityLedger, TaskFilter, TaskOrder, TaskStore, WorkerDirectory},
};

use super::{
    AssigneeChoice, AssignmentOutcome, AssignmentResolver, CreateTaskRequest,
    DEFAULT_WORKLOAD_MAX_AGE_SECS, HandoffOutcome, NextStageRequest, ProductivityReconciler,
    SideEffect, SideEffectFailure, TaskEdit, TieBreak, TransitionOutcome, TransitionReport,
    WorkflowError, WorkflowProgression, WorkflowResult, WorkloadIndex,
};

/// Tunables for [`WorkflowService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowSettings {
    /// Staleness bound for the workload index.
    pub workload_max_age: Duration,
    /// Tie-break order for automatic assignment.
    pub tie_break: TieBreak,
    /// Parent hops followed when tracing provenance.
    pub max_provenance_depth: usize,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            workload_max_age: Duration::seconds(DEFAULT_WORKLOAD_MAX_AGE_SECS),
            tie_break: TieBreak::default(),
            max_provenance_depth: DEFAULT_MAX_PROVENANCE_DEPTH,
        }
    }
}

/// Order workflow engine.
///
/// Every operation takes the acting user explicitly and checks all business
/// rules before issuing a write.
pub struct WorkflowService<S, D, L, C>
where
    S: TaskStore,
    D: WorkerDirectory,
    L: ProductivityLedger,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    workload: Arc<WorkloadIndex<S, D>>,
    resolver: Arc<AssignmentResolver<S, D>>,
    progression: WorkflowProgression<S, D, C>,
    reconciler: ProductivityReconciler<L>,
    clock: Arc<C>,
    settings: WorkflowSettings,
}

impl<S, D, L, C> WorkflowService<S, D, L, C>
where
    S: TaskStore,
    D: WorkerDirectory,
    L: ProductivityLedger,
    C: Clock + Send + Sync,
{
    /// Creates a workflow service with default settings.
    #[must_use]
    pub fn new(store: Arc<S>, directory: Arc<D>, ledger: Arc<L>, clock: Arc<C>) -> Self {
        Self::with_settings(store, directory, ledger, clock, WorkflowSettings::default())
    }

    /// Creates a workflow service with explicit settings.
    #[must_use]
    pub fn with_settings(
        store: Arc<S>,
        directory: Arc<D>,
        ledger: Arc<L>,
        clock: Arc<C>,
        settings: WorkflowSettings,
    ) -> Self {
        let workload = Arc::new(WorkloadIndex::new(
            Arc::clone(&store),
            Arc::clone(&directory),
            settings.workload_max_age,
        ));
        let resolver = Arc::new(AssignmentResolver::new(
            directory,
            Arc::clone(&workload),
            settings.tie_break,
        ));
        let progression = WorkflowProgression::new(
            Arc::clone(&store),
            Arc::clone(&resolver),
            Arc::clone(&clock),
        );
        Self {
            store,
            workload,
            resolver,
            progression,
            reconciler: ProductivityReconciler::new(ledger),
            clock,
            settings,
        }
    }

    /// Returns the workload index so a live feed can keep it current.
    #[must_use]
    pub fn workload(&self) -> Arc<WorkloadIndex<S, D>> {
        Arc::clone(&self.workload)
    }

    /// Returns the active settings.
    #[must_use]
    pub const fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    async fn find_task_or_error(&self, task_id: TaskId) -> WorkflowResult<Task> {
        self.store
            .get(task_id)
            .await?
            .ok_or(WorkflowError::NotFound(task_id))
    }

    /// Creates a new task.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NotPermitted`] when the actor may not create
    /// this task, [`WorkflowError::InvalidAssignee`] for an ineligible
    /// worker, [`WorkflowError::NoEligibleWorker`] when automatic assignment
    /// finds nobody, and validation or collaborator errors otherwise.
    pub async fn create_task(&self, actor: &Actor, request: CreateTaskRequest) -> WorkflowResult<Task> {
        let chosen = match &request.assignee {
            AssigneeChoice::Worker(worker_id) => Some(worker_id),
            AssigneeChoice::Automatic => None,
        };
        super::authorize_creation(actor, request.task_type, chosen)?;

        let assignee = self.resolve_assignee(&request).await?;
        let draft = creation_draft(request, &assignee, actor);
        let task = Task::new(draft, &*self.clock)?;
        let created = self.store.create(task).await?;
        self.workload.apply_change(&ChangeEvent::insert(created.clone()));
        tracing::info!(
            task_id = %created.id(),
            task_type = %TaskTypeLabel(created.task_type()),
            assignee = %created.assignee_id(),
            created_by = %actor.worker_id(),
            "task created"
        );
        Ok(created)
    }

    async fn resolve_assignee(&self, request: &CreateTaskRequest) -> WorkflowResult<Worker> {
        match (&request.assignee, request.task_type) {
            (AssigneeChoice::Worker(worker_id), task_type) => {
                self.resolver.resolve_manual(task_type, worker_id).await
            }
            (AssigneeChoice::Automatic, Some(task_type)) => {
                match self
                    .resolver
                    .resolve_automatic(task_type, self.clock.utc())
                    .await?
                {
                    AssignmentOutcome::Assigned(worker) => Ok(worker),
                    AssignmentOutcome::NoEligibleWorker(stage) => {
                        Err(WorkflowError::NoEligibleWorker(stage))
                    }
                }
            }
            (AssigneeChoice::Automatic, None) => Err(WorkflowError::Validation(
                "automatic assignment requires a task type".to_owned(),
            )),
        }
    }

    /// Edits task fields other than status.
    ///
    /// The assignee and supervisory roles may edit; only supervisory roles
    /// may reassign. Reassigning a completed task moves its completion
    /// credit to the new assignee. The write only lands while the status
    /// read here still holds.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NotFound`], [`WorkflowError::NotPermitted`],
    /// [`WorkflowError::InvalidAssignee`], [`WorkflowError::StaleState`]
    /// when the status changed concurrently, or validation and collaborator
    /// errors.
    pub async fn update_task_fields(
        &self,
        actor: &Actor,
        task_id: TaskId,
        edit: TaskEdit,
    ) -> WorkflowResult<Task> {
        let task = self.find_task_or_error(task_id).await?;
        ensure_can_act_on(actor, &task, "edit tasks assigned to other workers")?;
        if edit.is_empty() {
            return Ok(task);
        }

        let mut patch = TaskPatch {
            title: edit.title,
            description: edit.description,
            priority: edit.priority,
            due_date: edit.due_date,
            due_time: edit.due_time,
            attachment: edit.attachment,
            customer_contact: edit.customer_contact,
            printing_type: edit.printing_type,
            last_updated: Some(self.clock.utc()),
            ..TaskPatch::default()
        };
        if let Some(worker_id) = edit.assignee {
            if !actor.is_supervisory() {
                return Err(WorkflowError::not_permitted(actor.role(), "reassign tasks"));
            }
            let worker = self.resolver.resolve_manual(task.task_type(), &worker_id).await?;
            patch.assignee = Some((worker.id().clone(), worker.display_name().to_owned()));
        }

        let mut preview = task.clone();
        preview.apply_patch(patch.clone())?;
        if !self.store.update_if_status(task_id, task.status(), patch).await? {
            let current = self.find_task_or_error(task_id).await?;
            return Err(WorkflowError::StaleState {
                task_id,
                current: current.status(),
            });
        }
        let updated = self.find_task_or_error(task_id).await?;
        self.workload
            .apply_change(&ChangeEvent::update(Some(task.clone()), updated.clone()));
        tracing::debug!(%task_id, "task fields updated");

        self.reconciler
            .transfer_credit(task.status(), task.assignee_id(), preview.assignee_id())
            .await
            .inspect_err(|err| {
                tracing::error!(
                    %task_id,
                    from = %task.assignee_id(),
                    to = %preview.assignee_id(),
                    error = %err,
                    "completion credit not moved with reassignment"
                );
            })?;
        Ok(updated)
    }

    /// Moves a task to `new_status` and runs the transition's side effects.
    ///
    /// Requesting the status the task already holds writes nothing, so a
    /// retried call never double-counts. Confirming delivery deletes the
    /// task. Completing a printing task hands it off to delivery. Side-effect
    /// failures after the status write are reported, not rolled back.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NotFound`], [`WorkflowError::NotPermitted`],
    /// [`WorkflowError::IllegalTransition`], [`WorkflowError::StaleState`]
    /// when the task changed concurrently, or collaborator errors from the
    /// status write.
    pub async fn apply_transition(
        &self,
        actor: &Actor,
        task_id: TaskId,
        new_status: TaskStatus,
    ) -> WorkflowResult<TransitionOutcome> {
        let task = self.find_task_or_error(task_id).await?;
        ensure_can_act_on(actor, &task, "change the status of other workers' tasks")?;

        let previous = task.status();
        if previous == new_status {
            return Ok(TransitionOutcome::Unchanged(task));
        }
        if !previous.can_transition_to(new_status, task.task_type()) {
            return Err(WorkflowError::IllegalTransition {
                task_id,
                from: previous,
                to: new_status,
                task_type: TaskTypeLabel(task.task_type()),
            });
        }

        if task.task_type() == Some(TaskType::Delivery) && new_status == TaskStatus::Delivered {
            self.store.delete(task_id).await?;
            self.workload
                .apply_change(&ChangeEvent::delete(task_id, Some(task)));
            tracing::info!(%task_id, "delivery confirmed; task consumed");
            return Ok(TransitionOutcome::Deleted(task_id));
        }

        let patch = TaskPatch::status(new_status, self.clock.utc());
        let mut updated = task.clone();
        updated.apply_patch(patch.clone())?;
        if !self.store.update_if_status(task_id, previous, patch).await? {
            return self.resolve_lost_write(task_id, new_status).await;
        }
        self.workload
            .apply_change(&ChangeEvent::update(Some(task), updated.clone()));
        tracing::info!(%task_id, from = %previous, to = %new_status, "task status changed");

        let mut failures = Vec::new();
        let counter = match self
            .reconciler
            .reconcile(previous, new_status, updated.assignee_id())
            .await
        {
            Ok(delta) => delta,
            Err(err) => {
                tracing::error!(
                    %task_id,
                    worker_id = %updated.assignee_id(),
                    error = %err,
                    "productivity counter out of step with task status"
                );
                failures.push(SideEffectFailure {
                    effect: SideEffect::ProductivityCounter,
                    reason: err.to_string(),
                });
                super::counter_delta(previous, new_status)
            }
        };

        let handoff = match self.progression.advance_completed_printing(&updated, actor).await {
            Ok(outcome) => {
                if let HandoffOutcome::Created(successor) = &outcome {
                    self.workload
                        .apply_change(&ChangeEvent::insert(successor.clone()));
                }
                outcome
            }
            Err(err) => {
                tracing::error!(
                    %task_id,
                    error = %err,
                    "hand-off to delivery failed; printing task stays completed"
                );
                failures.push(SideEffectFailure {
                    effect: SideEffect::Handoff,
                    reason: err.to_string(),
                });
                HandoffOutcome::Failed
            }
        };

        Ok(TransitionOutcome::Applied(TransitionReport {
            task: updated,
            counter,
            handoff,
            failures,
        }))
    }

    async fn resolve_lost_write(
        &self,
        task_id: TaskId,
        new_status: TaskStatus,
    ) -> WorkflowResult<TransitionOutcome> {
        let current = self.find_task_or_error(task_id).await?;
        if current.status() == new_status {
            tracing::debug!(%task_id, status = %new_status, "concurrent transition already applied");
            return Ok(TransitionOutcome::Unchanged(current));
        }
        Err(WorkflowError::StaleState {
            task_id,
            current: current.status(),
        })
    }

    /// Hands a completed task on to a chosen worker in the next stage.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NotFound`], [`WorkflowError::NotPermitted`],
    /// [`WorkflowError::IllegalTransition`] when the source is not completed
    /// or has no next stage, [`WorkflowError::InvalidAssignee`], and
    /// [`WorkflowError::Validation`] when the source was already handed off.
    pub async fn assign_next_stage(
        &self,
        actor: &Actor,
        request: NextStageRequest,
    ) -> WorkflowResult<Task> {
        let source = self.find_task_or_error(request.source_id).await?;
        ensure_can_act_on(actor, &source, "hand off other workers' tasks")?;

        let next_stage = source
            .task_type()
            .and_then(TaskType::successor)
            .ok_or_else(|| WorkflowError::Validation(format!(
                "task {} has no next stage",
                source.id()
            )))?;
        if source.status() != TaskStatus::Completed {
            return Err(WorkflowError::IllegalTransition {
                task_id: source.id(),
                from: source.status(),
                to: TaskStatus::Completed,
                task_type: TaskTypeLabel(source.task_type()),
            });
        }
        if request.printing_type.is_some() && next_stage != TaskType::Printing {
            return Err(WorkflowError::Validation(
                "printing type is only meaningful for printing tasks".to_owned(),
            ));
        }
        let assignee = self
            .resolver
            .resolve_manual(Some(next_stage), &request.assignee)
            .await?;
        if let Some(existing) = self.progression.find_successor(source.id(), next_stage).await? {
            return Err(WorkflowError::Validation(format!(
                "task {} was already handed off as {}",
                source.id(),
                existing.id()
            )));
        }

        let NextStageRequest {
            fallback_due_time,
            printing_type,
            ..
        } = request;
        let inherits_due_time = source.due_time().is_some();
        let created = self
            .progression
            .spawn(&source, next_stage, &assignee, actor, move |mut draft| {
                if let Some(time) = fallback_due_time.filter(|_| !inherits_due_time) {
                    draft = draft.with_due_time(time);
                }
                if let Some(kind) = printing_type {
                    draft = draft.with_printing_type(kind);
                }
                draft
            })
            .await?;
        self.workload
            .apply_change(&ChangeEvent::insert(created.clone()));
        Ok(created)
    }

    /// Deletes a task outright.
    ///
    /// Supervisory roles and the task's creator may delete.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NotFound`], [`WorkflowError::NotPermitted`],
    /// or collaborator errors.
    pub async fn delete_task(&self, actor: &Actor, task_id: TaskId) -> WorkflowResult<Task> {
        let task = self.find_task_or_error(task_id).await?;
        if !actor.is_supervisory() && task.created_by() != actor.worker_id() {
            return Err(WorkflowError::not_permitted(
                actor.role(),
                "delete tasks created by other workers",
            ));
        }
        self.store.delete(task_id).await?;
        self.workload
            .apply_change(&ChangeEvent::delete(task_id, Some(task.clone())));
        tracing::info!(%task_id, deleted_by = %actor.worker_id(), "task deleted");
        Ok(task)
    }

    /// Lists the tasks the actor may see, earliest due first.
    ///
    /// Supervisory roles see every task; everyone else sees their own.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::CollaboratorUnavailable`] when the store
    /// listing fails.
    pub async fn list_visible_tasks(&self, actor: &Actor) -> WorkflowResult<Vec<Task>> {
        let filter = if actor.is_supervisory() {
            TaskFilter::all()
        } else {
            TaskFilter::all().assigned_to(actor.worker_id().clone())
        };
        Ok(self.store.list(&filter.ordered_by(TaskOrder::DueDate)).await?)
    }

    /// Reconstructs the order history behind a task.
    ///
    /// Follows parent links for at most the configured number of hops and
    /// stops on cycles. Parents deleted from storage end the chain early.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NotFound`] when the starting task is missing,
    /// or collaborator errors.
    pub async fn trace_provenance(&self, task_id: TaskId) -> WorkflowResult<ProvenanceChain> {
        let start = self.find_task_or_error(task_id).await?;
        let mut walk = ProvenanceWalk::new(self.settings.max_provenance_depth);
        let mut step = walk.push(start);
        while let WalkStep::Follow(parent_id) = step {
            match self.store.get(parent_id).await? {
                Some(parent) => step = walk.push(parent),
                None => break,
            }
        }
        Ok(walk.finish())
    }
}

fn ensure_can_act_on(actor: &Actor, task: &Task, action: &'static str) -> WorkflowResult<()> {
    if actor.is_supervisory() || task.assignee_id() == actor.worker_id() {
        return Ok(());
    }
    Err(WorkflowError::not_permitted(actor.role(), action))
}

fn creation_draft(request: CreateTaskRequest, assignee: &Worker, actor: &Actor) -> TaskDraft {
    let mut draft = TaskDraft::new(
        request.title,
        assignee.id().clone(),
        assignee.display_name(),
        actor.worker_id().clone(),
        request.due_date,
    )
    .with_priority(request.priority);
    if let Some(task_type) = request.task_type {
        draft = draft.with_task_type(task_type);
    }
    if let Some(order_number) = request.order_number {
        draft = draft.with_order_number(order_number);
    }
    if let Some(description) = request.description {
        draft = draft.with_description(description);
    }
    if let Some(due_time) = request.due_time {
        draft = draft.with_due_time(due_time);
    }
    if let Some(attachment) = request.attachment {
        draft = draft.with_attachment(attachment);
    }
    if let Some(contact) = request.customer_contact {
        draft = draft.with_customer_contact(contact);
    }
    if let Some(printing_type) = request.printing_type {
        draft = draft.with_printing_type(printing_type);
    }
    draft
}
