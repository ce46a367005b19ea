//! Worker selection for new tasks and the creation-rights gate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::workflow::{
    domain::{Actor, Role, TaskType, Worker, WorkerId},
    ports::{TaskStore, WorkerDirectory},
};

use super::{WorkflowError, WorkflowResult, WorkloadIndex};

/// Deterministic ordering applied to candidates before picking the least
/// loaded one. The first candidate wins a tie.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Lexicographic worker identity.
    #[default]
    WorkerId,
    /// The order the directory returned.
    DirectoryOrder,
}

/// Result of automatic assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentOutcome {
    /// A worker was selected.
    Assigned(Worker),
    /// Nobody holds the stage's role.
    NoEligibleWorker(TaskType),
}

/// Returns the first candidate with the smallest open-task count.
#[must_use]
pub fn pick_least_loaded<'a, I>(candidates: I) -> Option<&'a Worker>
where
    I: IntoIterator<Item = (&'a Worker, usize)>,
{
    let mut best: Option<(&'a Worker, usize)> = None;
    for (worker, open) in candidates {
        if best.is_none_or(|(_, lowest)| open < lowest) {
            best = Some((worker, open));
        }
    }
    best.map(|(worker, _)| worker)
}

/// Checks that `actor` may create a new task of `task_type` for `assignee`.
///
/// Admins and managers may create any task. A graphic designer may only
/// create designing tasks assigned to themselves. Other roles never create
/// tasks.
///
/// # Errors
///
/// Returns [`WorkflowError::NotPermitted`] when the gate refuses.
pub fn authorize_creation(
    actor: &Actor,
    task_type: Option<TaskType>,
    assignee: Option<&WorkerId>,
) -> WorkflowResult<()> {
    match actor.role() {
        Role::Admin | Role::Manager => Ok(()),
        Role::GraphicDesigner => {
            if task_type != Some(TaskType::Designing) {
                return Err(WorkflowError::not_permitted(
                    actor.role(),
                    "create tasks outside the designing stage",
                ));
            }
            if assignee != Some(actor.worker_id()) {
                return Err(WorkflowError::not_permitted(
                    actor.role(),
                    "assign new tasks to other workers",
                ));
            }
            Ok(())
        }
        Role::PrintingTechnician | Role::DeliverySupervisor => {
            Err(WorkflowError::not_permitted(actor.role(), "create tasks"))
        }
    }
}

/// Chooses the worker for a new task.
pub struct AssignmentResolver<S, D>
where
    S: TaskStore,
    D: WorkerDirectory,
{
    directory: Arc<D>,
    workload: Arc<WorkloadIndex<S, D>>,
    tie_break: TieBreak,
}

impl<S, D> AssignmentResolver<S, D>
where
    S: TaskStore,
    D: WorkerDirectory,
{
    /// Creates a resolver backed by the directory and workload index.
    #[must_use]
    pub const fn new(
        directory: Arc<D>,
        workload: Arc<WorkloadIndex<S, D>>,
        tie_break: TieBreak,
    ) -> Self {
        Self {
            directory,
            workload,
            tie_break,
        }
    }

    /// Validates an explicitly chosen worker.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidAssignee`] when the worker is unknown
    /// or holds the wrong role, and
    /// [`WorkflowError::CollaboratorUnavailable`] when the directory fails.
    pub async fn resolve_manual(
        &self,
        task_type: Option<TaskType>,
        worker_id: &WorkerId,
    ) -> WorkflowResult<Worker> {
        let worker = self
            .directory
            .find(worker_id)
            .await?
            .ok_or_else(|| WorkflowError::invalid_assignee(worker_id.clone(), task_type))?;
        if !worker.is_eligible_for(task_type) {
            return Err(WorkflowError::invalid_assignee(worker_id.clone(), task_type));
        }
        Ok(worker)
    }

    /// Picks the least-loaded eligible worker for `task_type`.
    ///
    /// A single candidate is taken without consulting the workload index.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::CollaboratorUnavailable`] when the directory
    /// or the index reload fails.
    pub async fn resolve_automatic(
        &self,
        task_type: TaskType,
        now: DateTime<Utc>,
    ) -> WorkflowResult<AssignmentOutcome> {
        let mut candidates = self.workload.eligible_workers_for(task_type).await?;
        if self.tie_break == TieBreak::WorkerId {
            candidates.sort_by(|left, right| left.id().cmp(right.id()));
        }

        let chosen = match candidates.as_slice() {
            [] => {
                tracing::warn!(%task_type, "no eligible worker for automatic assignment");
                return Ok(AssignmentOutcome::NoEligibleWorker(task_type));
            }
            [only] => only.clone(),
            many => {
                self.workload.ensure_fresh(now).await?;
                let loads = many
                    .iter()
                    .map(|worker| (worker, self.workload.open_count_for(worker.id())));
                match pick_least_loaded(loads) {
                    Some(worker) => worker.clone(),
                    None => return Ok(AssignmentOutcome::NoEligibleWorker(task_type)),
                }
            }
        };

        tracing::info!(
            %task_type,
            worker_id = %chosen.id(),
            open_tasks = self.workload.open_count_for(chosen.id()),
            "automatic assignment selected worker"
        );
        Ok(AssignmentOutcome::Assigned(chosen))
    }
}
