//! Backward-linked order history across production stages.

use super::{Task, TaskId, TaskType, WorkerId};
use std::collections::HashSet;

/// Default number of parent hops followed when tracing an order.
pub const DEFAULT_MAX_PROVENANCE_DEPTH: usize = 5;

/// Reconstructed history of an order, newest task first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvenanceChain {
    links: Vec<Task>,
    truncated: bool,
}

impl ProvenanceChain {
    /// Returns the tasks in the chain, starting from the traced task.
    #[must_use]
    pub fn links(&self) -> &[Task] {
        &self.links
    }

    /// Returns `true` when the walk stopped at the depth cap or on a cycle
    /// rather than at the root of the order.
    #[must_use]
    pub const fn truncated(&self) -> bool {
        self.truncated
    }

    /// Returns the oldest task reached.
    #[must_use]
    pub fn root(&self) -> Option<&Task> {
        self.links.last()
    }

    /// Returns the identity of the worker who designed the order.
    ///
    /// Prefers the designing task's assignee when it is still in the chain
    /// and falls back to the designer marker carried by later stages.
    #[must_use]
    pub fn designer(&self) -> Option<&WorkerId> {
        self.stage_assignee(TaskType::Designing)
            .or_else(|| self.links.iter().find_map(Task::external_id))
    }

    /// Returns the identity of the worker who printed the order.
    #[must_use]
    pub fn printer(&self) -> Option<&WorkerId> {
        self.stage_assignee(TaskType::Printing)
            .or_else(|| self.links.iter().find_map(Task::external_parent_id))
    }

    /// Returns the identity of the worker delivering the order.
    #[must_use]
    pub fn deliverer(&self) -> Option<&WorkerId> {
        self.stage_assignee(TaskType::Delivery)
    }

    fn stage_assignee(&self, stage: TaskType) -> Option<&WorkerId> {
        self.links
            .iter()
            .find(|task| task.task_type() == Some(stage))
            .map(Task::assignee_id)
    }
}

/// Next action for a caller driving a [`ProvenanceWalk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStep {
    /// Load this parent and feed it back to the walk.
    Follow(TaskId),
    /// The walk is finished.
    Done,
}

/// Bounded, cycle-safe traversal over `parent_task_id` links.
///
/// The walk is storage-agnostic: the caller loads each requested parent and
/// pushes it, which keeps lookups in the service layer.
#[derive(Debug, Clone)]
pub struct ProvenanceWalk {
    max_depth: usize,
    visited: HashSet<TaskId>,
    links: Vec<Task>,
    truncated: bool,
}

impl ProvenanceWalk {
    /// Starts a walk that follows at most `max_depth` parent links.
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            visited: HashSet::new(),
            links: Vec::new(),
            truncated: false,
        }
    }

    /// Records a loaded task and returns what to load next.
    pub fn push(&mut self, task: Task) -> WalkStep {
        self.visited.insert(task.id());
        let parent = task.parent_task_id();
        self.links.push(task);

        let Some(parent_id) = parent else {
            return WalkStep::Done;
        };
        if self.visited.contains(&parent_id) || self.links.len() > self.max_depth {
            self.truncated = true;
            return WalkStep::Done;
        }
        WalkStep::Follow(parent_id)
    }

    /// Finishes the walk.
    #[must_use]
    pub fn finish(self) -> ProvenanceChain {
        ProvenanceChain {
            links: self.links,
            truncated: self.truncated,
        }
    }
}
