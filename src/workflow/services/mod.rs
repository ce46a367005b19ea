//! Application services for the order workflow.
//!
//! [`WorkflowService`] is the public entry point. The other services are
//! exposed so the live feed and tests can drive them directly.

mod assignment;
mod error;
mod productivity;
mod progression;
mod requests;
mod workflow;
mod workload;

pub use assignment::{
    AssignmentOutcome, AssignmentResolver, TieBreak, authorize_creation, pick_least_loaded,
};
pub use error::{WorkflowError, WorkflowResult};
pub use productivity::{CounterDelta, ProductivityReconciler, counter_delta};
pub use progression::{HandoffOutcome, WorkflowProgression, successor_draft};
pub use requests::{
    AssigneeChoice, CreateTaskRequest, NextStageRequest, SideEffect, SideEffectFailure, TaskEdit,
    TransitionOutcome, TransitionReport,
};
pub use workflow::{WorkflowService, WorkflowSettings};
pub use workload::{DEFAULT_WORKLOAD_MAX_AGE_SECS, WorkloadIndex};
