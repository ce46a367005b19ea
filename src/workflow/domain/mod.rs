//! Domain model for the order workflow.
//!
//! Tasks move through production stages owned by different roles. The
//! domain holds the data model, status rules, and provenance traversal, and
//! stays free of persistence and transport concerns.

mod error;
mod ids;
mod provenance;
mod role;
mod status;
mod task;

pub use error::{
    ParsePriorityError, ParseRoleError, ParseTaskStatusError, ParseTaskTypeError,
    TaskDomainError, TaskTypeLabel,
};
pub use ids::{TaskId, WorkerId};
pub use provenance::{DEFAULT_MAX_PROVENANCE_DEPTH, ProvenanceChain, ProvenanceWalk, WalkStep};
pub use role::{Actor, Role, Worker};
pub use status::{Priority, TaskStatus, TaskType};
pub use task::{Task, TaskDraft, TaskPatch};
