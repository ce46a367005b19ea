//! Worker roles, directory records, and the acting user.

use super::{ParseRoleError, TaskType, WorkerId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role held by a worker in the operations console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full administrative rights.
    Admin,
    /// Oversees all orders.
    Manager,
    /// Owns the designing stage.
    GraphicDesigner,
    /// Owns the printing stage.
    PrintingTechnician,
    /// Owns the delivery stage.
    DeliverySupervisor,
}

impl Role {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::GraphicDesigner => "graphic_designer",
            Self::PrintingTechnician => "printing_technician",
            Self::DeliverySupervisor => "delivery_supervisor",
        }
    }

    /// Returns the human-facing role name used by the directory.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Manager => "Manager",
            Self::GraphicDesigner => "Graphic Designer",
            Self::PrintingTechnician => "Printing Technician",
            Self::DeliverySupervisor => "Delivery Supervisor",
        }
    }

    /// Returns `true` for roles that oversee every task.
    #[must_use]
    pub const fn is_supervisory(self) -> bool {
        matches!(self, Self::Admin | Self::Manager)
    }

    /// Returns the stage this role owns, if it owns one.
    #[must_use]
    pub const fn owned_stage(self) -> Option<TaskType> {
        match self {
            Self::GraphicDesigner => Some(TaskType::Designing),
            Self::PrintingTechnician => Some(TaskType::Printing),
            Self::DeliverySupervisor => Some(TaskType::Delivery),
            Self::Admin | Self::Manager => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl TryFrom<&str> for Role {
    type Error = ParseRoleError;

    /// Accepts both directory display names ("Graphic Designer") and storage
    /// names ("graphic_designer").
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value
            .trim()
            .to_ascii_lowercase()
            .replace([' ', '-'], "_");
        match normalized.as_str() {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "graphic_designer" => Ok(Self::GraphicDesigner),
            "printing_technician" => Ok(Self::PrintingTechnician),
            "delivery_supervisor" => Ok(Self::DeliverySupervisor),
            _ => Err(ParseRoleError(value.to_owned())),
        }
    }
}

/// Directory record for a worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    id: WorkerId,
    display_name: String,
    role: Role,
}

impl Worker {
    /// Creates a worker record.
    #[must_use]
    pub fn new(id: WorkerId, display_name: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            role,
        }
    }

    /// Returns the stable worker identity.
    #[must_use]
    pub const fn id(&self) -> &WorkerId {
        &self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Returns the worker role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Returns `true` when this worker may own tasks of `task_type`.
    ///
    /// Ad-hoc tasks (no type) may be owned by anyone.
    #[must_use]
    pub fn is_eligible_for(&self, task_type: Option<TaskType>) -> bool {
        task_type.is_none_or(|stage| stage.eligible_role() == self.role)
    }
}

/// The user on whose behalf a workflow operation runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Actor {
    worker_id: WorkerId,
    role: Role,
}

impl Actor {
    /// Creates an actor.
    #[must_use]
    pub const fn new(worker_id: WorkerId, role: Role) -> Self {
        Self { worker_id, role }
    }

    /// Returns the acting worker identity.
    #[must_use]
    pub const fn worker_id(&self) -> &WorkerId {
        &self.worker_id
    }

    /// Returns the acting role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Returns `true` when the actor oversees every task.
    #[must_use]
    pub const fn is_supervisory(&self) -> bool {
        self.role.is_supervisory()
    }
}

impl From<&Worker> for Actor {
    fn from(worker: &Worker) -> Self {
        Self::new(worker.id().clone(), worker.role())
    }
}
