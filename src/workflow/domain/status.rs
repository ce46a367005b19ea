//! Task status, production stage, and priority value types.

use super::{ParsePriorityError, ParseTaskStatusError, ParseTaskTypeError, Role};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Production stage a task belongs to.
///
/// Stages run in a fixed order: designing, then printing, then delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Artwork is being designed.
    Designing,
    /// The design is being printed.
    Printing,
    /// The printed order is being delivered.
    Delivery,
}

impl TaskType {
    /// Every stage in production order.
    pub const ALL: [Self; 3] = [Self::Designing, Self::Printing, Self::Delivery];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Designing => "designing",
            Self::Printing => "printing",
            Self::Delivery => "delivery",
        }
    }

    /// Returns the stage that precedes this one, if any.
    #[must_use]
    pub const fn predecessor(self) -> Option<Self> {
        match self {
            Self::Designing => None,
            Self::Printing => Some(Self::Designing),
            Self::Delivery => Some(Self::Printing),
        }
    }

    /// Returns the stage that follows this one, if any.
    #[must_use]
    pub const fn successor(self) -> Option<Self> {
        match self {
            Self::Designing => Some(Self::Printing),
            Self::Printing => Some(Self::Delivery),
            Self::Delivery => None,
        }
    }

    /// Returns the role whose workers own this stage.
    #[must_use]
    pub const fn eligible_role(self) -> Role {
        match self {
            Self::Designing => Role::GraphicDesigner,
            Self::Printing => Role::PrintingTechnician,
            Self::Delivery => Role::DeliverySupervisor,
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskType {
    type Error = ParseTaskTypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "designing" => Ok(Self::Designing),
            "printing" => Ok(Self::Printing),
            "delivery" => Ok(Self::Delivery),
            _ => Err(ParseTaskTypeError(value.to_owned())),
        }
    }
}

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Assigned but not started.
    Pending,
    /// Work is underway.
    InProgress,
    /// Work for this stage is finished.
    Completed,
    /// The order reached the customer. Delivery tasks only.
    Delivered,
    /// Delivery was attempted and failed. Delivery tasks only.
    NotDelivered,
}

impl TaskStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::InProgress,
        Self::Completed,
        Self::Delivered,
        Self::NotDelivered,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Delivered => "delivered",
            Self::NotDelivered => "not_delivered",
        }
    }

    /// Returns `true` for statuses that count towards a worker's open load.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }

    /// Returns `true` when no further transitions are accepted.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::NotDelivered)
    }

    /// Returns `true` when the status may only be held by delivery tasks.
    #[must_use]
    pub const fn is_delivery_outcome(self) -> bool {
        self.is_terminal()
    }

    /// Returns `true` when a task of `task_type` may hold this status.
    #[must_use]
    pub fn is_legal_for(self, task_type: Option<TaskType>) -> bool {
        !self.is_delivery_outcome() || task_type == Some(TaskType::Delivery)
    }

    /// Returns `true` when a task of `task_type` may move from `self` to
    /// `target`.
    ///
    /// Pending, in-progress, and completed are freely interchangeable so
    /// callers other than the UI can reopen work. Delivery outcomes are only
    /// reachable from completed delivery tasks and accept nothing afterwards.
    /// A move to the current status is not a transition.
    #[must_use]
    pub fn can_transition_to(self, target: Self, task_type: Option<TaskType>) -> bool {
        if self == target || self.is_terminal() || !target.is_legal_for(task_type) {
            return false;
        }
        match target {
            Self::Pending | Self::InProgress | Self::Completed => true,
            Self::Delivered | Self::NotDelivered => self == Self::Completed,
        }
    }

    /// Returns every status a task of `task_type` may move to from `self`.
    #[must_use]
    pub fn legal_successors(self, task_type: Option<TaskType>) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|target| self.can_transition_to(*target, task_type))
            .collect()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "delivered" => Ok(Self::Delivered),
            "not_delivered" => Ok(Self::NotDelivered),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Can wait.
    Low,
    /// Normal urgency.
    #[default]
    Medium,
    /// Needs attention first.
    High,
}

impl Priority {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Priority {
    type Error = ParsePriorityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ParsePriorityError(value.to_owned())),
        }
    }
}
