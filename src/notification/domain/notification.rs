//! Notifications raised for a viewing session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::workflow::domain::TaskId;

/// Condition a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A task was newly assigned to, or became visible to, the viewer.
    NewTask,
    /// An open task passed its deadline.
    Overdue,
}

impl NotificationKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NewTask => "new_task",
            Self::Overdue => "overdue",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rendered alert about one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    task_id: TaskId,
    kind: NotificationKind,
    message: String,
    emitted_at: DateTime<Utc>,
}

impl Notification {
    /// Creates a notification.
    #[must_use]
    pub fn new(
        task_id: TaskId,
        kind: NotificationKind,
        message: impl Into<String>,
        emitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id,
            kind,
            message: message.into(),
            emitted_at,
        }
    }

    /// Returns the task the notification is about.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the reported condition.
    #[must_use]
    pub const fn kind(&self) -> NotificationKind {
        self.kind
    }

    /// Returns the rendered text.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns when the notification was produced.
    #[must_use]
    pub const fn emitted_at(&self) -> DateTime<Utc> {
        self.emitted_at
    }
}

/// Instruction for a notification sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationSignal {
    /// Raise a new alert.
    Emit(Notification),
    /// Update an outstanding alert in place without alerting again.
    Replace(Notification),
    /// Withdraw an outstanding alert.
    Retract {
        /// Task the alert was about.
        task_id: TaskId,
        /// Withdrawn condition.
        kind: NotificationKind,
    },
}

impl NotificationSignal {
    /// Returns the task the signal concerns.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        match self {
            Self::Emit(notification) | Self::Replace(notification) => notification.task_id,
            Self::Retract { task_id, .. } => *task_id,
        }
    }

    /// Returns the condition the signal concerns.
    #[must_use]
    pub const fn kind(&self) -> NotificationKind {
        match self {
            Self::Emit(notification) | Self::Replace(notification) => notification.kind,
            Self::Retract { kind, .. } => *kind,
        }
    }

    /// Returns `true` for a signal that raises a fresh alert.
    #[must_use]
    pub const fn is_emit(&self) -> bool {
        matches!(self, Self::Emit(_))
    }
}
