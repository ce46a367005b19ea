//! Identity of a change-feed delivery for duplicate suppression.

use chrono::{DateTime, Utc};
use std::hash::{DefaultHasher, Hash, Hasher};

use crate::workflow::{
    domain::{Task, TaskId},
    ports::{ChangeEvent, ChangeKind},
};

/// Dedupe key for one logical change.
///
/// Two deliveries share a key only when they carry the same row content.
/// The revision alone is not enough: stores stamp `last_updated` with
/// limited precision, so distinct writes can share a stamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventKey {
    task_id: TaskId,
    kind: ChangeKind,
    revision: Option<DateTime<Utc>>,
    fingerprint: Option<u64>,
}

impl EventKey {
    /// Derives the key of a change event.
    #[must_use]
    pub fn of(event: &ChangeEvent) -> Self {
        let row = event.after().or_else(|| event.before());
        Self {
            task_id: event.task_id(),
            kind: event.kind(),
            revision: row.map(Task::last_updated),
            fingerprint: row.map(fingerprint),
        }
    }

    /// Returns the task the change touched.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the change kind.
    #[must_use]
    pub const fn kind(&self) -> ChangeKind {
        self.kind
    }

    /// Returns the row revision, when the event carried a row.
    #[must_use]
    pub const fn revision(&self) -> Option<DateTime<Utc>> {
        self.revision
    }
}

fn fingerprint(task: &Task) -> u64 {
    let mut hasher = DefaultHasher::new();
    task.hash(&mut hasher);
    hasher.finish()
}
