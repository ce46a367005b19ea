//! Shared fixtures for notification unit tests.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::notification::{
    domain::NotificationSignal,
    services::{DEFAULT_DEDUPE_WINDOW_SECS, EventNormalizer, NotificationTemplates},
};
use crate::workflow::{
    domain::{Task, TaskPatch, Worker},
    tests::support::{actor, roster},
};

pub use crate::workflow::tests::support::{ManualClock, start, task_for};

pub fn member(id: &str) -> Worker {
    roster()
        .into_iter()
        .find(|candidate| candidate.id().as_str() == id)
        .expect("roster should hold the worker")
}

pub fn session_for(viewer: &str) -> EventNormalizer {
    EventNormalizer::new(
        actor(&member(viewer)),
        NotificationTemplates::default(),
        Duration::seconds(DEFAULT_DEDUPE_WINDOW_SECS),
    )
}

/// The morning after the fixture due date, when open tasks are overdue.
pub fn day_after_due() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 6, 10, 0, 0)
        .single()
        .expect("fixed instant should be valid")
}

/// Returns `task` with `patch` applied and its revision moved to `at`.
pub fn revised(task: &Task, at: DateTime<Utc>, patch: TaskPatch) -> Task {
    let mut next = task.clone();
    next.apply_patch(TaskPatch {
        last_updated: Some(at),
        ..patch
    })
    .expect("fixture patch should apply");
    next
}

/// Renders signals as `(verb, kind)` pairs for compact assertions.
pub fn summary(signals: &[NotificationSignal]) -> Vec<(&'static str, &'static str)> {
    signals
        .iter()
        .map(|signal| {
            let verb = match signal {
                NotificationSignal::Emit(_) => "emit",
                NotificationSignal::Replace(_) => "replace",
                NotificationSignal::Retract { .. } => "retract",
            };
            (verb, signal.kind().as_str())
        })
        .collect()
}
