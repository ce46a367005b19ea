//! Turns raw change-feed events into per-session notification signals.

use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::notification::domain::{EventKey, Notification, NotificationKind, NotificationSignal};
use crate::workflow::{
    domain::{Actor, Task, TaskId},
    ports::{ChangeEvent, ChangeKind},
};

use super::{DedupeCache, NotificationTemplates};

/// Per-session view state for one viewer.
///
/// The feed delivers at least once and may reorder within short windows.
/// Each logical condition yields one alert: duplicate deliveries are
/// dropped by [`EventKey`], rows older than one already seen are ignored,
/// and deleted ids are tombstoned so late copies cannot resurrect them.
#[derive(Debug)]
pub struct EventNormalizer {
    viewer: Actor,
    templates: NotificationTemplates,
    seen_events: DedupeCache<EventKey>,
    tombstones: DedupeCache<TaskId>,
    known: HashSet<TaskId>,
    revisions: HashMap<TaskId, DateTime<Utc>>,
    outstanding: BTreeSet<(TaskId, NotificationKind)>,
    seeded: bool,
}

impl EventNormalizer {
    /// Creates an empty session for `viewer`.
    #[must_use]
    pub fn new(viewer: Actor, templates: NotificationTemplates, dedupe_window: Duration) -> Self {
        Self {
            viewer,
            templates,
            seen_events: DedupeCache::new(dedupe_window),
            tombstones: DedupeCache::new(dedupe_window),
            known: HashSet::new(),
            revisions: HashMap::new(),
            outstanding: BTreeSet::new(),
            seeded: false,
        }
    }

    /// Returns the session's viewer.
    #[must_use]
    pub const fn viewer(&self) -> &Actor {
        &self.viewer
    }

    /// Returns `true` when the session already tracks `task_id`.
    #[must_use]
    pub fn is_known(&self, task_id: TaskId) -> bool {
        self.known.contains(&task_id)
    }

    /// Returns the alerts currently outstanding, ordered by task.
    #[must_use]
    pub fn outstanding(&self) -> Vec<(TaskId, NotificationKind)> {
        self.outstanding.iter().copied().collect()
    }

    /// Folds one change event into the session.
    pub fn handle(&mut self, event: &ChangeEvent, now: DateTime<Utc>) -> Vec<NotificationSignal> {
        self.admit(event, now).unwrap_or_default()
    }

    /// Folds one change event into the session and reports whether it was
    /// accepted.
    ///
    /// Returns `None` for duplicates, rows older than one already seen, and
    /// late copies of deleted tasks. Only accepted events may update other
    /// views of the task set.
    pub fn admit(&mut self, event: &ChangeEvent, now: DateTime<Utc>) -> Option<Vec<NotificationSignal>> {
        self.seen_events.purge(now);
        self.tombstones.purge(now);

        let key = EventKey::of(event);
        if !self.seen_events.first_sighting(key, now) {
            tracing::trace!(task_id = %event.task_id(), kind = event.kind().as_str(), "duplicate change dropped");
            return None;
        }

        match (event.kind(), event.after()) {
            (ChangeKind::Delete, _) => Some(self.forget(event.task_id(), true, now)),
            (ChangeKind::Insert | ChangeKind::Update, Some(task)) => self
                .accept_revision(task, now)
                .then(|| self.observe_accepted(task, now)),
            (ChangeKind::Insert | ChangeKind::Update, None) => None,
        }
    }

    /// Rolls back the session state behind a signal the sink did not take,
    /// so the next reconciliation sends it again.
    pub fn delivery_failed(&mut self, signal: &NotificationSignal) {
        let key = (signal.task_id(), signal.kind());
        match signal {
            NotificationSignal::Emit(_) => {
                self.outstanding.remove(&key);
                if signal.kind() == NotificationKind::NewTask {
                    self.known.remove(&key.0);
                }
            }
            NotificationSignal::Replace(_) => {}
            NotificationSignal::Retract { .. } => {
                self.outstanding.insert(key);
            }
        }
    }

    /// Reconciles the session against a full listing.
    ///
    /// The first call seeds the session without announcing existing tasks.
    /// Later calls only announce conditions the session missed and retract
    /// alerts for tasks that vanished.
    pub fn reconcile(&mut self, tasks: &[Task], now: DateTime<Utc>) -> Vec<NotificationSignal> {
        self.seen_events.purge(now);
        self.tombstones.purge(now);
        let seeding = !self.seeded;
        self.seeded = true;

        let mut signals = Vec::new();
        let mut present = HashSet::with_capacity(tasks.len());
        for task in tasks {
            present.insert(task.id());
            if seeding {
                if self.accept_revision(task, now) && self.is_relevant(task) {
                    self.known.insert(task.id());
                    signals.extend(self.overdue_signal(task, now));
                }
            } else {
                signals.extend(self.observe(task, now));
            }
        }

        let mut vanished: Vec<TaskId> = self
            .known
            .iter()
            .copied()
            .filter(|task_id| !present.contains(task_id))
            .collect();
        vanished.sort_unstable();
        for task_id in vanished {
            signals.extend(self.forget(task_id, true, now));
        }
        let orphaned: Vec<(TaskId, NotificationKind)> = self
            .outstanding
            .iter()
            .copied()
            .filter(|(task_id, _)| !self.known.contains(task_id))
            .collect();
        for (task_id, kind) in orphaned {
            self.outstanding.remove(&(task_id, kind));
            signals.push(NotificationSignal::Retract { task_id, kind });
        }
        tracing::debug!(
            tasks = tasks.len(),
            signals = signals.len(),
            seeding,
            "notification session reconciled"
        );
        signals
    }

    fn observe(&mut self, task: &Task, now: DateTime<Utc>) -> Vec<NotificationSignal> {
        if !self.accept_revision(task, now) {
            return Vec::new();
        }
        self.observe_accepted(task, now)
    }

    fn observe_accepted(&mut self, task: &Task, now: DateTime<Utc>) -> Vec<NotificationSignal> {
        if !self.is_relevant(task) {
            return self.forget(task.id(), false, now);
        }

        let mut signals = Vec::new();
        if self.known.insert(task.id()) {
            self.outstanding.insert((task.id(), NotificationKind::NewTask));
            signals.push(NotificationSignal::Emit(
                self.notification(NotificationKind::NewTask, task, now),
            ));
        }
        signals.extend(self.overdue_signal(task, now));
        signals
    }

    fn accept_revision(&mut self, task: &Task, now: DateTime<Utc>) -> bool {
        if self.tombstones.contains(&task.id(), now) {
            tracing::debug!(task_id = %task.id(), "change for deleted task ignored");
            return false;
        }
        if self
            .revisions
            .get(&task.id())
            .is_some_and(|seen| task.last_updated() < *seen)
        {
            tracing::debug!(task_id = %task.id(), "out-of-order change ignored");
            return false;
        }
        self.revisions.insert(task.id(), task.last_updated());
        true
    }

    fn is_relevant(&self, task: &Task) -> bool {
        self.viewer.is_supervisory() || task.assignee_id() == self.viewer.worker_id()
    }

    fn overdue_signal(&mut self, task: &Task, now: DateTime<Utc>) -> Option<NotificationSignal> {
        let key = (task.id(), NotificationKind::Overdue);
        match (self.outstanding.contains(&key), task.is_overdue(now)) {
            (false, true) => {
                self.outstanding.insert(key);
                Some(NotificationSignal::Emit(
                    self.notification(NotificationKind::Overdue, task, now),
                ))
            }
            (true, true) => Some(NotificationSignal::Replace(
                self.notification(NotificationKind::Overdue, task, now),
            )),
            (true, false) => {
                self.outstanding.remove(&key);
                Some(NotificationSignal::Retract {
                    task_id: task.id(),
                    kind: NotificationKind::Overdue,
                })
            }
            (false, false) => None,
        }
    }

    fn forget(&mut self, task_id: TaskId, deleted: bool, now: DateTime<Utc>) -> Vec<NotificationSignal> {
        self.known.remove(&task_id);
        if deleted {
            self.revisions.remove(&task_id);
            self.tombstones.insert(task_id, now);
        }
        [NotificationKind::NewTask, NotificationKind::Overdue]
            .into_iter()
            .filter(|kind| self.outstanding.remove(&(task_id, *kind)))
            .map(|kind| NotificationSignal::Retract { task_id, kind })
            .collect()
    }

    fn notification(&self, kind: NotificationKind, task: &Task, now: DateTime<Utc>) -> Notification {
        let message = self.templates.render(kind, task).unwrap_or_else(|error| {
            tracing::warn!(task_id = %task.id(), %error, "notification template failed; using title");
            task.title().to_owned()
        });
        Notification::new(task.id(), kind, message, now)
    }
}
