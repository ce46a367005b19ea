//! In-memory sink that records every signal it receives.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::notification::{
    domain::{Notification, NotificationKind, NotificationSignal},
    ports::{NotificationSink, SinkError, SinkResult},
};
use crate::workflow::domain::TaskId;

/// Recording sink for tests and single-process embedding.
///
/// Keeps the full signal log and the set of alerts still outstanding.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    state: Arc<RwLock<SinkState>>,
}

#[derive(Debug, Default)]
struct SinkState {
    log: Vec<NotificationSignal>,
    outstanding: BTreeMap<(TaskId, NotificationKind), Notification>,
}

impl RecordingSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every signal received, in order.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Unavailable`] when the lock is poisoned.
    pub fn signals(&self) -> SinkResult<Vec<NotificationSignal>> {
        let state = self.read()?;
        Ok(state.log.clone())
    }

    /// Returns the alerts raised with [`NotificationSignal::Emit`].
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Unavailable`] when the lock is poisoned.
    pub fn emitted(&self) -> SinkResult<Vec<Notification>> {
        Ok(self
            .signals()?
            .into_iter()
            .filter_map(|signal| match signal {
                NotificationSignal::Emit(notification) => Some(notification),
                NotificationSignal::Replace(_) | NotificationSignal::Retract { .. } => None,
            })
            .collect())
    }

    /// Returns the alerts currently outstanding.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Unavailable`] when the lock is poisoned.
    pub fn outstanding(&self) -> SinkResult<Vec<Notification>> {
        let state = self.read()?;
        Ok(state.outstanding.values().cloned().collect())
    }

    fn read(&self) -> SinkResult<RwLockReadGuard<'_, SinkState>> {
        self.state
            .read()
            .map_err(|err| SinkError::unavailable(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> SinkResult<RwLockWriteGuard<'_, SinkState>> {
        self.state
            .write()
            .map_err(|err| SinkError::unavailable(std::io::Error::other(err.to_string())))
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn deliver(&self, signal: NotificationSignal) -> SinkResult<()> {
        let mut state = self.write()?;
        let key = (signal.task_id(), signal.kind());
        match &signal {
            NotificationSignal::Emit(notification) | NotificationSignal::Replace(notification) => {
                state.outstanding.insert(key, notification.clone());
            }
            NotificationSignal::Retract { .. } => {
                state.outstanding.remove(&key);
            }
        }
        state.log.push(signal);
        Ok(())
    }
}
