//! In-memory task store with a broadcast change feed.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;

use crate::workflow::{
    domain::{Task, TaskId, TaskPatch, TaskStatus, WorkerId},
    ports::{ChangeEvent, TaskFilter, TaskStore, TaskStoreError, TaskStoreResult},
};

/// Default capacity of the change feed buffer.
const DEFAULT_FEED_CAPACITY: usize = 1024;

/// Thread-safe in-memory task store.
#[derive(Debug, Clone)]
pub struct InMemoryTaskStore {
    state: Arc<RwLock<InMemoryTaskState>>,
    events: broadcast::Sender<ChangeEvent>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, Task>,
    insertion_order: Vec<TaskId>,
}

impl InMemoryTaskState {
    fn ordered(&self) -> impl Iterator<Item = &Task> {
        self.insertion_order
            .iter()
            .filter_map(|id| self.tasks.get(id))
    }
}

impl InMemoryTaskStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_feed_capacity(DEFAULT_FEED_CAPACITY)
    }

    /// Creates an empty store whose change feed buffers `capacity` events
    /// per subscriber before lagging.
    #[must_use]
    pub fn with_feed_capacity(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            state: Arc::new(RwLock::new(InMemoryTaskState::default())),
            events,
        }
    }

    /// Re-publishes an event on the change feed.
    ///
    /// Simulates the transport redelivering or reordering rows.
    pub fn publish(&self, event: ChangeEvent) {
        if self.events.send(event).is_err() {
            tracing::trace!("change event dropped: no subscribers");
        }
    }

    /// Returns the number of stored tasks.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Unavailable`] when the lock is poisoned.
    pub fn len(&self) -> TaskStoreResult<usize> {
        Ok(self.read()?.tasks.len())
    }

    /// Returns `true` when the store holds no tasks.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Unavailable`] when the lock is poisoned.
    pub fn is_empty(&self) -> TaskStoreResult<bool> {
        Ok(self.len()? == 0)
    }

    fn read(&self) -> TaskStoreResult<RwLockReadGuard<'_, InMemoryTaskState>> {
        self.state
            .read()
            .map_err(|err| TaskStoreError::unavailable(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> TaskStoreResult<RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state
            .write()
            .map_err(|err| TaskStoreError::unavailable(std::io::Error::other(err.to_string())))
    }

    fn patch_locked(
        &self,
        state: &mut InMemoryTaskState,
        id: TaskId,
        patch: TaskPatch,
    ) -> TaskStoreResult<()> {
        let task = state
            .tasks
            .get_mut(&id)
            .ok_or(TaskStoreError::NotFound(id))?;
        let before = task.clone();
        task.apply_patch(patch)
            .map_err(|err| TaskStoreError::Validation(err.to_string()))?;
        self.publish(ChangeEvent::update(Some(before), task.clone()));
        Ok(())
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn create(&self, task: Task) -> TaskStoreResult<Task> {
        let mut state = self.write()?;
        if state.tasks.contains_key(&task.id()) {
            return Err(TaskStoreError::Validation(format!(
                "duplicate task identifier: {}",
                task.id()
            )));
        }
        state.insertion_order.push(task.id());
        state.tasks.insert(task.id(), task.clone());
        self.publish(ChangeEvent::insert(task.clone()));
        Ok(task)
    }

    async fn update(&self, id: TaskId, patch: TaskPatch) -> TaskStoreResult<()> {
        let mut state = self.write()?;
        self.patch_locked(&mut state, id, patch)
    }

    async fn update_if_status(
        &self,
        id: TaskId,
        expected: TaskStatus,
        patch: TaskPatch,
    ) -> TaskStoreResult<bool> {
        let mut state = self.write()?;
        let current = state
            .tasks
            .get(&id)
            .ok_or(TaskStoreError::NotFound(id))?
            .status();
        if current != expected {
            return Ok(false);
        }
        self.patch_locked(&mut state, id, patch)?;
        Ok(true)
    }

    async fn delete(&self, id: TaskId) -> TaskStoreResult<()> {
        let mut state = self.write()?;
        let removed = state.tasks.remove(&id).ok_or(TaskStoreError::NotFound(id))?;
        state.insertion_order.retain(|existing| *existing != id);
        self.publish(ChangeEvent::delete(id, Some(removed)));
        Ok(())
    }

    async fn get(&self, id: TaskId) -> TaskStoreResult<Option<Task>> {
        Ok(self.read()?.tasks.get(&id).cloned())
    }

    async fn list(&self, filter: &TaskFilter) -> TaskStoreResult<Vec<Task>> {
        let state = self.read()?;
        Ok(filter.apply(state.ordered()))
    }

    async fn list_by_assignee(&self, worker_id: &WorkerId) -> TaskStoreResult<Vec<Task>> {
        let state = self.read()?;
        Ok(state
            .ordered()
            .filter(|task| task.assignee_id() == worker_id)
            .cloned()
            .collect())
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }
}
