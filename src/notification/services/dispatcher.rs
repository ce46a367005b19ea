//! Single consumer that applies feed messages in arrival order.

use mockable::Clock;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::notification::{domain::NotificationSignal, ports::NotificationSink};
use crate::workflow::{
    domain::Task,
    ports::{ChangeEvent, TaskStore, WorkerDirectory},
    services::WorkloadIndex,
};

use super::EventNormalizer;

/// Work item on the dispatcher queue.
#[derive(Debug, Clone)]
pub enum FeedMessage {
    /// One change-feed delivery.
    Change(ChangeEvent),
    /// A full listing taken for reconciliation.
    Reload(Vec<Task>),
}

/// Feeds the normalizer and the workload index, then forwards signals to
/// the sink.
///
/// Owns all session state, so it must run on exactly one task.
pub struct NotificationDispatcher<S, D, K, C>
where
    S: TaskStore,
    D: WorkerDirectory,
    K: NotificationSink,
    C: Clock + Send + Sync,
{
    normalizer: EventNormalizer,
    workload: Arc<WorkloadIndex<S, D>>,
    sink: Arc<K>,
    clock: Arc<C>,
}

impl<S, D, K, C> NotificationDispatcher<S, D, K, C>
where
    S: TaskStore,
    D: WorkerDirectory,
    K: NotificationSink,
    C: Clock + Send + Sync,
{
    /// Creates a dispatcher.
    #[must_use]
    pub const fn new(
        normalizer: EventNormalizer,
        workload: Arc<WorkloadIndex<S, D>>,
        sink: Arc<K>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            normalizer,
            workload,
            sink,
            clock,
        }
    }

    /// Returns the session state.
    #[must_use]
    pub const fn normalizer(&self) -> &EventNormalizer {
        &self.normalizer
    }

    /// Applies one message and returns the number of signals delivered.
    ///
    /// Change events reach the workload index only once the normalizer has
    /// accepted them. Signals the sink rejects are handed back to the
    /// normalizer, so the next reload sends them again.
    pub async fn dispatch(&mut self, message: FeedMessage) -> usize {
        let now = self.clock.utc();
        let signals = match message {
            FeedMessage::Change(event) => match self.normalizer.admit(&event, now) {
                Some(signals) => {
                    self.workload.apply_change(&event);
                    signals
                }
                None => Vec::new(),
            },
            FeedMessage::Reload(tasks) => {
                self.workload.rebuild_from(&tasks, now);
                self.normalizer.reconcile(&tasks, now)
            }
        };
        self.deliver_all(signals).await
    }

    async fn deliver_all(&mut self, signals: Vec<NotificationSignal>) -> usize {
        let mut delivered = 0;
        for signal in signals {
            match self.sink.deliver(signal.clone()).await {
                Ok(()) => delivered += 1,
                Err(error) => {
                    tracing::warn!(
                        task_id = %signal.task_id(),
                        kind = %signal.kind(),
                        %error,
                        "notification signal not delivered; will retry on reload"
                    );
                    self.normalizer.delivery_failed(&signal);
                }
            }
        }
        delivered
    }

    /// Drains the queue until every sender is gone.
    pub async fn run(mut self, mut queue: mpsc::Receiver<FeedMessage>) {
        while let Some(message) = queue.recv().await {
            self.dispatch(message).await;
        }
        tracing::debug!(viewer = %self.normalizer.viewer().worker_id(), "notification dispatcher stopped");
    }
}
