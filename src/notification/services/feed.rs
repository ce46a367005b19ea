//! Wiring from the store's change stream to the dispatcher.

use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::notification::ports::NotificationSink;
use crate::workflow::ports::{ChangeEvent, TaskFilter, TaskStore, WorkerDirectory};

use super::{FeedMessage, NotificationDispatcher, NotificationError};

/// Default capacity of the dispatcher queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Default period of the reconciliation reload.
pub const DEFAULT_RELOAD_INTERVAL_SECS: u64 = 300;

/// Tunables for [`LiveFeed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedSettings {
    /// Bounded queue size between the pump and the dispatcher.
    pub queue_capacity: usize,
    /// Period of the reconciliation reload.
    pub reload_interval: Duration,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            reload_interval: Duration::from_secs(DEFAULT_RELOAD_INTERVAL_SECS),
        }
    }
}

/// Background pump plus dispatcher for one viewing session.
pub struct LiveFeed;

impl LiveFeed {
    /// Subscribes to `store` and starts the session's background tasks.
    ///
    /// The first message the dispatcher sees is a full listing, which seeds
    /// the session. The pump subscribes only after that listing, so a task
    /// created in between arrives as a change or at the next reload and is
    /// announced either way. A lagged subscription forces another listing.
    /// Must be called inside a Tokio runtime.
    #[must_use]
    pub fn spawn<S, D, K, C>(
        store: Arc<S>,
        dispatcher: NotificationDispatcher<S, D, K, C>,
        settings: FeedSettings,
    ) -> LiveFeedHandle
    where
        S: TaskStore + 'static,
        D: WorkerDirectory + 'static,
        K: NotificationSink + 'static,
        C: Clock + Send + Sync + 'static,
    {
        let (queue_tx, queue_rx) = mpsc::channel(settings.queue_capacity.max(1));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let reload = Arc::new(Notify::new());

        let pump = tokio::spawn(pump_changes(
            store,
            queue_tx,
            shutdown_rx,
            Arc::clone(&reload),
            settings.reload_interval.max(Duration::from_secs(1)),
        ));
        let dispatcher = tokio::spawn(dispatcher.run(queue_rx));

        LiveFeedHandle {
            shutdown: shutdown_tx,
            reload,
            pump,
            dispatcher,
        }
    }
}

/// Control handle for a running [`LiveFeed`].
pub struct LiveFeedHandle {
    shutdown: oneshot::Sender<()>,
    reload: Arc<Notify>,
    pump: JoinHandle<()>,
    dispatcher: JoinHandle<()>,
}

impl LiveFeedHandle {
    /// Asks the pump for a reconciliation reload now.
    pub fn request_reload(&self) {
        self.reload.notify_one();
    }

    /// Stops the pump, lets the dispatcher drain its queue, and waits for
    /// both tasks.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError::FeedTask`] when either task panicked.
    pub async fn shutdown(self) -> Result<(), NotificationError> {
        if self.shutdown.send(()).is_err() {
            tracing::debug!("live feed pump already stopped");
        }
        self.pump
            .await
            .map_err(|error| NotificationError::FeedTask(error.to_string()))?;
        self.dispatcher
            .await
            .map_err(|error| NotificationError::FeedTask(error.to_string()))
    }
}

async fn pump_changes<S>(
    store: Arc<S>,
    queue: mpsc::Sender<FeedMessage>,
    mut shutdown: oneshot::Receiver<()>,
    reload: Arc<Notify>,
    reload_interval: Duration,
) where
    S: TaskStore,
{
    let seed = store.list(&TaskFilter::all()).await;
    let mut changes: broadcast::Receiver<ChangeEvent> = store.subscribe();
    let seeded = match seed {
        Ok(tasks) => queue.send(FeedMessage::Reload(tasks)).await.is_ok(),
        Err(error) => {
            tracing::warn!(%error, "seed listing failed; waiting for the next reload");
            true
        }
    };
    if !seeded {
        tracing::debug!("dispatcher queue closed before seeding");
        return;
    }
    let mut ticker = tokio::time::interval_at(Instant::now() + reload_interval, reload_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let forwarded = tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = ticker.tick() => send_reload(store.as_ref(), &queue).await,
            () = reload.notified() => send_reload(store.as_ref(), &queue).await,
            received = changes.recv() => match received {
                Ok(event) => queue.send(FeedMessage::Change(event)).await.is_ok(),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "change feed lagged; forcing reload");
                    send_reload(store.as_ref(), &queue).await
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("change feed closed");
                    break;
                }
            },
        };
        if !forwarded {
            tracing::debug!("dispatcher queue closed; stopping pump");
            break;
        }
    }
}

async fn send_reload<S>(store: &S, queue: &mpsc::Sender<FeedMessage>) -> bool
where
    S: TaskStore,
{
    match store.list(&TaskFilter::all()).await {
        Ok(tasks) => queue.send(FeedMessage::Reload(tasks)).await.is_ok(),
        Err(error) => {
            tracing::warn!(%error, "reconciliation reload failed; keeping current view");
            true
        }
    }
}
