//! Sink port receiving notification signals.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::notification::domain::NotificationSignal;

/// Result type for notification sink operations.
pub type SinkResult<T> = Result<T, SinkError>;

/// Destination for notification signals, such as a toast surface.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Delivers one signal.
    async fn deliver(&self, signal: NotificationSignal) -> SinkResult<()>;
}

/// Errors returned by notification sinks.
#[derive(Debug, Clone, Error)]
pub enum SinkError {
    /// The sink could not accept the signal.
    #[error("notification sink unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl SinkError {
    /// Wraps a delivery error.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
