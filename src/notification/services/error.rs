//! Error types for notification services.

use thiserror::Error;

use crate::notification::domain::NotificationKind;

/// Errors returned by notification services.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// A notification template failed to parse or render.
    #[error("invalid {kind} template: {reason}")]
    Template {
        /// Template the failure belongs to.
        kind: NotificationKind,
        /// Rendered cause.
        reason: String,
    },

    /// A live-feed background task panicked or was aborted.
    #[error("live feed task failed: {0}")]
    FeedTask(String),
}
