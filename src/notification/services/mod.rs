//! Services that turn the change feed into notifications.

mod dedupe;
mod dispatcher;
mod error;
mod feed;
mod normalizer;
mod templates;

pub use dedupe::{DEFAULT_DEDUPE_WINDOW_SECS, DedupeCache};
pub use dispatcher::{FeedMessage, NotificationDispatcher};
pub use error::NotificationError;
pub use feed::{
    DEFAULT_QUEUE_CAPACITY, DEFAULT_RELOAD_INTERVAL_SECS, FeedSettings, LiveFeed, LiveFeedHandle,
};
pub use normalizer::EventNormalizer;
pub use templates::{DEFAULT_NEW_TASK_TEMPLATE, DEFAULT_OVERDUE_TEMPLATE, NotificationTemplates};
