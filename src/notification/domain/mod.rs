//! Domain types for session notifications.

mod key;
mod notification;

pub use key::EventKey;
pub use notification::{Notification, NotificationKind, NotificationSignal};
