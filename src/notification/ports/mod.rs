//! Port contracts for notification delivery.

pub mod sink;

pub use sink::{NotificationSink, SinkError, SinkResult};
