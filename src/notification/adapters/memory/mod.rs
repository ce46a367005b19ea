//! In-memory notification adapters.

mod sink;

pub use sink::RecordingSink;
