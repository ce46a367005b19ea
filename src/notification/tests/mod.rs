//! Unit tests for live notifications.

mod support;
