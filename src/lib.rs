//! Orderflow: order workflow engine for a print shop.
//!
//! Orders move through designing, printing, and delivery. Each stage is a
//! task owned by a worker whose role matches it; completing a stage hands
//! the order on to the next, a per-worker counter tracks completed work,
//! and a live change feed drives de-duplicated notifications.
//!
//! # Architecture
//!
//! Orderflow follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for storage, the worker roster,
//!   the productivity ledger, and notification sinks
//! - **Adapters**: In-memory implementations of every port
//!
//! # Modules
//!
//! - [`workflow`]: Tasks, stage transitions, assignment, and hand-off
//! - [`notification`]: Change-feed normalization and alert fan-out
//! - [`config`]: TOML-backed configuration
//! - [`telemetry`]: Tracing subscriber set-up

pub mod config;
pub mod notification;
pub mod telemetry;
pub mod workflow;
