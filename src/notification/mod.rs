//! Live notifications for a viewing session.
//!
//! The store's change stream is at-least-once and loosely ordered. This
//! context normalizes it into one alert per new assignment or newly overdue
//! task, retracts alerts that no longer hold, and keeps the workload index
//! current as a side effect.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
