//! Order workflow for a print shop.
//!
//! Orders pass through designing, printing, and delivery. Each stage is a
//! task owned by a worker in the matching role, and finishing one stage
//! spawns the next. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
pub(crate) mod tests;
