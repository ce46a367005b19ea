//! Step definitions for order chain scenarios.

mod given;
mod then;
mod when;
pub mod world;
