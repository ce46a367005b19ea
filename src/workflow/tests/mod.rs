//! Unit tests for the order workflow.

mod assignment_tests;
pub(crate) mod support;
