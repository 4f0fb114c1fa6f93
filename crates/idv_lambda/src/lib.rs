//! AWS-oriented adapters and handlers for the identity-verification workflow.
//!
//! This crate owns runtime integration details (Lambda handlers, collaborator
//! adapters and configuration). Decision rules, contracts and the stage state
//! machine live in `idv_core`.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod telemetry;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
