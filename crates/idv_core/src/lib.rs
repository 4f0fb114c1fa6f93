//! Identity-verification domain primitives.
//!
//! This crate owns the verification contracts, matching rules and the stage
//! state machine. It intentionally excludes AWS SDK and Lambda runtime
//! concerns; those live in `idv_lambda`.

pub mod contract;
pub mod details;
pub mod error;
pub mod events;
pub mod matching;
pub mod storage_keys;
pub mod validation;
pub mod workflow;
