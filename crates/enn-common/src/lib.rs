//! Shared error types for epistemic networks.
//!
//! Every fallible operation in the workspace returns [`Result`], and all
//! failures collapse into the single [`Error`] enum so that experiment
//! drivers can match on one type regardless of which crate produced it.

pub mod error;

pub use error::{Error, ErrorCategory, Result};
