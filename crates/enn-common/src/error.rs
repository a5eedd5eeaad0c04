//! Error types for the epistemic network contract.
//!
//! The contract defines exactly three failure modes, all fatal to the
//! triggering call and never retried internally:
//! - structural shape mismatch between a declared and an actual tensor shape,
//! - an epistemic index outside the domain a network was initialized for,
//! - an invalid utility configuration caught before any numerics run.
//!
//! Numerical failures (NaN/Inf propagation) are not errors at this layer;
//! they belong to the numerical code that produced them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for epistemic network operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Invalid configuration (cluster counts, layer dimensions, rates).
    Config,
    /// Tensor shape incompatible with a declared shape.
    Shape,
    /// Epistemic index outside a network's valid index domain.
    Index,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Shape => write!(f, "shape"),
            ErrorCategory::Index => write!(f, "index"),
        }
    }
}

/// Unified error type for the workspace.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("shape mismatch in {context}: expected {expected:?}, got {actual:?}")]
    Shape {
        /// Which call rejected the batch (e.g. "EnsembleMlp::apply").
        context: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("index {index} outside valid domain {domain}")]
    IndexDomain {
        /// Display form of the offending index.
        index: String,
        /// Display form of the domain the network accepts.
        domain: String,
    },
}

impl Error {
    /// Shape error with expected/actual dims, capturing the call site name.
    pub fn shape(
        context: impl Into<String>,
        expected: impl Into<Vec<usize>>,
        actual: impl Into<Vec<usize>>,
    ) -> Self {
        Error::Shape {
            context: context.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Index-domain error from displayable index and domain descriptions.
    pub fn index_domain(index: impl ToString, domain: impl ToString) -> Self {
        Error::IndexDomain {
            index: index.to_string(),
            domain: domain.to_string(),
        }
    }

    /// Returns the stable error code for this error type.
    ///
    /// Codes are grouped by category: 10 config, 20-29 contract violations.
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::Shape { .. } => 20,
            Error::IndexDomain { .. } => 21,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) => ErrorCategory::Config,
            Error::Shape { .. } => ErrorCategory::Shape,
            Error::IndexDomain { .. } => ErrorCategory::Index,
        }
    }
}
