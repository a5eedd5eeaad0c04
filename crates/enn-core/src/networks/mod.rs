//! Concrete network architectures implementing the epistemic contract.

pub mod ensemble;
pub mod mlp;
pub mod priors;

pub use ensemble::EnsembleMlp;
pub use mlp::{ConcatIndexMlp, LinearParams, MlpConfig, MlpParams};
pub use priors::EnsembleWithPrior;
