//! Epistemic neural network contract and reference architectures.
//!
//! An epistemic network produces an indexed family of predictions
//! `f(x, z)` rather than a single point prediction; varying the epistemic
//! index `z` traces out the network's predictive uncertainty. This crate
//! defines the three pieces a training or evaluation loop composes:
//!
//! - an [`Indexer`] that draws index values,
//! - a network implementing [`EpistemicNetwork`] (or its stateful
//!   sibling [`EpistemicNetworkWithState`]) with `init` and `apply`,
//! - an [`Output`] that uniformly exposes `preds()` whether or not the
//!   architecture adds a fixed prior term.
//!
//! The pieces are deliberately independent: the same network can be
//! paired with different indexers, and the same loop can drive any
//! architecture, purely through this contract.

pub mod adapter;
pub mod index;
pub mod network;
pub mod networks;
pub mod output;

pub use adapter::Stateless;
pub use index::{
    EnsembleIndexer, FixedIndexer, GaussianIndexer, Index, Indexer, ScaledGaussianIndexer,
};
pub use network::{Enn, EpistemicNetwork, EpistemicNetworkWithState};
pub use networks::{ConcatIndexMlp, EnsembleMlp, EnsembleWithPrior, MlpConfig, MlpParams};
pub use output::{Output, OutputWithPrior};
