//! The epistemic network calling conventions.
//!
//! A concrete architecture (ensemble, prior-augmented ensemble,
//! index-conditioned MLP) plugs into training and evaluation code through
//! one of two fixed conventions, chosen once per network:
//!
//! - [`EpistemicNetwork`]: stateless. `apply` is a pure function of
//!   `(params, inputs, index)`; the same triple always produces
//!   bit-identical output.
//! - [`EpistemicNetworkWithState`]: stateful. `apply` threads an explicit
//!   state value (e.g. normalization statistics) in and out; determinism
//!   holds for identical inputs *and* identical incoming state.
//!
//! Parameters are opaque to callers: each network declares its own
//! `Params` associated type, created by `init` and read (never mutated)
//! by `apply`. Sharing a `Params` value across concurrent `apply` calls
//! is sound; everything is taken by shared reference.
//!
//! Downstream loops that want a single convention should lift stateless
//! networks with [`crate::adapter::Stateless`] rather than duplicating
//! logic per convention.

use enn_common::Result;
use ndarray::Array2;
use rand::RngCore;

use crate::index::{Index, Indexer};
use crate::output::Output;

/// Stateless epistemic network: `y = f(params, x, z)`.
pub trait EpistemicNetwork {
    /// Trainable parameter structure owned by the caller after `init`.
    type Params;

    /// Create parameters deterministically from `seed`.
    ///
    /// Fails with a shape error if `inputs` is structurally incompatible
    /// with the network's declared input shape. Must not touch any
    /// process-wide state.
    fn init(&self, seed: u64, inputs: &Array2<f64>, index: &Index) -> Result<Self::Params>;

    /// Evaluate the family member selected by `index` on `inputs`.
    ///
    /// Pure in all three arguments. Fails with a shape error on a
    /// structural mismatch, or an index-domain error if `index` lies
    /// outside the domain the network was initialized for.
    fn apply(&self, params: &Self::Params, inputs: &Array2<f64>, index: &Index) -> Result<Output>;
}

/// Stateful epistemic network threading explicit auxiliary state.
pub trait EpistemicNetworkWithState {
    type Params;
    /// Mutable auxiliary data distinct from `Params` (never touched by
    /// the optimizer), returned alongside every prediction.
    type State;

    fn init(
        &self,
        seed: u64,
        inputs: &Array2<f64>,
        index: &Index,
    ) -> Result<(Self::Params, Self::State)>;

    fn apply(
        &self,
        params: &Self::Params,
        state: &Self::State,
        inputs: &Array2<f64>,
        index: &Index,
    ) -> Result<(Output, Self::State)>;
}

/// Pairing of a network with the indexer that drives it.
///
/// This is the unit a training loop consumes: it only ever calls
/// `sample_index`, `init`, and `apply` through the fixed contract, so
/// architectures and index distributions can be swapped independently.
#[derive(Debug, Clone)]
pub struct Enn<N, I> {
    pub network: N,
    pub indexer: I,
}

impl<N, I> Enn<N, I>
where
    N: EpistemicNetwork,
    I: Indexer,
{
    pub fn new(network: N, indexer: I) -> Self {
        Self { network, indexer }
    }

    /// Draw one epistemic index from the paired indexer.
    pub fn sample_index(&self, rng: &mut dyn RngCore) -> Index {
        self.indexer.sample(rng)
    }

    /// Initialize parameters using a freshly sampled index.
    pub fn init(
        &self,
        seed: u64,
        inputs: &Array2<f64>,
        rng: &mut dyn RngCore,
    ) -> Result<N::Params> {
        let index = self.indexer.sample(rng);
        self.network.init(seed, inputs, &index)
    }

    /// Sample an index and evaluate the corresponding family member.
    pub fn apply_sampled(
        &self,
        params: &N::Params,
        inputs: &Array2<f64>,
        rng: &mut dyn RngCore,
    ) -> Result<(Index, Output)> {
        let index = self.indexer.sample(rng);
        let output = self.network.apply(params, inputs, &index)?;
        Ok((index, output))
    }
}
