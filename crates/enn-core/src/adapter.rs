//! Lifting stateless networks into the stateful convention.
//!
//! The stateful convention is the canonical one for generic loops: a
//! stateless network becomes stateful with a trivial `()` state, so
//! downstream code is written once against
//! [`EpistemicNetworkWithState`].

use enn_common::Result;
use ndarray::Array2;

use crate::index::Index;
use crate::network::{EpistemicNetwork, EpistemicNetworkWithState};
use crate::output::Output;

/// Wrapper giving a stateless network the stateful call shape.
#[derive(Debug, Clone)]
pub struct Stateless<N>(pub N);

impl<N> Stateless<N> {
    pub fn new(network: N) -> Self {
        Self(network)
    }

    /// The wrapped stateless network.
    pub fn inner(&self) -> &N {
        &self.0
    }
}

impl<N: EpistemicNetwork> EpistemicNetworkWithState for Stateless<N> {
    type Params = N::Params;
    type State = ();

    fn init(
        &self,
        seed: u64,
        inputs: &Array2<f64>,
        index: &Index,
    ) -> Result<(Self::Params, Self::State)> {
        Ok((self.0.init(seed, inputs, index)?, ()))
    }

    fn apply(
        &self,
        params: &Self::Params,
        _state: &Self::State,
        inputs: &Array2<f64>,
        index: &Index,
    ) -> Result<(Output, Self::State)> {
        Ok((self.0.apply(params, inputs, index)?, ()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::networks::{EnsembleMlp, MlpConfig};
    use ndarray::Array2;

    fn small_ensemble() -> EnsembleMlp {
        let config = MlpConfig::new(3, vec![8], 2);
        EnsembleMlp::new(config, 4)
    }

    /// Minimal stateful network: tracks a running mean of batch inputs
    /// as state while delegating predictions to an inner ensemble.
    struct RunningMeanNet {
        inner: EnsembleMlp,
    }

    impl EpistemicNetworkWithState for RunningMeanNet {
        type Params = <EnsembleMlp as EpistemicNetwork>::Params;
        type State = (f64, usize);

        fn init(
            &self,
            seed: u64,
            inputs: &Array2<f64>,
            index: &Index,
        ) -> Result<(Self::Params, Self::State)> {
            Ok((self.inner.init(seed, inputs, index)?, (0.0, 0)))
        }

        fn apply(
            &self,
            params: &Self::Params,
            state: &Self::State,
            inputs: &Array2<f64>,
            index: &Index,
        ) -> Result<(Output, Self::State)> {
            let output = self.inner.apply(params, inputs, index)?;
            let (sum, count) = *state;
            let next = (sum + inputs.mean().unwrap_or(0.0), count + 1);
            Ok((output, next))
        }
    }

    #[test]
    fn stateful_convention_threads_state() {
        let net = RunningMeanNet {
            inner: small_ensemble(),
        };
        let inputs = Array2::from_elem((2, 3), 1.0);
        let index = Index::Ensemble(0);
        let (params, state) = net.init(0, &inputs, &index).unwrap();
        assert_eq!(state, (0.0, 0));

        let (out_a, state) = net.apply(&params, &state, &inputs, &index).unwrap();
        let (out_b, state) = net.apply(&params, &state, &inputs, &index).unwrap();

        // Identical inputs and params: outputs agree, state advances.
        assert_eq!(out_a, out_b);
        assert_eq!(state, (2.0, 2));
    }

    #[test]
    fn lifted_network_matches_stateless_apply() {
        let network = small_ensemble();
        let inputs = Array2::from_shape_fn((5, 3), |(i, j)| (i + j) as f64 * 0.1);
        let index = Index::Ensemble(1);

        let params = network.init(7, &inputs, &index).unwrap();
        let direct = network.apply(&params, &inputs, &index).unwrap();

        let lifted = Stateless::new(small_ensemble());
        let (lifted_params, state) = lifted.init(7, &inputs, &index).unwrap();
        let (output, next_state) = lifted.apply(&lifted_params, &state, &inputs, &index).unwrap();

        assert_eq!(output, direct);
        assert_eq!(next_state, ());
    }
}
