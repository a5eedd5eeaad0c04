//! Ensembles with additive fixed priors (randomized prior functions).
//!
//! Each ensemble member is paired with an untrained prior MLP drawn once
//! at construction time. The prior parameters live inside the network
//! value, never inside the trainable parameter structure returned by
//! `init`, so the prior contribution is constant under any optimizer:
//! that is the detach guarantee behind [`Output::WithPrior`].

use enn_common::{Error, Result};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::ensemble::EnsembleMlp;
use super::mlp::{check_batch, init_mlp_params, mlp_forward, sub_seeds, MlpConfig, MlpParams};
use crate::index::Index;
use crate::network::EpistemicNetwork;
use crate::output::{Output, OutputWithPrior};

/// Ensemble of MLPs with a fixed random prior network per member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleWithPrior {
    ensemble: EnsembleMlp,
    prior_scale: f64,
    prior_params: Vec<MlpParams>,
}

impl EnsembleWithPrior {
    /// Build the ensemble and draw its K prior networks from `prior_seed`.
    pub fn new(
        config: MlpConfig,
        num_ensemble: usize,
        prior_scale: f64,
        prior_seed: u64,
    ) -> Result<Self> {
        if num_ensemble == 0 {
            return Err(Error::Config("ensemble must have at least one member".into()));
        }
        if !prior_scale.is_finite() {
            return Err(Error::Config(format!(
                "prior_scale must be finite, got {prior_scale}"
            )));
        }
        config.validate()?;

        let mut prior_params = Vec::with_capacity(num_ensemble);
        for seed in sub_seeds(prior_seed, num_ensemble) {
            let mut rng = StdRng::seed_from_u64(seed);
            prior_params.push(init_mlp_params(&config, &mut rng)?);
        }

        Ok(Self {
            ensemble: EnsembleMlp::new(config, num_ensemble),
            prior_scale,
            prior_params,
        })
    }

    pub fn num_ensemble(&self) -> usize {
        self.ensemble.num_ensemble()
    }

    pub fn prior_scale(&self) -> f64 {
        self.prior_scale
    }
}

impl EpistemicNetwork for EnsembleWithPrior {
    type Params = Vec<MlpParams>;

    fn init(&self, seed: u64, inputs: &Array2<f64>, index: &Index) -> Result<Self::Params> {
        self.ensemble.init(seed, inputs, index)
    }

    fn apply(&self, params: &Self::Params, inputs: &Array2<f64>, index: &Index) -> Result<Output> {
        check_batch("EnsembleWithPrior::apply", inputs, self.ensemble.config().input_dim)?;
        let k = self.ensemble.member(index)?;
        let member = params.get(k).ok_or_else(|| {
            Error::index_domain(
                index,
                format!("loaded members {{0..{}}}", params.len().saturating_sub(1)),
            )
        })?;

        let train = mlp_forward(member, inputs);
        let prior = mlp_forward(&self.prior_params[k], inputs) * self.prior_scale;
        Ok(Output::WithPrior(
            OutputWithPrior::new(train).with_prior(prior),
        ))
    }
}
