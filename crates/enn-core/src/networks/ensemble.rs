//! Deep ensembles as epistemic networks.
//!
//! An ensemble of K independently initialized MLPs, indexed by
//! `Index::Ensemble(k)`. Each member gets its own sub-seed derived from
//! the master seed, so the whole ensemble is reproducible from one
//! integer while members stay decorrelated.

use enn_common::{Error, Result};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::mlp::{check_batch, init_mlp_params, mlp_forward, sub_seeds, MlpConfig, MlpParams};
use crate::index::Index;
use crate::network::EpistemicNetwork;
use crate::output::Output;

/// Ensemble of K MLPs sharing one architecture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnsembleMlp {
    config: MlpConfig,
    num_ensemble: usize,
}

impl EnsembleMlp {
    pub fn new(config: MlpConfig, num_ensemble: usize) -> Self {
        Self {
            config,
            num_ensemble,
        }
    }

    pub fn config(&self) -> &MlpConfig {
        &self.config
    }

    /// Number of ensemble members K; valid indices are `{0..K-1}`.
    pub fn num_ensemble(&self) -> usize {
        self.num_ensemble
    }

    fn domain(&self) -> String {
        format!("ensemble members {{0..{}}}", self.num_ensemble.saturating_sub(1))
    }

    /// Resolve an index to a member id, or fail with a domain error.
    pub(crate) fn member(&self, index: &Index) -> Result<usize> {
        match index {
            Index::Ensemble(k) if *k < self.num_ensemble => Ok(*k),
            other => Err(Error::index_domain(other, self.domain())),
        }
    }

    /// Initialize all K member parameter sets from one master seed.
    pub(crate) fn init_members(&self, seed: u64) -> Result<Vec<MlpParams>> {
        if self.num_ensemble == 0 {
            return Err(Error::Config("ensemble must have at least one member".into()));
        }
        self.config.validate()?;
        let mut members = Vec::with_capacity(self.num_ensemble);
        for member_seed in sub_seeds(seed, self.num_ensemble) {
            let mut rng = StdRng::seed_from_u64(member_seed);
            members.push(init_mlp_params(&self.config, &mut rng)?);
        }
        debug!(
            num_ensemble = self.num_ensemble,
            params_per_member = members[0].num_params(),
            "initialized ensemble parameters"
        );
        Ok(members)
    }
}

impl EpistemicNetwork for EnsembleMlp {
    type Params = Vec<MlpParams>;

    fn init(&self, seed: u64, inputs: &Array2<f64>, _index: &Index) -> Result<Self::Params> {
        check_batch("EnsembleMlp::init", inputs, self.config.input_dim)?;
        self.init_members(seed)
    }

    fn apply(&self, params: &Self::Params, inputs: &Array2<f64>, index: &Index) -> Result<Output> {
        check_batch("EnsembleMlp::apply", inputs, self.config.input_dim)?;
        let k = self.member(index)?;
        let member = params
            .get(k)
            .ok_or_else(|| Error::index_domain(index, format!("loaded members {{0..{}}}", params.len().saturating_sub(1))))?;
        Ok(Output::Plain(mlp_forward(member, inputs)))
    }
}
