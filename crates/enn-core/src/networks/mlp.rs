//! Multilayer perceptron building blocks shared by the concrete networks.
//!
//! Parameters are explicit `ndarray` values (one weight matrix and bias
//! vector per layer), initialized with He-style Gaussian draws from a
//! seeded generator so that `init` is a deterministic function of its
//! seed. The forward pass is ReLU on hidden layers and linear on the
//! output layer.

use enn_common::{Error, Result};
use ndarray::{s, Array1, Array2};
use ndarray_rand::rand_distr::Normal;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::index::Index;
use crate::network::EpistemicNetwork;
use crate::output::Output;

/// Layer sizes for an MLP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MlpConfig {
    /// Trailing dimension every input batch must match.
    pub input_dim: usize,
    /// Hidden layer widths, applied in order with ReLU activations.
    pub hidden_dims: Vec<usize>,
    /// Output dimension (linear head).
    pub output_dim: usize,
}

impl MlpConfig {
    pub fn new(input_dim: usize, hidden_dims: Vec<usize>, output_dim: usize) -> Self {
        Self {
            input_dim,
            hidden_dims,
            output_dim,
        }
    }

    /// Layer sizes as (fan_in, fan_out) pairs from input to output.
    pub fn layer_dims(&self) -> Vec<(usize, usize)> {
        let mut dims = Vec::with_capacity(self.hidden_dims.len() + 1);
        let mut fan_in = self.input_dim;
        for &width in &self.hidden_dims {
            dims.push((fan_in, width));
            fan_in = width;
        }
        dims.push((fan_in, self.output_dim));
        dims
    }

    /// Reject zero-sized dimensions before any parameters are created.
    pub fn validate(&self) -> Result<()> {
        if self.input_dim == 0 {
            return Err(Error::Config("MLP input_dim must be positive".into()));
        }
        if self.output_dim == 0 {
            return Err(Error::Config("MLP output_dim must be positive".into()));
        }
        if self.hidden_dims.iter().any(|&w| w == 0) {
            return Err(Error::Config("MLP hidden widths must be positive".into()));
        }
        Ok(())
    }
}

impl Default for MlpConfig {
    fn default() -> Self {
        Self {
            input_dim: 1,
            hidden_dims: vec![50, 50],
            output_dim: 1,
        }
    }
}

/// One dense layer: `y = x · weight + bias`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearParams {
    pub weight: Array2<f64>,
    pub bias: Array1<f64>,
}

/// Parameters of one MLP, layer by layer from input to output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlpParams {
    pub layers: Vec<LinearParams>,
}

impl MlpParams {
    /// Total number of scalar parameters.
    pub fn num_params(&self) -> usize {
        self.layers
            .iter()
            .map(|layer| layer.weight.len() + layer.bias.len())
            .sum()
    }
}

/// Draw fresh MLP parameters from `rng` for the given layer sizes.
///
/// Weights are `N(0, 2 / fan_in)` (He init for ReLU nets), biases zero.
pub fn init_mlp_params(config: &MlpConfig, rng: &mut StdRng) -> Result<MlpParams> {
    config.validate()?;
    let mut layers = Vec::with_capacity(config.hidden_dims.len() + 1);
    for (fan_in, fan_out) in config.layer_dims() {
        let std = (2.0 / fan_in as f64).sqrt();
        let dist = Normal::new(0.0, std)
            .map_err(|e| Error::Config(format!("invalid weight distribution: {e}")))?;
        layers.push(LinearParams {
            weight: Array2::random_using((fan_in, fan_out), dist, rng),
            bias: Array1::zeros(fan_out),
        });
    }
    Ok(MlpParams { layers })
}

/// ReLU-hidden, linear-output forward pass.
pub fn mlp_forward(params: &MlpParams, inputs: &Array2<f64>) -> Array2<f64> {
    let last = params.layers.len().saturating_sub(1);
    let mut activations = inputs.clone();
    for (i, layer) in params.layers.iter().enumerate() {
        let mut pre = activations.dot(&layer.weight) + &layer.bias;
        if i < last {
            pre.mapv_inplace(|v| v.max(0.0));
        }
        activations = pre;
    }
    activations
}

/// Shape-check an input batch against a declared trailing dimension.
pub(crate) fn check_batch(context: &str, inputs: &Array2<f64>, input_dim: usize) -> Result<()> {
    if inputs.ncols() != input_dim {
        return Err(Error::shape(
            context,
            vec![inputs.nrows(), input_dim],
            inputs.shape().to_vec(),
        ));
    }
    Ok(())
}

/// An MLP conditioned on a continuous index.
///
/// The index vector is concatenated onto every input row before the
/// forward pass, so distinct index draws produce distinct family members
/// from a single parameter set. Pairs naturally with
/// [`crate::index::GaussianIndexer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcatIndexMlp {
    input_dim: usize,
    index_dim: usize,
    mlp: MlpConfig,
}

impl ConcatIndexMlp {
    pub fn new(input_dim: usize, index_dim: usize, hidden_dims: Vec<usize>, output_dim: usize) -> Self {
        Self {
            input_dim,
            index_dim,
            mlp: MlpConfig::new(input_dim + index_dim, hidden_dims, output_dim),
        }
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub fn index_dim(&self) -> usize {
        self.index_dim
    }

    /// Accept a vector index of the declared dimension; a scalar index is
    /// treated as a one-dimensional vector when `index_dim == 1`.
    fn index_vector(&self, index: &Index) -> Result<Array1<f64>> {
        let domain = format!("index vectors of dimension {}", self.index_dim);
        match index {
            Index::Vector(z) if z.len() == self.index_dim => Ok(z.clone()),
            Index::Scalar(z) if self.index_dim == 1 => Ok(Array1::from(vec![*z])),
            other => Err(Error::index_domain(other, domain)),
        }
    }

    fn join(&self, inputs: &Array2<f64>, z: &Array1<f64>) -> Array2<f64> {
        let n = inputs.nrows();
        let mut joined = Array2::zeros((n, self.input_dim + self.index_dim));
        joined.slice_mut(s![.., ..self.input_dim]).assign(inputs);
        for mut row in joined.slice_mut(s![.., self.input_dim..]).rows_mut() {
            row.assign(z);
        }
        joined
    }
}

impl EpistemicNetwork for ConcatIndexMlp {
    type Params = MlpParams;

    fn init(&self, seed: u64, inputs: &Array2<f64>, _index: &Index) -> Result<Self::Params> {
        check_batch("ConcatIndexMlp::init", inputs, self.input_dim)?;
        let mut rng = StdRng::seed_from_u64(seed);
        init_mlp_params(&self.mlp, &mut rng)
    }

    fn apply(&self, params: &Self::Params, inputs: &Array2<f64>, index: &Index) -> Result<Output> {
        check_batch("ConcatIndexMlp::apply", inputs, self.input_dim)?;
        let z = self.index_vector(index)?;
        let joined = self.join(inputs, &z);
        Ok(Output::Plain(mlp_forward(params, &joined)))
    }
}

/// Split a master seed into a stream of per-member sub-seeds.
pub(crate) fn sub_seeds(seed: u64, count: usize) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count).map(|_| rng.gen::<u64>()).collect()
}
