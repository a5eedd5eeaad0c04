//! Variational autoencoder training utility.
//!
//! # Model
//!
//! A Gaussian VAE with one hidden ReLU layer on each side:
//! ```text
//! encoder:  h = relu(x·W1 + b1)
//!           mu = h·Wm + bm,   log_var = h·Wv + bv
//! sample:   z = mu + eps ⊙ exp(log_var / 2),   eps ~ N(0, I)
//! decoder:  x_hat = relu(z·W2 + b2)·W3 + b3
//! ```
//!
//! Trained by full-batch SGD on the negative ELBO with a unit-variance
//! Gaussian likelihood and the analytic KL to the standard normal prior:
//! ```text
//! loss = [ 0.5·Σ(x_hat - x)² - 0.5·Σ(1 + log_var - mu² - exp(log_var)) ] / n
//! ```
//!
//! Gradients are derived by hand for this fixed architecture; this is a
//! packaged utility, not a general differentiation engine.

use enn_common::{Error, Result};
use enn_core::networks::LinearParams;
use ndarray::{Array1, Array2};
use ndarray_rand::rand_distr::{Normal, StandardNormal};
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Architecture and optimization settings for [`train_vae`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaeConfig {
    /// Dimension of each input row.
    pub input_dim: usize,
    /// Width of the single hidden layer in encoder and decoder.
    pub hidden_dim: usize,
    /// Dimension of the latent code.
    pub latent_dim: usize,
    /// SGD step size.
    pub learning_rate: f64,
    /// Full-batch SGD epochs; zero returns the untrained model.
    pub num_epochs: usize,
    /// Seed for parameter init and reparameterization noise.
    pub seed: u64,
}

impl VaeConfig {
    pub fn new(input_dim: usize, hidden_dim: usize, latent_dim: usize) -> Self {
        Self {
            input_dim,
            hidden_dim,
            latent_dim,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_dim == 0 || self.hidden_dim == 0 || self.latent_dim == 0 {
            return Err(Error::Config(
                "VAE dimensions must all be positive".into(),
            ));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(Error::Config(format!(
                "learning_rate must be positive and finite, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

impl Default for VaeConfig {
    fn default() -> Self {
        Self {
            input_dim: 2,
            hidden_dim: 64,
            latent_dim: 2,
            learning_rate: 1e-3,
            num_epochs: 100,
            seed: 0,
        }
    }
}

/// Gaussian posterior parameters produced by the encoder, one row per input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanLogVariance {
    pub mean: Array2<f64>,
    pub log_variance: Array2<f64>,
}

/// All trainable parameters of the VAE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct VaeParams {
    enc_hidden: LinearParams,
    enc_mean: LinearParams,
    enc_log_variance: LinearParams,
    dec_hidden: LinearParams,
    dec_output: LinearParams,
}

/// A trained variational autoencoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedVae {
    config: VaeConfig,
    params: VaeParams,
}

impl TrainedVae {
    pub fn config(&self) -> &VaeConfig {
        &self.config
    }

    /// Posterior mean and log-variance for each input row.
    pub fn encode(&self, inputs: &Array2<f64>) -> Result<MeanLogVariance> {
        check_cols("TrainedVae::encode", inputs, self.config.input_dim)?;
        let h = relu(&affine(inputs, &self.params.enc_hidden));
        Ok(MeanLogVariance {
            mean: affine(&h, &self.params.enc_mean),
            log_variance: affine(&h, &self.params.enc_log_variance),
        })
    }

    /// Decode latent codes back to input space.
    pub fn decode(&self, latents: &Array2<f64>) -> Result<Array2<f64>> {
        check_cols("TrainedVae::decode", latents, self.config.latent_dim)?;
        let hd = relu(&affine(latents, &self.params.dec_hidden));
        Ok(affine(&hd, &self.params.dec_output))
    }

    /// Round trip through the posterior mean (no sampling noise).
    pub fn reconstruct(&self, inputs: &Array2<f64>) -> Result<Array2<f64>> {
        let posterior = self.encode(inputs)?;
        self.decode(&posterior.mean)
    }

    /// ELBO evaluated at the posterior mean, averaged over the batch.
    ///
    /// Higher is better; training should increase this.
    pub fn elbo(&self, inputs: &Array2<f64>) -> Result<f64> {
        let posterior = self.encode(inputs)?;
        let x_hat = self.decode(&posterior.mean)?;
        let n = inputs.nrows() as f64;

        let recon: f64 = (&x_hat - inputs).mapv(|v| v * v).sum() * 0.5;
        let kl: f64 = posterior
            .mean
            .iter()
            .zip(posterior.log_variance.iter())
            .map(|(&mu, &lv)| -0.5 * (1.0 + lv - mu * mu - lv.exp()))
            .sum();
        Ok(-(recon + kl) / n)
    }
}

/// Train a VAE on `data` (one row per sample) and return the result.
///
/// Deterministic given `config.seed`. Fails with a config error on
/// invalid settings and a shape error if `data` does not match
/// `config.input_dim` or is empty.
pub fn train_vae(config: VaeConfig, data: &Array2<f64>) -> Result<TrainedVae> {
    config.validate()?;
    if data.nrows() == 0 {
        return Err(Error::shape(
            "train_vae",
            vec![1, config.input_dim],
            data.shape().to_vec(),
        ));
    }
    check_cols("train_vae", data, config.input_dim)?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut params = init_params(&config, &mut rng)?;
    let n = data.nrows();
    let log_every = (config.num_epochs / 10).max(1);

    for epoch in 0..config.num_epochs {
        let eps = Array2::random_using((n, config.latent_dim), StandardNormal, &mut rng);
        let loss = sgd_step(&mut params, data, &eps, config.learning_rate);
        if epoch % log_every == 0 || epoch + 1 == config.num_epochs {
            debug!(epoch, loss, "vae training step");
        }
    }

    Ok(TrainedVae { config, params })
}

fn check_cols(context: &str, batch: &Array2<f64>, dim: usize) -> Result<()> {
    if batch.ncols() != dim {
        return Err(Error::shape(
            context,
            vec![batch.nrows(), dim],
            batch.shape().to_vec(),
        ));
    }
    Ok(())
}

fn affine(inputs: &Array2<f64>, layer: &LinearParams) -> Array2<f64> {
    inputs.dot(&layer.weight) + &layer.bias
}

fn relu(pre: &Array2<f64>) -> Array2<f64> {
    pre.mapv(|v| v.max(0.0))
}

fn relu_mask(pre: &Array2<f64>) -> Array2<f64> {
    pre.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 })
}

fn init_layer(fan_in: usize, fan_out: usize, rng: &mut StdRng) -> Result<LinearParams> {
    let std = (1.0 / fan_in as f64).sqrt();
    let dist = Normal::new(0.0, std)
        .map_err(|e| Error::Config(format!("invalid weight distribution: {e}")))?;
    Ok(LinearParams {
        weight: Array2::random_using((fan_in, fan_out), dist, rng),
        bias: Array1::zeros(fan_out),
    })
}

fn init_params(config: &VaeConfig, rng: &mut StdRng) -> Result<VaeParams> {
    Ok(VaeParams {
        enc_hidden: init_layer(config.input_dim, config.hidden_dim, rng)?,
        enc_mean: init_layer(config.hidden_dim, config.latent_dim, rng)?,
        enc_log_variance: init_layer(config.hidden_dim, config.latent_dim, rng)?,
        dec_hidden: init_layer(config.latent_dim, config.hidden_dim, rng)?,
        dec_output: init_layer(config.hidden_dim, config.input_dim, rng)?,
    })
}

/// One full-batch forward/backward pass and SGD update. Returns the loss
/// value before the update.
fn sgd_step(params: &mut VaeParams, x: &Array2<f64>, eps: &Array2<f64>, lr: f64) -> f64 {
    let n = x.nrows() as f64;

    // Forward.
    let h_pre = affine(x, &params.enc_hidden);
    let h = relu(&h_pre);
    let mu = affine(&h, &params.enc_mean);
    let log_var = affine(&h, &params.enc_log_variance);
    let sigma = log_var.mapv(|v| (0.5 * v).exp());
    let z = &mu + &(eps * &sigma);
    let hd_pre = affine(&z, &params.dec_hidden);
    let hd = relu(&hd_pre);
    let x_hat = affine(&hd, &params.dec_output);

    let recon = (&x_hat - x).mapv(|v| v * v).sum() * 0.5;
    let kl: f64 = mu
        .iter()
        .zip(log_var.iter())
        .map(|(&m, &lv)| -0.5 * (1.0 + lv - m * m - lv.exp()))
        .sum();
    let loss = (recon + kl) / n;

    // Backward: reconstruction path through the decoder.
    let g_x_hat = (&x_hat - x) / n;
    let g_w3 = hd.t().dot(&g_x_hat);
    let g_b3 = g_x_hat.sum_axis(ndarray::Axis(0));
    let g_hd_pre = g_x_hat.dot(&params.dec_output.weight.t()) * relu_mask(&hd_pre);
    let g_w2 = z.t().dot(&g_hd_pre);
    let g_b2 = g_hd_pre.sum_axis(ndarray::Axis(0));
    let g_z = g_hd_pre.dot(&params.dec_hidden.weight.t());

    // Reparameterization: z = mu + eps·exp(log_var/2), plus KL terms.
    let g_mu = &g_z + &(&mu / n);
    let g_log_var = &g_z * &(eps * &sigma) * 0.5 + log_var.mapv(|lv| lv.exp() - 1.0) * (0.5 / n);

    let g_wm = h.t().dot(&g_mu);
    let g_bm = g_mu.sum_axis(ndarray::Axis(0));
    let g_wv = h.t().dot(&g_log_var);
    let g_bv = g_log_var.sum_axis(ndarray::Axis(0));

    let g_h = g_mu.dot(&params.enc_mean.weight.t())
        + g_log_var.dot(&params.enc_log_variance.weight.t());
    let g_h_pre = g_h * relu_mask(&h_pre);
    let g_w1 = x.t().dot(&g_h_pre);
    let g_b1 = g_h_pre.sum_axis(ndarray::Axis(0));

    // SGD update.
    params.dec_output.weight -= &(g_w3 * lr);
    params.dec_output.bias -= &(g_b3 * lr);
    params.dec_hidden.weight -= &(g_w2 * lr);
    params.dec_hidden.bias -= &(g_b2 * lr);
    params.enc_mean.weight -= &(g_wm * lr);
    params.enc_mean.bias -= &(g_bm * lr);
    params.enc_log_variance.weight -= &(g_wv * lr);
    params.enc_log_variance.bias -= &(g_bv * lr);
    params.enc_hidden.weight -= &(g_w1 * lr);
    params.enc_hidden.bias -= &(g_b1 * lr);

    loss
}
