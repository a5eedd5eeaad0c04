//! Auxiliary statistical utilities for epistemic network experiments.
//!
//! These are packaged black boxes with fixed call shapes, used to build
//! priors and representations for epistemic networks:
//! - [`KMeansCluster`] / [`cluster`]: k-means++ clustering over a data
//!   batch, returning labels and centroid positions.
//! - [`train_vae`]: trains a small Gaussian variational autoencoder and
//!   returns a [`TrainedVae`] whose encoder produces a mean and
//!   log-variance pair per input.

pub mod kmeans;
pub mod vae;

pub use kmeans::{cluster, KMeansCluster, KMeansConfig, KMeansOutput};
pub use vae::{train_vae, MeanLogVariance, TrainedVae, VaeConfig};
