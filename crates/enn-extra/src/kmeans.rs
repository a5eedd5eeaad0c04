//! K-means clustering with k-means++ seeding.
//!
//! # Algorithm
//!
//! 1. **Seeding**: the first centroid is drawn uniformly; each further
//!    centroid is drawn with probability proportional to the squared
//!    distance from the nearest centroid chosen so far (k-means++).
//! 2. **Lloyd iterations**: assign every point to its nearest centroid,
//!    recompute centroids as cluster means, repeat until the largest
//!    centroid shift falls at or below `tol` or `max_iters` is reached.
//!
//! Clusters that lose all their points are re-seeded to the point
//! farthest from its assigned centroid, so the output always has exactly
//! `num_clusters` centroids.

use enn_common::{Error, Result};
use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Configuration for one k-means fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KMeansConfig {
    /// Number of clusters K.
    pub num_clusters: usize,
    /// Maximum Lloyd iterations before giving up on convergence.
    pub max_iters: usize,
    /// Convergence threshold on the largest centroid shift.
    pub tol: f64,
    /// Seed for centroid initialization.
    pub seed: u64,
}

impl KMeansConfig {
    pub fn new(num_clusters: usize) -> Self {
        Self {
            num_clusters,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_clusters == 0 {
            return Err(Error::Config("num_clusters must be positive".into()));
        }
        if self.max_iters == 0 {
            return Err(Error::Config("max_iters must be positive".into()));
        }
        if !self.tol.is_finite() || self.tol < 0.0 {
            return Err(Error::Config(format!(
                "tol must be finite and non-negative, got {}",
                self.tol
            )));
        }
        Ok(())
    }
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            num_clusters: 8,
            max_iters: 100,
            tol: 1e-6,
            seed: 0,
        }
    }
}

/// Result of one k-means fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KMeansOutput {
    /// Centroid positions, one row per cluster.
    pub centroids: Array2<f64>,
    /// Cluster assignment per input row, each in `{0..K-1}`.
    pub labels: Vec<usize>,
    /// Number of points assigned to each cluster.
    pub counts: Vec<usize>,
    /// Sum of squared distances from points to their centroids.
    pub inertia: f64,
    /// Lloyd iterations actually run.
    pub iterations: usize,
    /// Whether the centroid shift fell below `tol` before `max_iters`.
    pub converged: bool,
}

/// K-means clusterer with a fixed configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KMeansCluster {
    config: KMeansConfig,
}

impl KMeansCluster {
    pub fn new(config: KMeansConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &KMeansConfig {
        &self.config
    }

    /// Cluster `data` (one row per sample) into `num_clusters` groups.
    pub fn fit(&self, data: &Array2<f64>) -> Result<KMeansOutput> {
        self.config.validate()?;
        let n = data.nrows();
        let d = data.ncols();
        if n == 0 || d == 0 {
            return Err(Error::shape(
                "KMeansCluster::fit",
                vec![1, 1],
                data.shape().to_vec(),
            ));
        }
        let k = self.config.num_clusters;
        if k > n {
            return Err(Error::Config(format!(
                "num_clusters ({k}) exceeds number of samples ({n})"
            )));
        }

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut centroids = plus_plus_init(data, k, &mut rng);
        let mut labels = vec![0usize; n];
        let mut iterations = 0;
        let mut converged = false;

        for iter in 0..self.config.max_iters {
            iterations = iter + 1;

            for (i, point) in data.rows().into_iter().enumerate() {
                labels[i] = nearest(&centroids, &point).0;
            }

            let next = recompute_centroids(data, &labels, &centroids);
            let shift = max_shift(&centroids, &next);
            centroids = next;

            if shift <= self.config.tol {
                converged = true;
                break;
            }
        }

        // Final assignment against the last centroid update.
        let mut inertia = 0.0;
        let mut counts = vec![0usize; k];
        for (i, point) in data.rows().into_iter().enumerate() {
            let (label, dist_sq) = nearest(&centroids, &point);
            labels[i] = label;
            counts[label] += 1;
            inertia += dist_sq;
        }

        if converged {
            debug!(iterations, inertia, "k-means converged");
        } else {
            warn!(
                max_iters = self.config.max_iters,
                inertia, "k-means stopped before convergence"
            );
        }

        Ok(KMeansOutput {
            centroids,
            labels,
            counts,
            inertia,
            iterations,
            converged,
        })
    }
}

/// Convenience entry point: cluster with the given configuration.
pub fn cluster(config: KMeansConfig, data: &Array2<f64>) -> Result<KMeansOutput> {
    KMeansCluster::new(config).fit(data)
}

fn dist_sq(a: &ArrayView1<'_, f64>, b: &ArrayView1<'_, f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum()
}

/// Nearest centroid index and squared distance for one point.
fn nearest(centroids: &Array2<f64>, point: &ArrayView1<'_, f64>) -> (usize, f64) {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (j, centroid) in centroids.rows().into_iter().enumerate() {
        let dist = dist_sq(&centroid, point);
        if dist < best_dist {
            best = j;
            best_dist = dist;
        }
    }
    (best, best_dist)
}

/// Largest Euclidean movement of any centroid between two updates.
fn max_shift(previous: &Array2<f64>, next: &Array2<f64>) -> f64 {
    previous
        .rows()
        .into_iter()
        .zip(next.rows())
        .map(|(a, b)| dist_sq(&a, &b).sqrt())
        .fold(0.0, f64::max)
}

/// K-means++ seeding: later centroids favor points far from earlier ones.
fn plus_plus_init(data: &Array2<f64>, k: usize, rng: &mut StdRng) -> Array2<f64> {
    let n = data.nrows();
    let d = data.ncols();
    let mut centroids = Array2::zeros((k, d));

    let first = rng.gen_range(0..n);
    centroids.row_mut(0).assign(&data.row(first));

    let mut min_dists = vec![f64::INFINITY; n];
    for c in 1..k {
        let last = centroids.row(c - 1);
        for (i, point) in data.rows().into_iter().enumerate() {
            let dist = dist_sq(&last, &point);
            if dist < min_dists[i] {
                min_dists[i] = dist;
            }
        }

        let total: f64 = min_dists.iter().sum();
        let chosen = if total > 0.0 {
            let mut target = rng.gen_range(0.0..total);
            let mut pick = n - 1;
            for (i, &dist) in min_dists.iter().enumerate() {
                if target < dist {
                    pick = i;
                    break;
                }
                target -= dist;
            }
            pick
        } else {
            // All points coincide with chosen centroids.
            rng.gen_range(0..n)
        };
        centroids.row_mut(c).assign(&data.row(chosen));
    }

    centroids
}

/// Cluster means, with empty clusters re-seeded to the farthest point.
fn recompute_centroids(
    data: &Array2<f64>,
    labels: &[usize],
    previous: &Array2<f64>,
) -> Array2<f64> {
    let k = previous.nrows();
    let d = data.ncols();
    let mut sums = Array2::<f64>::zeros((k, d));
    let mut counts = vec![0usize; k];

    for (i, &label) in labels.iter().enumerate() {
        counts[label] += 1;
        let mut row = sums.row_mut(label);
        row += &data.row(i);
    }

    let mut centroids = Array2::zeros((k, d));
    for j in 0..k {
        if counts[j] > 0 {
            let mut row = centroids.row_mut(j);
            row.assign(&sums.row(j));
            row /= counts[j] as f64;
        } else {
            // Re-seed a starved cluster to the worst-served point.
            let far = farthest_point(data, labels, previous);
            centroids.row_mut(j).assign(&data.row(far));
        }
    }
    centroids
}

fn farthest_point(data: &Array2<f64>, labels: &[usize], centroids: &Array2<f64>) -> usize {
    let mut worst = 0;
    let mut worst_dist = -1.0;
    for (i, point) in data.rows().into_iter().enumerate() {
        let dist = dist_sq(&centroids.row(labels[i]), &point);
        if dist > worst_dist {
            worst = i;
            worst_dist = dist;
        }
    }
    worst
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    /// Three well-separated blobs of three points each.
    fn blobs() -> Array2<f64> {
        array![
            [0.0, 0.0],
            [0.1, 0.0],
            [0.0, 0.1],
            [10.0, 10.0],
            [10.1, 10.0],
            [10.0, 10.1],
            [-10.0, 10.0],
            [-10.1, 10.0],
            [-10.0, 10.1],
        ]
    }

    #[test]
    fn recovers_separated_blobs() {
        let output = cluster(KMeansConfig::new(3), &blobs()).unwrap();
        assert!(output.converged);
        assert_eq!(output.counts, vec![3, 3, 3]);
        // Points within a blob share a label.
        assert_eq!(output.labels[0], output.labels[1]);
        assert_eq!(output.labels[3], output.labels[4]);
        assert_eq!(output.labels[6], output.labels[7]);
        // Blobs are separated.
        assert_ne!(output.labels[0], output.labels[3]);
        assert_ne!(output.labels[3], output.labels[6]);
        assert!(output.inertia < 1.0);
    }

    #[test]
    fn fit_is_seed_deterministic() {
        let config = KMeansConfig {
            num_clusters: 3,
            seed: 17,
            ..KMeansConfig::default()
        };
        let a = cluster(config.clone(), &blobs()).unwrap();
        let b = cluster(config, &blobs()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn single_cluster_centroid_is_the_mean() {
        let data = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let output = cluster(KMeansConfig::new(1), &data).unwrap();
        assert_eq!(output.labels, vec![0, 0, 0]);
        assert!((output.centroids[[0, 0]] - 3.0).abs() < 1e-12);
        assert!((output.centroids[[0, 1]] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn k_equals_n_gives_zero_inertia() {
        let data = array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let output = cluster(KMeansConfig::new(3), &data).unwrap();
        assert!(output.inertia < 1e-12);
        let mut sorted = output.labels.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2]);
    }

    #[test]
    fn duplicate_points_do_not_break_seeding() {
        let data = array![[1.0, 1.0], [1.0, 1.0], [1.0, 1.0], [1.0, 1.0]];
        let output = cluster(KMeansConfig::new(2), &data).unwrap();
        assert_eq!(output.counts.iter().sum::<usize>(), 4);
        assert!(output.inertia < 1e-12);
    }

    #[test]
    fn zero_clusters_is_config_error() {
        let err = cluster(KMeansConfig::new(0), &blobs()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn more_clusters_than_points_is_config_error() {
        let data = array![[0.0, 0.0], [1.0, 1.0]];
        let err = cluster(KMeansConfig::new(5), &data).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn empty_batch_is_shape_error() {
        let data = Array2::<f64>::zeros((0, 2));
        let err = cluster(KMeansConfig::new(1), &data).unwrap_err();
        assert!(matches!(err, Error::Shape { .. }));
    }
}
