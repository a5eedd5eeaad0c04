//! Property-based tests for the k-means utility.
//!
//! Verifies the structural invariants of [`KMeansOutput`] across random
//! data sets, cluster counts, and seeds.

use enn_extra::{cluster, KMeansConfig};
use ndarray::Array2;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_data(seed: u64, rows: usize, cols: usize) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array2::from_shape_fn((rows, cols), |_| rng.gen_range(-5.0..5.0))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every label is a valid cluster id and the counts account for
    /// every point exactly once.
    #[test]
    fn labels_and_counts_are_consistent(
        data_seed in 0u64..1_000,
        fit_seed in 0u64..1_000,
        rows in 4usize..40,
        cols in 1usize..5,
        k in 1usize..4,
    ) {
        prop_assume!(k <= rows);
        let data = random_data(data_seed, rows, cols);
        let config = KMeansConfig {
            num_clusters: k,
            seed: fit_seed,
            ..KMeansConfig::default()
        };
        let output = cluster(config, &data).unwrap();

        prop_assert_eq!(output.labels.len(), rows);
        prop_assert!(output.labels.iter().all(|&label| label < k));
        prop_assert_eq!(output.counts.len(), k);
        prop_assert_eq!(output.counts.iter().sum::<usize>(), rows);
        for (label, &count) in output.counts.iter().enumerate() {
            let assigned = output.labels.iter().filter(|&&l| l == label).count();
            prop_assert_eq!(assigned, count);
        }
    }

    /// Inertia is a non-negative finite sum of squared distances, and
    /// centroids have one row per cluster.
    #[test]
    fn inertia_and_centroids_are_well_formed(
        data_seed in 0u64..1_000,
        rows in 2usize..30,
        cols in 1usize..4,
        k in 1usize..3,
    ) {
        prop_assume!(k <= rows);
        let data = random_data(data_seed, rows, cols);
        let output = cluster(KMeansConfig::new(k), &data).unwrap();

        prop_assert!(output.inertia.is_finite());
        prop_assert!(output.inertia >= 0.0);
        prop_assert_eq!(output.centroids.shape(), &[k, cols]);
        prop_assert!(output.iterations >= 1);
    }

    /// The same configuration and data always produce the same fit.
    #[test]
    fn fit_is_deterministic(
        data_seed in 0u64..1_000,
        fit_seed in 0u64..1_000,
        rows in 3usize..20,
    ) {
        let data = random_data(data_seed, rows, 2);
        let config = KMeansConfig {
            num_clusters: 2,
            seed: fit_seed,
            ..KMeansConfig::default()
        };
        let a = cluster(config.clone(), &data).unwrap();
        let b = cluster(config, &data).unwrap();
        prop_assert_eq!(a, b);
    }

    /// Assigning each point to its labelled centroid is no worse than
    /// assigning it to any other centroid.
    #[test]
    fn labels_pick_the_nearest_centroid(
        data_seed in 0u64..500,
        rows in 4usize..20,
        k in 2usize..4,
    ) {
        prop_assume!(k <= rows);
        let data = random_data(data_seed, rows, 3);
        let output = cluster(KMeansConfig::new(k), &data).unwrap();

        for (i, point) in data.rows().into_iter().enumerate() {
            let own: f64 = point
                .iter()
                .zip(output.centroids.row(output.labels[i]).iter())
                .map(|(a, b)| (a - b) * (a - b))
                .sum();
            for centroid in output.centroids.rows() {
                let other: f64 = point
                    .iter()
                    .zip(centroid.iter())
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum();
                prop_assert!(own <= other + 1e-9);
            }
        }
    }
}
