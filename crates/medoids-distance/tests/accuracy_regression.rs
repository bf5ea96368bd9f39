//! Accuracy regression tests for medoids-distance.
//!
//! These tests pin metric values and the structural properties of pairwise
//! and cross-distance matrices so that kernel changes cannot silently alter
//! the distances clustering runs on.

use medoids_distance::{CustomMetric, DistanceError, FeatureMatrix, Metric, SparseMatrix};

// ---------------------------------------------------------------------------
// Helper
// ---------------------------------------------------------------------------

fn fm(rows: Vec<Vec<f64>>) -> FeatureMatrix {
    FeatureMatrix::new(rows).expect("valid test matrix")
}

fn grid() -> FeatureMatrix {
    fm(vec![
        vec![1.0, 0.0],
        vec![1.1, 0.0],
        vec![0.0, 1.0],
        vec![0.0, 1.1],
        vec![-2.0, 3.5],
        vec![4.0, -1.0],
    ])
}

// ---------------------------------------------------------------------------
// a) metric_values_match_known_values
// ---------------------------------------------------------------------------

/// Distances between fixed vector pairs match hand-computed reference values.
#[test]
fn metric_values_match_known_values() {
    let a = [1.0, 2.0, 3.0];
    let b = [4.0, 0.0, 3.0];

    let cases: Vec<(Metric, f64)> = vec![
        (Metric::Euclidean, 13.0f64.sqrt()),
        (Metric::SquaredEuclidean, 13.0),
        (Metric::Manhattan, 5.0),
        (Metric::Chebyshev, 3.0),
        (Metric::Cosine, 1.0 - 13.0 / (14.0f64.sqrt() * 25.0f64.sqrt())),
    ];

    for (metric, expected) in cases {
        let got = metric.distance(&a, &b).unwrap();
        assert!(
            (got - expected).abs() < 1e-12,
            "{metric}: got {got:.15}, expected {expected:.15}"
        );
    }
}

// ---------------------------------------------------------------------------
// b) pairwise_matrices_are_valid_distance_matrices
// ---------------------------------------------------------------------------

/// Every named metric yields a square, symmetric, non-negative matrix with a
/// zero diagonal.
#[test]
fn pairwise_matrices_are_valid_distance_matrices() {
    let x = grid();
    for metric in [
        Metric::Euclidean,
        Metric::SquaredEuclidean,
        Metric::Manhattan,
        Metric::Cosine,
        Metric::Chebyshev,
    ] {
        let d = metric.pairwise(&x).unwrap();
        assert_eq!((d.n_rows(), d.n_cols()), (6, 6), "{metric}: wrong shape");
        for i in 0..6 {
            assert_eq!(d.get(i, i), 0.0, "{metric}: diagonal {i} not zero");
            for j in 0..6 {
                assert!(d.get(i, j) >= 0.0, "{metric}: negative at ({i}, {j})");
                assert_eq!(d.get(i, j), d.get(j, i), "{metric}: asymmetric at ({i}, {j})");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// c) euclidean_satisfies_triangle_inequality
// ---------------------------------------------------------------------------

#[test]
fn euclidean_satisfies_triangle_inequality() {
    let d = Metric::Euclidean.pairwise(&grid()).unwrap();
    for i in 0..6 {
        for j in 0..6 {
            for k in 0..6 {
                assert!(
                    d.get(i, k) <= d.get(i, j) + d.get(j, k) + 1e-12,
                    "triangle inequality violated for ({i}, {j}, {k})"
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// d) cross_distances_agree_with_pairwise
// ---------------------------------------------------------------------------

/// Distances from every sample to a subset of samples equal the matching
/// columns of the pairwise matrix.
#[test]
fn cross_distances_agree_with_pairwise() {
    let x = grid();
    let subset = [4, 0, 2];
    let reference = x.select_rows(&subset);

    let pairwise = Metric::Manhattan.pairwise(&x).unwrap();
    let cross = Metric::Manhattan.cross(&x, &reference).unwrap();

    assert_eq!(cross, pairwise.select_columns(&subset));
}

// ---------------------------------------------------------------------------
// e) precomputed_round_trips_euclidean_matrix
// ---------------------------------------------------------------------------

/// A euclidean matrix fed back as precomputed input is accepted unchanged.
#[test]
fn precomputed_round_trips_euclidean_matrix() {
    let d = Metric::Euclidean.pairwise(&grid()).unwrap();
    let as_input = fm(d.to_rows());
    let back = Metric::Precomputed.pairwise(&as_input).unwrap();
    assert_eq!(back, d);
}

// ---------------------------------------------------------------------------
// f) sparse_input_matches_dense_input
// ---------------------------------------------------------------------------

#[test]
fn sparse_input_matches_dense_input() {
    let sparse = SparseMatrix::from_triplets(
        3,
        4,
        &[(0, 0, 1.0), (0, 3, 2.0), (1, 1, -1.0), (2, 3, 5.0)],
    )
    .unwrap();
    let dense = fm(vec![
        vec![1.0, 0.0, 0.0, 2.0],
        vec![0.0, -1.0, 0.0, 0.0],
        vec![0.0, 0.0, 0.0, 5.0],
    ]);

    let from_sparse = Metric::Euclidean.pairwise(&sparse.to_dense().unwrap()).unwrap();
    let from_dense = Metric::Euclidean.pairwise(&dense).unwrap();
    assert_eq!(from_sparse, from_dense);
}

// ---------------------------------------------------------------------------
// g) custom_metric_errors_carry_metric_name
// ---------------------------------------------------------------------------

#[test]
fn custom_metric_errors_carry_metric_name() {
    let metric = Metric::Custom(CustomMetric::new("nan-producer", |_, _| f64::NAN));
    let err = metric.pairwise(&grid()).unwrap_err();
    assert!(matches!(err, DistanceError::InvalidMetricOutput { .. }));
    assert!(err.to_string().contains("nan-producer"), "message was: {err}");
}
