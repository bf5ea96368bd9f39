//! Accuracy regression tests for medoids-cluster.
//!
//! These tests pin the exact medoids, labels, and inertia on small fixed
//! datasets, and check the structural guarantees every fit must satisfy.

use medoids_cluster::{
    ClaraConfig, ClusterError, FitWarning, InitStrategy, KMedoidsConfig, Method, OptimizeConfig,
    Termination,
};
use medoids_distance::{CustomMetric, DistanceMatrix, FeatureMatrix, Metric, SparseMatrix};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn matrix(rows: &[&[f64]]) -> FeatureMatrix {
    FeatureMatrix::new(rows.iter().map(|r| r.to_vec()).collect()).unwrap()
}

/// Nine points in 3 tight groups around (0,0), (5,5), and (10,0).
fn three_groups() -> FeatureMatrix {
    matrix(&[
        &[0.0, 0.0],
        &[0.1, 0.0],
        &[0.0, 0.1],
        &[5.0, 5.0],
        &[5.1, 5.0],
        &[5.0, 5.1],
        &[10.0, 0.0],
        &[10.1, 0.0],
        &[10.0, 0.1],
    ])
}

fn indices(labels: &[medoids_cluster::ClusterLabel]) -> Vec<usize> {
    labels.iter().map(|l| l.index()).collect()
}

const METHODS: [Method; 2] = [Method::Alternating, Method::Pam];

// ---------------------------------------------------------------------------
// a) precomputed distance matrix
// ---------------------------------------------------------------------------

/// Two pairs of nearby points. The heuristic picks rows 2 and 0, and both
/// update rules keep them.
#[test]
fn precomputed_matrix_pins_medoids_and_labels() {
    let x = matrix(&[&[1.0, 0.0], &[1.1, 0.0], &[0.0, 1.0], &[0.0, 1.1]]);
    let d = Metric::Euclidean.pairwise(&x).unwrap();
    let precomputed = FeatureMatrix::new(d.to_rows()).unwrap();

    for method in METHODS {
        let model = KMedoidsConfig::new(2)
            .unwrap()
            .with_metric(Metric::Precomputed)
            .with_method(method)
            .fit(&precomputed)
            .unwrap();

        assert_eq!(model.medoid_indices(), &[2, 0], "{method}");
        assert_eq!(indices(model.labels()), vec![1, 1, 0, 0], "{method}");
        assert!(
            (model.inertia().value() - 0.2).abs() < 1e-9,
            "{method}: expected inertia 0.2, got {}",
            model.inertia()
        );
        assert!(model.cluster_centers().is_none(), "{method}: precomputed fit has no centers");
    }
}

#[test]
fn precomputed_matrix_must_be_symmetric() {
    let x = matrix(&[&[0.0, 1.0, 2.0], &[1.0, 0.0, 1.0], &[2.0, 1.5, 0.0]]);
    let result = KMedoidsConfig::new(2)
        .unwrap()
        .with_metric(Metric::Precomputed)
        .fit(&x);
    assert!(
        matches!(result, Err(ClusterError::Distance(_))),
        "expected a distance error for an asymmetric matrix, got {result:?}"
    );
}

/// New samples arrive as their distances to every training sample. Each
/// lands in the cluster of the training pair it sits next to, and transform
/// keeps only the medoid columns.
#[test]
fn precomputed_predicts_new_samples_from_cross_distances() {
    let train = matrix(&[&[1.0, 0.0], &[1.1, 0.0], &[0.0, 1.0], &[0.0, 1.1]]);
    let new = matrix(&[&[1.1, 0.0], &[0.0, 0.9]]);
    let d_train = FeatureMatrix::new(Metric::Euclidean.pairwise(&train).unwrap().to_rows()).unwrap();
    let d_new = Metric::Euclidean.cross(&new, &train).unwrap();
    let d_new_rows = FeatureMatrix::new(d_new.to_rows()).unwrap();

    let model = KMedoidsConfig::new(2)
        .unwrap()
        .with_metric(Metric::Precomputed)
        .fit(&d_train)
        .unwrap();
    let medoids = model.medoid_indices().to_vec();
    assert_eq!(medoids, vec![2, 0]);

    let predicted = indices(&model.predict(&d_new_rows).unwrap());
    assert_eq!(predicted, vec![medoids[0] / 2, medoids[1] / 2]);

    let transformed = model.transform(&d_new_rows).unwrap();
    assert_eq!((transformed.n_rows(), transformed.n_cols()), (2, 2));
    for i in 0..2 {
        for (c, &m) in medoids.iter().enumerate() {
            assert_eq!(transformed.get(i, c), d_new.get(i, m), "transform[{i}][{c}]");
        }
    }
}

#[test]
fn precomputed_prediction_rejects_wrong_width() {
    let x = matrix(&[&[1.0, 0.0], &[1.1, 0.0], &[0.0, 1.0], &[0.0, 1.1]]);
    let d = FeatureMatrix::new(Metric::Euclidean.pairwise(&x).unwrap().to_rows()).unwrap();
    let model = KMedoidsConfig::new(2)
        .unwrap()
        .with_metric(Metric::Precomputed)
        .fit(&d)
        .unwrap();
    let narrow = matrix(&[&[0.1, 0.2, 0.3]]);
    assert!(matches!(model.predict(&narrow), Err(ClusterError::Distance(_))));
}

// ---------------------------------------------------------------------------
// b) every point its own medoid
// ---------------------------------------------------------------------------

#[test]
fn k_equal_n_gives_zero_inertia() {
    let x = matrix(&[&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0], &[0.0, 0.0, 1.0]]);
    for method in METHODS {
        let model = KMedoidsConfig::new(3).unwrap().with_method(method).fit(&x).unwrap();

        let mut medoids = model.medoid_indices().to_vec();
        medoids.sort_unstable();
        assert_eq!(medoids, vec![0, 1, 2], "{method}");
        assert_eq!(model.inertia().value(), 0.0, "{method}");

        let transformed = model.transform(&x).unwrap();
        for (i, &m) in model.medoid_indices().iter().enumerate() {
            for c in 0..3 {
                let value = transformed.get(m, c);
                if c == i {
                    assert_eq!(value, 0.0, "{method}: medoid {m} to its own center");
                } else {
                    assert!(value > 0.0, "{method}: medoid {m} to center {c} should be positive");
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// c) outlier robustness
// ---------------------------------------------------------------------------

/// A single extreme outlier joins the nearer group instead of pulling a
/// medoid towards itself.
#[test]
fn outlier_does_not_capture_a_cluster() {
    let x = matrix(&[
        &[-11.0, 0.0],
        &[-10.0, 0.0],
        &[-9.0, 0.0],
        &[0.0, 0.0],
        &[1.0, 0.0],
        &[2.0, 0.0],
        &[1000.0, 0.0],
    ]);
    let model = KMedoidsConfig::new(2).unwrap().fit(&x).unwrap();
    assert_eq!(indices(model.labels()), vec![0, 0, 0, 1, 1, 1, 1]);
    assert_eq!(model.medoid_indices()[0], 1, "left group medoid should be its middle point");
}

// ---------------------------------------------------------------------------
// d) empty cluster warning
// ---------------------------------------------------------------------------

#[test]
fn identical_points_report_empty_cluster() {
    let x = matrix(&[&[1.0], &[1.0], &[1.0]]);
    let model = KMedoidsConfig::new(2).unwrap().fit(&x).unwrap();

    let empty: Vec<&FitWarning> = model
        .warnings()
        .iter()
        .filter(|w| matches!(w, FitWarning::EmptyCluster { cluster: 1, .. }))
        .collect();
    assert!(!empty.is_empty(), "expected an empty-cluster warning, got {:?}", model.warnings());
    assert!(
        empty[0].to_string().starts_with("Cluster 1 is empty!"),
        "unexpected warning text: {}",
        empty[0]
    );
    assert_eq!(model.inertia().value(), 0.0);
    assert_eq!(indices(model.labels()), vec![0, 0, 0]);
}

// ---------------------------------------------------------------------------
// e) both update rules solve the same problem
// ---------------------------------------------------------------------------

#[test]
fn alternating_and_pam_centers_agree() {
    let x = three_groups();
    let alternating = KMedoidsConfig::new(3).unwrap().fit(&x).unwrap();
    let pam = KMedoidsConfig::new(3).unwrap().with_method(Method::Pam).fit(&x).unwrap();

    let alt_centers = alternating.cluster_centers().unwrap();
    let pam_centers = pam.cluster_centers().unwrap();
    let tolerance = 2.0 * x.std();

    for a in alt_centers.rows() {
        let nearest = pam_centers
            .rows()
            .filter_map(|p| Metric::Euclidean.distance(a, p))
            .fold(f64::INFINITY, f64::min);
        assert!(
            nearest < tolerance,
            "alternating center {a:?} is {nearest} from every PAM center (tolerance {tolerance})"
        );
    }
    assert!((alternating.inertia().value() - pam.inertia().value()).abs() < 1e-9);
}

// ---------------------------------------------------------------------------
// f) structural guarantees
// ---------------------------------------------------------------------------

#[test]
fn inertia_history_is_non_increasing() {
    let x = three_groups();
    for method in METHODS {
        for init in [InitStrategy::Random, InitStrategy::Heuristic, InitStrategy::KMedoidsPlusPlus] {
            let model = KMedoidsConfig::new(3)
                .unwrap()
                .with_method(method)
                .with_init(init.clone())
                .with_seed(3)
                .fit(&x)
                .unwrap();
            let history = model.inertia_history();
            assert!(!history.is_empty());
            for pair in history.windows(2) {
                assert!(
                    pair[1].value() < pair[0].value(),
                    "{method}/{init}: accepted update did not lower inertia: {history:?}"
                );
            }
            assert_eq!(
                history.last().unwrap().value(),
                model.inertia().value(),
                "{method}/{init}: final inertia differs from last history entry"
            );
        }
    }
}

#[test]
fn medoids_are_distinct_in_range_and_count_k() {
    let x = three_groups();
    for k in 1..=9 {
        for method in METHODS {
            let model = KMedoidsConfig::new(k)
                .unwrap()
                .with_method(method)
                .with_init(InitStrategy::KMedoidsPlusPlus)
                .fit(&x)
                .unwrap();
            let mut medoids = model.medoid_indices().to_vec();
            assert_eq!(medoids.len(), k, "{method} k={k}");
            assert!(medoids.iter().all(|&m| m < 9), "{method} k={k}: {medoids:?}");
            medoids.sort_unstable();
            medoids.dedup();
            assert_eq!(medoids.len(), k, "{method} k={k}: duplicate medoids");
            assert!(model.labels().iter().all(|l| l.index() < k));
        }
    }
}

#[test]
fn each_medoid_labels_itself() {
    let model = KMedoidsConfig::new(3).unwrap().fit(&three_groups()).unwrap();
    for (c, &m) in model.medoid_indices().iter().enumerate() {
        assert_eq!(model.labels()[m].index(), c, "medoid {m} not in its own cluster");
    }
}

#[test]
fn fit_predict_matches_fit_then_predict() {
    let x = three_groups();
    let cfg = KMedoidsConfig::new(3).unwrap().with_init(InitStrategy::Random).with_seed(5);
    let direct = cfg.fit_predict(&x).unwrap();
    let model = cfg.fit(&x).unwrap();
    assert_eq!(direct, model.predict(&x).unwrap());
    assert_eq!(direct, model.labels());
}

#[test]
fn transform_matches_training_distances() {
    let x = three_groups();
    let d = Metric::Manhattan.pairwise(&x).unwrap();
    let cfg = KMedoidsConfig::new(3).unwrap().with_metric(Metric::Manhattan);
    let model = cfg.fit(&x).unwrap();
    let transformed = cfg.fit_transform(&x).unwrap();
    for i in 0..x.n_samples() {
        for (j, &m) in model.medoid_indices().iter().enumerate() {
            assert!(
                (transformed.get(i, j) - d.get(i, m)).abs() < 1e-12,
                "transform[{i}][{j}] differs from D[{i}][{m}]"
            );
        }
    }
}

#[test]
fn explicit_initial_medoids_are_respected() {
    let model = KMedoidsConfig::new(3)
        .unwrap()
        .with_init(InitStrategy::Indices(vec![0, 3, 6]))
        .with_max_iter(1)
        .fit(&three_groups())
        .unwrap();
    assert_eq!(model.medoid_indices(), &[0, 3, 6]);
    assert_eq!(model.termination(), Termination::Converged);
}

#[test]
fn sparse_input_matches_dense() {
    let x = three_groups();
    let mut triplets = Vec::new();
    for (i, row) in x.rows().enumerate() {
        for (j, &v) in row.iter().enumerate() {
            if v != 0.0 {
                triplets.push((i, j, v));
            }
        }
    }
    let sparse = SparseMatrix::from_triplets(9, 2, &triplets).unwrap();

    let cfg = KMedoidsConfig::new(3).unwrap();
    let dense_model = cfg.fit(&x).unwrap();
    let sparse_model = cfg.fit_sparse(&sparse).unwrap();
    assert_eq!(sparse_model.medoid_indices(), dense_model.medoid_indices());
    assert_eq!(sparse_model.labels(), dense_model.labels());
}

/// Two samples with one non-zero feature each, stored sparsely.
#[test]
fn sparse_two_by_five_fit_predict() {
    let sparse = SparseMatrix::from_triplets(2, 5, &[(1, 0, 1.0), (0, 4, 1.0)]).unwrap();
    let cfg = KMedoidsConfig::new(2).unwrap();

    let labels = cfg.fit_predict_sparse(&sparse).unwrap();
    let model = cfg.fit_sparse(&sparse).unwrap();
    assert_eq!(labels.len(), 2);
    assert_eq!(labels, model.labels());
    assert_eq!(model.predict_sparse(&sparse).unwrap(), labels);

    let transformed = cfg.fit_transform_sparse(&sparse).unwrap();
    let dense = model.transform(&sparse.to_dense().unwrap()).unwrap();
    assert_eq!(transformed, model.transform_sparse(&sparse).unwrap());
    assert_eq!(transformed, dense);
    assert!(model.inertia().value().abs() < 1e-12);
}

// ---------------------------------------------------------------------------
// g) parameter errors
// ---------------------------------------------------------------------------

#[test]
fn error_messages() {
    let x = three_groups();

    let err = KMedoidsConfig::new(0).unwrap_err();
    assert_eq!(err.to_string(), "n_clusters should be a nonnegative integer. 0 was given");

    let err = KMedoidsConfig::new(10).unwrap().fit(&x).unwrap_err();
    assert_eq!(
        err.to_string(),
        "The number of medoids (10) must be less than the number of samples 9."
    );

    let err = "kmeans".parse::<Method>().unwrap_err();
    assert!(matches!(err, ClusterError::UnknownMethod { .. }));

    let err = "build".parse::<InitStrategy>().unwrap_err();
    assert!(matches!(err, ClusterError::UnknownInit { .. }));

    let err = KMedoidsConfig::new(2).unwrap().with_max_iter(0).fit(&x).unwrap_err();
    assert!(matches!(err, ClusterError::InvalidMaxIter { value: 0 }));

    let err = KMedoidsConfig::new(2)
        .unwrap()
        .with_init(InitStrategy::Indices(vec![1, 1]))
        .fit(&x)
        .unwrap_err();
    assert!(matches!(err, ClusterError::InvalidInitialMedoids { .. }));
}

// ---------------------------------------------------------------------------
// h) sweeps and sampling
// ---------------------------------------------------------------------------

#[test]
fn optimize_picks_three_groups() {
    let result = OptimizeConfig::new(1, 6)
        .unwrap()
        .with_silhouette(true)
        .fit(&three_groups())
        .unwrap();
    assert_eq!(result.results.len(), 6);
    assert_eq!(result.best_k_by_silhouette(), Some(3));
    assert_eq!(result.results[2].k, 3);
    assert!(result.results[2].inertia.value() < 1.0);
}

#[test]
fn clara_matches_full_fit_on_small_data() {
    let x = three_groups();
    let model = ClaraConfig::new(3).unwrap().with_seed(1).fit(&x).unwrap();
    // The default sample size covers all nine rows.
    assert!((model.inertia().value() - 0.6).abs() < 1e-9, "got {}", model.inertia());
    assert_eq!(model.cluster_sizes(), vec![3, 3, 3]);
}

// ---------------------------------------------------------------------------
// i) caller-supplied metrics
// ---------------------------------------------------------------------------

fn euclidean_fn(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f64>().sqrt()
}

/// Penalizes moving right along the first feature, so `d(a, b) != d(b, a)`.
fn rightward_penalty(a: &[f64], b: &[f64]) -> f64 {
    euclidean_fn(a, b) + 2.7 * (b[0] - a[0]).max(0.0)
}

fn random_points(seed: u64, n: usize) -> FeatureMatrix {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    FeatureMatrix::new(
        (0..n)
            .map(|_| vec![rng.gen_range(0.0..10.0), rng.gen_range(0.0..10.0)])
            .collect(),
    )
    .unwrap()
}

/// Inertia of `medoids` with each sample charged `D[sample][medoid]`.
fn inertia_of(d: &DistanceMatrix, medoids: &[usize]) -> f64 {
    (0..d.n_rows())
        .map(|j| medoids.iter().map(|&m| d.get(j, m)).fold(f64::INFINITY, f64::min))
        .sum()
}

#[test]
fn custom_euclidean_matches_named_metric() {
    let x = three_groups();
    let cfg = KMedoidsConfig::new(3)
        .unwrap()
        .with_metric(Metric::Custom(CustomMetric::new("my-euclidean", euclidean_fn)));

    let labels = cfg.fit_predict(&x).unwrap();
    let model = cfg.fit(&x).unwrap();
    assert_eq!(labels.len(), 9);
    assert_eq!(labels, model.labels());
    assert_eq!(model.metric().to_string(), "my-euclidean");

    let named = KMedoidsConfig::new(3).unwrap().fit(&x).unwrap();
    assert_eq!(model.medoid_indices(), named.medoid_indices());
    assert!((model.inertia().value() - named.inertia().value()).abs() < 1e-12);
}

/// With a direction-dependent metric, PAM must still stop at a set no single
/// swap can improve, charging each sample its distance to the medoid.
#[test]
fn pam_with_asymmetric_metric_reaches_swap_optimum() {
    let metric = Metric::Custom(CustomMetric::new("rightward-penalty", rightward_penalty));
    for seed in 0..10 {
        let x = random_points(seed, 30);
        let d = metric.pairwise(&x).unwrap();
        assert_ne!(d.get(0, 1), d.get(1, 0), "seed {seed}: metric should be asymmetric");

        let model = KMedoidsConfig::new(3)
            .unwrap()
            .with_metric(metric.clone())
            .with_method(Method::Pam)
            .fit(&x)
            .unwrap();
        let medoids = model.medoid_indices().to_vec();
        let current = inertia_of(&d, &medoids);
        assert!(
            (model.inertia().value() - current).abs() < 1e-9,
            "seed {seed}: reported inertia {} but medoids cost {current}",
            model.inertia()
        );

        for position in 0..medoids.len() {
            for h in (0..x.n_samples()).filter(|h| !medoids.contains(h)) {
                let mut swapped = medoids.clone();
                swapped[position] = h;
                let cost = inertia_of(&d, &swapped);
                assert!(
                    cost >= current - 1e-9,
                    "seed {seed}: swapping position {position} for {h} lowers inertia {current} to {cost}"
                );
            }
        }
    }
}

/// Alternating updates also charge each member its distance to the medoid,
/// so inertia stays the true cost of the final set.
#[test]
fn alternating_with_asymmetric_metric_reports_true_inertia() {
    let metric = Metric::Custom(CustomMetric::new("rightward-penalty", rightward_penalty));
    for seed in 0..5 {
        let x = random_points(seed, 30);
        let d = metric.pairwise(&x).unwrap();
        let model = KMedoidsConfig::new(3)
            .unwrap()
            .with_metric(metric.clone())
            .fit(&x)
            .unwrap();
        let current = inertia_of(&d, model.medoid_indices());
        assert!((model.inertia().value() - current).abs() < 1e-9, "seed {seed}");
        let history = model.inertia_history();
        for pair in history.windows(2) {
            assert!(pair[1].value() < pair[0].value(), "seed {seed}: {history:?}");
        }
    }
}
