//! k-medoids fit pipeline and cluster-count sweep.
//!
//! Validates parameters, builds the distance matrix once, then runs
//! initialization and refinement on it.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, instrument};

use medoids_distance::{DistanceMatrix, FeatureMatrix, Metric};

use crate::config::{InitStrategy, KMedoidsConfig, Method, OptimizeConfig};
use crate::error::ClusterError;
use crate::init::initialize;
use crate::model::KMedoidsModel;
use crate::refine::{Refined, refine};
use crate::result::{KResult, OptimizeResult, Termination};
use crate::silhouette::compute_silhouette;

// ── run ───────────────────────────────────────────────────────────────────────

/// Initialize and refine `k` medoids on an already-built distance matrix.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`ClusterError::InvalidInitialMedoids`] | Explicit or custom initial medoids are invalid |
pub(crate) fn run(
    distances: &DistanceMatrix,
    k: usize,
    method: Method,
    init: &InitStrategy,
    max_iter: usize,
    seed: u64,
) -> Result<Refined, ClusterError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let initial = initialize(init, distances, k, &mut rng)?;
    Ok(refine(distances, initial, method.strategy(), max_iter))
}

/// Package a refinement result as a model.
pub(crate) fn into_model(
    refined: Refined,
    metric: &Metric,
    method: Method,
    init: &InitStrategy,
    x: &FeatureMatrix,
) -> KMedoidsModel {
    let cluster_centers = (!metric.is_precomputed()).then(|| x.select_rows(&refined.medoids));
    KMedoidsModel {
        metric: metric.clone(),
        method,
        init: init.to_string(),
        labels: refined.assignment.labels,
        inertia: refined.assignment.inertia,
        medoid_indices: refined.medoids,
        n_iter: refined.n_iter,
        termination: refined.termination,
        inertia_history: refined.inertia_history,
        cluster_centers,
        warnings: refined.warnings,
        n_train: x.n_samples(),
    }
}

// ── fit ───────────────────────────────────────────────────────────────────────

/// Fit k-medoids to `x` with `config`.
///
/// # Errors
///
/// See [`KMedoidsConfig::fit`].
#[instrument(skip(config, x), fields(k = config.n_clusters, n = x.n_samples(), metric = %config.metric, method = %config.method))]
pub(crate) fn fit(config: &KMedoidsConfig, x: &FeatureMatrix) -> Result<KMedoidsModel, ClusterError> {
    config.validate(x.n_samples())?;

    let distances = config.metric.pairwise(x)?;
    let refined = run(
        &distances,
        config.n_clusters,
        config.method,
        &config.init,
        config.max_iter,
        config.seed,
    )?;

    info!(
        inertia = refined.assignment.inertia.value(),
        n_iter = refined.n_iter,
        medoids = ?refined.medoids,
        "fit complete"
    );

    Ok(into_model(refined, &config.metric, config.method, &config.init, x))
}

// ── optimize ──────────────────────────────────────────────────────────────────

/// Fit each k in `[config.min_k, config.max_k]` on one shared distance matrix
/// and collect the inertia curve.
///
/// # Errors
///
/// Propagates the first [`ClusterError`] from any k value.
#[instrument(skip(config, x), fields(min_k = config.min_k, max_k = config.max_k, n = x.n_samples()))]
pub(crate) fn optimize(config: &OptimizeConfig, x: &FeatureMatrix) -> Result<OptimizeResult, ClusterError> {
    if config.max_iter == 0 {
        return Err(ClusterError::InvalidMaxIter { value: config.max_iter });
    }
    let n = x.n_samples();
    if config.max_k > n {
        return Err(ClusterError::TooManyClusters { k: config.max_k, n });
    }

    debug!("computing pairwise distance matrix");
    let distances = config.metric.pairwise(x)?;

    let mut results = Vec::with_capacity(config.max_k - config.min_k + 1);
    for k in config.min_k..=config.max_k {
        let refined = run(&distances, k, config.method, &config.init, config.max_iter, config.seed)?;

        let silhouette = if config.silhouette {
            compute_silhouette(&distances, &refined.assignment.labels, k)
                .ok()
                .map(|score| score.mean_score)
        } else {
            None
        };

        debug!(k, inertia = refined.assignment.inertia.value(), "k complete");
        results.push(KResult {
            k,
            inertia: refined.assignment.inertia,
            n_iter: refined.n_iter,
            converged: refined.termination == Termination::Converged,
            silhouette,
        });
    }

    info!(min_k = config.min_k, max_k = config.max_k, "optimize complete");

    Ok(OptimizeResult { results })
}

// ── tests ─────────────────────────────────────────────────────────────────────
