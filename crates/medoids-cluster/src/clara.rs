//! CLARA: PAM on random subsamples, scored on the full dataset.

use std::cmp::Ordering;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use medoids_distance::FeatureMatrix;

use crate::assign::{Assignment, assign_to_columns};
use crate::config::{ClaraConfig, Method};
use crate::error::ClusterError;
use crate::init::initialize;
use crate::model::KMedoidsModel;
use crate::refine::{Pam, refine};
use crate::result::{FitWarning, Termination};

/// Outcome of one sampling round, with medoids mapped back to full-data rows.
struct Round {
    medoids: Vec<usize>,
    assignment: Assignment,
    n_iter: usize,
    termination: Termination,
    warnings: Vec<FitWarning>,
}

/// Fit CLARA to `x`.
///
/// Per-round seeds are drawn from a generator seeded with `config.seed`, so
/// the result is reproducible even though rounds run in parallel. The round
/// with the lowest full-data inertia wins; ties go to the earlier round.
///
/// # Errors
///
/// See [`ClaraConfig::fit`].
#[instrument(skip(config, x), fields(k = config.n_clusters, n = x.n_samples(), n_sampling_iter = config.n_sampling_iter))]
pub(crate) fn fit(config: &ClaraConfig, x: &FeatureMatrix) -> Result<KMedoidsModel, ClusterError> {
    if config.metric.is_precomputed() {
        return Err(ClusterError::PrecomputedUnsupported);
    }
    if config.max_iter == 0 {
        return Err(ClusterError::InvalidMaxIter { value: config.max_iter });
    }
    if config.n_sampling_iter == 0 {
        return Err(ClusterError::InvalidSamplingIter { value: config.n_sampling_iter });
    }
    let n = x.n_samples();
    let k = config.n_clusters;
    if k > n {
        return Err(ClusterError::TooManyClusters { k, n });
    }
    let n_sampling = config.n_sampling(n);
    if n_sampling < k {
        return Err(ClusterError::SamplingTooSmall { n_sampling, k });
    }
    let n_sampling = n_sampling.min(n);

    let mut master_rng = ChaCha8Rng::seed_from_u64(config.seed);
    let seeds: Vec<u64> = (0..config.n_sampling_iter).map(|_| master_rng.r#gen()).collect();

    let rounds: Vec<Result<Round, ClusterError>> = seeds
        .into_par_iter()
        .map(|seed| run_round(config, x, n_sampling, seed))
        .collect();

    let mut best: Option<Round> = None;
    for round in rounds {
        let round = round?;
        debug!(inertia = round.assignment.inertia.value(), medoids = ?round.medoids, "round complete");
        best = match best {
            Some(prev) if round.assignment.inertia.total_cmp(&prev.assignment.inertia) != Ordering::Less => {
                Some(prev)
            }
            _ => Some(round),
        };
    }
    let Some(best) = best else {
        return Err(ClusterError::InvalidSamplingIter { value: 0 });
    };

    info!(
        n_sampling,
        inertia = best.assignment.inertia.value(),
        medoids = ?best.medoids,
        "clara complete"
    );

    Ok(KMedoidsModel {
        metric: config.metric.clone(),
        method: Method::Pam,
        init: config.init.to_string(),
        cluster_centers: Some(x.select_rows(&best.medoids)),
        labels: best.assignment.labels,
        inertia: best.assignment.inertia,
        inertia_history: vec![best.assignment.inertia],
        medoid_indices: best.medoids,
        n_iter: best.n_iter,
        termination: best.termination,
        warnings: best.warnings,
        n_train: n,
    })
}

fn run_round(
    config: &ClaraConfig,
    x: &FeatureMatrix,
    n_sampling: usize,
    seed: u64,
) -> Result<Round, ClusterError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut sample = rand::seq::index::sample(&mut rng, x.n_samples(), n_sampling).into_vec();
    sample.sort_unstable();

    let distances = config.metric.pairwise(&x.select_rows(&sample))?;
    let initial = initialize(&config.init, &distances, config.n_clusters, &mut rng)?;
    let refined = refine(&distances, initial, &Pam, config.max_iter);

    let medoids: Vec<usize> = refined.medoids.iter().map(|&m| sample[m]).collect();
    let cross = config.metric.cross(x, &x.select_rows(&medoids))?;

    Ok(Round {
        medoids,
        assignment: assign_to_columns(&cross),
        n_iter: refined.n_iter,
        termination: refined.termination,
        warnings: refined.warnings,
    })
}
