//! Initial medoid selection: random, heuristic, and k-medoids++.

use std::fmt;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use medoids_distance::DistanceMatrix;

use crate::config::InitStrategy;
use crate::error::ClusterError;

/// Caller-supplied initial medoid selection.
///
/// Implementations receive the training distance matrix, the number of
/// medoids to choose, and the fit's random source. The returned indices are
/// checked before refinement starts: exactly `k` of them, all distinct, all
/// in `0..distances.n_rows()`.
pub trait MedoidInitializer: Send + Sync + fmt::Debug {
    /// Choose `k` initial medoid row indices.
    fn initial_medoids(&self, distances: &DistanceMatrix, k: usize, rng: &mut ChaCha8Rng)
        -> Vec<usize>;
}

/// Sample `k` distinct indices uniformly from `0..n`.
#[must_use]
pub fn random_medoids(n: usize, k: usize, rng: &mut ChaCha8Rng) -> Vec<usize> {
    rand::seq::index::sample(rng, n, k).into_vec()
}

/// Deterministic centrality heuristic.
///
/// Scores each sample by its total distance to every other sample and takes
/// the `k` lowest scores. Ties keep sample order, so the result is
/// independent of any seed.
#[must_use]
pub fn heuristic_medoids(distances: &DistanceMatrix, k: usize) -> Vec<usize> {
    let scores = distances.row_sums();
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));
    order.truncate(k);
    order
}

/// k-medoids++ seeding over a dissimilarity matrix.
///
/// The first medoid is uniform. Each later medoid is chosen by drawing
/// `2 + floor(ln k)` candidates with probability proportional to their
/// squared distance to the nearest chosen medoid and keeping the candidate
/// that leaves the smallest total squared distance.
#[must_use]
pub fn kmedoids_plus_plus(distances: &DistanceMatrix, k: usize, rng: &mut ChaCha8Rng) -> Vec<usize> {
    let n = distances.n_rows();
    let n_local_trials = 2 + (k as f64).ln().floor() as usize;

    let first = rng.gen_range(0..n);
    let mut medoids = Vec::with_capacity(k);
    medoids.push(first);

    let mut closest_sq: Vec<f64> = (0..n).map(|j| distances.get(j, first).powi(2)).collect();
    let mut potential: f64 = closest_sq.iter().sum();

    while medoids.len() < k {
        if potential <= 0.0 {
            // Every remaining sample coincides with a chosen medoid.
            let next = (0..n).find(|i| !medoids.contains(i)).unwrap_or(0);
            medoids.push(next);
            continue;
        }

        let cumulative: Vec<f64> = closest_sq
            .iter()
            .scan(0.0, |acc, &d| {
                *acc += d;
                Some(*acc)
            })
            .collect();

        let mut best: Option<(usize, f64, Vec<f64>)> = None;
        for _ in 0..n_local_trials {
            let threshold = rng.r#gen::<f64>() * potential;
            let candidate = cumulative
                .iter()
                .position(|&c| c > threshold)
                .or_else(|| closest_sq.iter().rposition(|&d| d > 0.0))
                .unwrap_or(n - 1);

            let candidate_sq: Vec<f64> = closest_sq
                .iter()
                .enumerate()
                .map(|(j, &current)| current.min(distances.get(j, candidate).powi(2)))
                .collect();
            let candidate_pot: f64 = candidate_sq.iter().sum();

            if best.as_ref().is_none_or(|(_, pot, _)| candidate_pot < *pot) {
                best = Some((candidate, candidate_pot, candidate_sq));
            }
        }

        if let Some((candidate, pot, sq)) = best {
            medoids.push(candidate);
            potential = pot;
            closest_sq = sq;
        }
    }

    medoids
}

/// Resolve `strategy` into `k` validated initial medoid indices.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`ClusterError::InvalidInitialMedoids`] | Supplied indices are not `k` distinct in-range rows |
#[instrument(skip(strategy, distances, rng), fields(init = %strategy, n = distances.n_rows(), k))]
pub(crate) fn initialize(
    strategy: &InitStrategy,
    distances: &DistanceMatrix,
    k: usize,
    rng: &mut ChaCha8Rng,
) -> Result<Vec<usize>, ClusterError> {
    let n = distances.n_rows();
    let medoids = match strategy {
        InitStrategy::Random => random_medoids(n, k, rng),
        InitStrategy::Heuristic => heuristic_medoids(distances, k),
        InitStrategy::KMedoidsPlusPlus => kmedoids_plus_plus(distances, k, rng),
        InitStrategy::Indices(indices) => indices.clone(),
        InitStrategy::Custom(initializer) => initializer.initial_medoids(distances, k, rng),
    };
    validate_medoids(&medoids, k, n)?;
    debug!(?medoids, "initial medoids selected");
    Ok(medoids)
}

fn validate_medoids(medoids: &[usize], k: usize, n: usize) -> Result<(), ClusterError> {
    if medoids.len() != k {
        return Err(ClusterError::InvalidInitialMedoids {
            reason: format!("expected {k} indices, got {}", medoids.len()),
        });
    }
    if let Some(&bad) = medoids.iter().find(|&&m| m >= n) {
        return Err(ClusterError::InvalidInitialMedoids {
            reason: format!("index {bad} out of range for {n} samples"),
        });
    }
    for (pos, m) in medoids.iter().enumerate() {
        if medoids[..pos].contains(m) {
            return Err(ClusterError::InvalidInitialMedoids {
                reason: format!("index {m} appears more than once"),
            });
        }
    }
    Ok(())
}
