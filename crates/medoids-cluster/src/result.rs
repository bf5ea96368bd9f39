//! Fit diagnostics and cluster-count sweep results.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::inertia::Inertia;

/// How refinement stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// The medoid set stopped changing or inertia stopped strictly decreasing.
    Converged,
    /// The iteration limit was hit first; the last accepted medoid set is kept.
    MaxIterReached,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Converged => f.write_str("converged"),
            Self::MaxIterReached => f.write_str("max_iter_reached"),
        }
    }
}

/// Non-fatal condition observed while fitting.
///
/// Each warning is also emitted through `tracing::warn!` when it occurs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FitWarning {
    /// A cluster had no members during an update; its medoid was left in place.
    EmptyCluster {
        /// Position of the empty cluster in the medoid set.
        cluster: usize,
        /// One-based refinement iteration.
        iteration: usize,
    },
    /// Refinement used every allowed iteration without converging.
    MaxIterReached {
        /// The configured iteration limit.
        max_iter: usize,
    },
}

impl fmt::Display for FitWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyCluster { cluster, .. } => write!(
                f,
                "Cluster {cluster} is empty! labels of medoid {cluster} may not be labeled with its corresponding cluster ({cluster})."
            ),
            Self::MaxIterReached { .. } => f.write_str(
                "Maximum number of iteration reached before convergence. Consider increasing max_iter to improve the fit.",
            ),
        }
    }
}

/// Outcome of fitting a single k in a sweep.
#[derive(Debug, Clone)]
pub struct KResult {
    /// The number of clusters.
    pub k: usize,
    /// Final inertia for this k.
    pub inertia: Inertia,
    /// Refinement iterations used.
    pub n_iter: usize,
    /// Whether refinement converged before the iteration limit.
    pub converged: bool,
    /// Mean silhouette score, when requested and defined.
    pub silhouette: Option<f64>,
}

/// Result of a cluster-count sweep.
#[derive(Debug, Clone)]
pub struct OptimizeResult {
    /// Results for each k value tested, ordered by ascending k.
    pub results: Vec<KResult>,
}

impl OptimizeResult {
    /// Return the best k using the maximum second-derivative (elbow) heuristic.
    ///
    /// For each interior point `i` (not the first or last), the discrete second
    /// derivative is:
    ///
    /// ```text
    /// d2[i] = inertia[i-1] - 2 * inertia[i] + inertia[i+1]
    /// ```
    ///
    /// The k with the highest `d2` value is the elbow. The first maximum wins.
    ///
    /// - Returns `None` when `results` is empty.
    /// - Returns the first k when `results` has fewer than 3 entries.
    #[must_use]
    pub fn best_k(&self) -> Option<usize> {
        let first = self.results.first()?;
        let n = self.results.len();
        if n < 3 {
            return Some(first.k);
        }

        let inertias: Vec<f64> = self.results.iter().map(|r| r.inertia.value()).collect();
        let mut best = (1, f64::NEG_INFINITY);
        for i in 1..n - 1 {
            let d2 = inertias[i - 1] - 2.0 * inertias[i] + inertias[i + 1];
            if d2 > best.1 {
                best = (i, d2);
            }
        }
        Some(self.results[best.0].k)
    }

    /// Return the k with the highest mean silhouette score, if any were computed.
    #[must_use]
    pub fn best_k_by_silhouette(&self) -> Option<usize> {
        self.results
            .iter()
            .filter_map(|r| r.silhouette.map(|s| (r.k, s)))
            .fold(None, |best: Option<(usize, f64)>, (k, s)| match best {
                Some((_, best_s)) if best_s >= s => best,
                _ => Some((k, s)),
            })
            .map(|(k, _)| k)
    }
}
