//! Medoid refinement: update strategies and the iterate-until-stable loop.

use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use medoids_distance::DistanceMatrix;

use crate::assign::{Assignment, assign};
use crate::config::Method;
use crate::inertia::Inertia;
use crate::result::{FitWarning, Termination};

/// Proposed medoid set from one update step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    /// The next medoid set, same length and order as the input set.
    pub medoids: Vec<usize>,
    /// Positions of clusters that had no members during this step.
    pub empty_clusters: Vec<usize>,
}

/// A medoid update rule: `(D, M, L) -> M'`.
///
/// Implementations must return a set of distinct row indices of the same
/// length as `medoids`, and must return `medoids` unchanged when no
/// improvement is found.
pub trait UpdateStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Propose the next medoid set from the current set and its assignment.
    fn step(&self, distances: &DistanceMatrix, medoids: &[usize], assignment: &Assignment)
        -> StepOutcome;
}

impl Method {
    /// Return the update rule implementing this method.
    #[must_use]
    pub fn strategy(self) -> &'static dyn UpdateStrategy {
        match self {
            Self::Alternating => &Alternating,
            Self::Pam => &Pam,
        }
    }
}

// ── alternating ───────────────────────────────────────────────────────────────

/// Per-cluster update.
///
/// Each cluster's medoid moves to the member with the smallest summed
/// distance to the other members, if that sum is strictly below the current
/// medoid's. Empty clusters keep their medoid.
#[derive(Debug, Clone, Copy, Default)]
pub struct Alternating;

impl UpdateStrategy for Alternating {
    fn name(&self) -> &'static str {
        "alternating"
    }

    fn step(
        &self,
        distances: &DistanceMatrix,
        medoids: &[usize],
        assignment: &Assignment,
    ) -> StepOutcome {
        let mut next = medoids.to_vec();
        let mut empty_clusters = Vec::new();

        for (c, members) in assignment.members(medoids.len()).iter().enumerate() {
            if members.is_empty() {
                empty_clusters.push(c);
                continue;
            }

            let cost_of = |m: usize| members.iter().map(|&j| distances.get(j, m)).sum::<f64>();

            let costs: Vec<f64> = members.par_iter().map(|&m| cost_of(m)).collect();
            let mut best: Option<(usize, f64)> = None;
            for (&m, &cost) in members.iter().zip(&costs) {
                // Another cluster's medoid can land here on a zero-distance tie.
                if m != medoids[c] && medoids.contains(&m) {
                    continue;
                }
                if best.is_none_or(|(_, b)| cost < b) {
                    best = Some((m, cost));
                }
            }

            if let Some((m, cost)) = best
                && cost < cost_of(medoids[c])
            {
                next[c] = m;
            }
        }

        StepOutcome { medoids: next, empty_clusters }
    }
}

// ── pam ───────────────────────────────────────────────────────────────────────

/// Partitioning Around Medoids swap step.
///
/// Evaluates the inertia change of every (medoid, non-medoid) swap and
/// applies the single most improving one. Candidates are scored in
/// parallel; the first best swap in (candidate, medoid position) order wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pam;

impl UpdateStrategy for Pam {
    fn name(&self) -> &'static str {
        "pam"
    }

    fn step(
        &self,
        distances: &DistanceMatrix,
        medoids: &[usize],
        _assignment: &Assignment,
    ) -> StepOutcome {
        let n = distances.n_rows();
        let (nearest, second) = nearest_two(distances, medoids);

        let mut is_medoid = vec![false; n];
        for &m in medoids {
            is_medoid[m] = true;
        }

        let scored: Vec<(usize, usize, f64)> = (0..n)
            .into_par_iter()
            .filter(|&h| !is_medoid[h])
            .map(|h| {
                let mut best = (0, f64::INFINITY);
                for (position, &i) in medoids.iter().enumerate() {
                    let delta = swap_delta(distances, i, h, &nearest, &second);
                    if delta < best.1 {
                        best = (position, delta);
                    }
                }
                (h, best.0, best.1)
            })
            .collect();

        let mut best: Option<(usize, usize, f64)> = None;
        for (h, position, delta) in scored {
            if delta < best.map_or(0.0, |(_, _, d)| d) {
                best = Some((h, position, delta));
            }
        }

        let mut next = medoids.to_vec();
        if let Some((h, position, delta)) = best {
            debug!(swap_out = medoids[position], swap_in = h, delta, "pam swap");
            next[position] = h;
        }

        StepOutcome { medoids: next, empty_clusters: Vec::new() }
    }
}

/// Distance from every sample to its nearest and second-nearest medoid.
/// The second distance is infinite when there is only one medoid.
fn nearest_two(distances: &DistanceMatrix, medoids: &[usize]) -> (Vec<f64>, Vec<f64>) {
    let n = distances.n_rows();
    let mut nearest = vec![f64::INFINITY; n];
    let mut second = vec![f64::INFINITY; n];
    for j in 0..n {
        for &m in medoids {
            let d = distances.get(j, m);
            if d < nearest[j] {
                second[j] = nearest[j];
                nearest[j] = d;
            } else if d < second[j] {
                second[j] = d;
            }
        }
    }
    (nearest, second)
}

/// Inertia change from replacing medoid `i` with non-medoid `h`.
fn swap_delta(distances: &DistanceMatrix, i: usize, h: usize, nearest: &[f64], second: &[f64]) -> f64 {
    let mut delta = 0.0;
    for j in 0..distances.n_rows() {
        let to_h = distances.get(j, h);
        if distances.get(j, i) == nearest[j] {
            delta += to_h.min(second[j]) - nearest[j];
        } else if to_h < nearest[j] {
            delta += to_h - nearest[j];
        }
    }
    delta
}

// ── refine ────────────────────────────────────────────────────────────────────

/// Final state of a refinement run.
#[derive(Debug, Clone)]
pub struct Refined {
    /// Final medoid row indices.
    pub medoids: Vec<usize>,
    /// Assignment of every sample to the final medoids.
    pub assignment: Assignment,
    /// Number of iterations performed (one-based).
    pub n_iter: usize,
    /// How refinement stopped.
    pub termination: Termination,
    /// Inertia of the initial medoid set followed by every accepted update.
    pub inertia_history: Vec<Inertia>,
    /// Non-fatal conditions observed during refinement.
    pub warnings: Vec<FitWarning>,
}

/// Refine `initial` medoids with `strategy` until the set stops changing,
/// inertia stops strictly decreasing, or `max_iter` iterations have run.
///
/// An update that does not strictly lower inertia is discarded and counts as
/// convergence, so inertia never increases across accepted updates.
#[instrument(skip(distances, initial, strategy), fields(n = distances.n_rows(), k = initial.len(), method = strategy.name()))]
pub fn refine(
    distances: &DistanceMatrix,
    initial: Vec<usize>,
    strategy: &dyn UpdateStrategy,
    max_iter: usize,
) -> Refined {
    let mut medoids = initial;
    let mut assignment = assign(distances, &medoids);
    let mut inertia_history = vec![assignment.inertia];
    let mut warnings = Vec::new();
    let mut termination = Termination::MaxIterReached;
    let mut n_iter = max_iter;

    for iteration in 1..=max_iter {
        let step = strategy.step(distances, &medoids, &assignment);

        for &cluster in &step.empty_clusters {
            let warning = FitWarning::EmptyCluster { cluster, iteration };
            warn!(cluster, iteration, "{warning}");
            warnings.push(warning);
        }

        if step.medoids == medoids {
            termination = Termination::Converged;
            n_iter = iteration;
            debug!(iteration, "medoids unchanged");
            break;
        }

        let candidate = assign(distances, &step.medoids);
        if !candidate.inertia.improves_on(assignment.inertia) {
            termination = Termination::Converged;
            n_iter = iteration;
            debug!(iteration, "inertia did not decrease");
            break;
        }

        medoids = step.medoids;
        assignment = candidate;
        inertia_history.push(assignment.inertia);
        debug!(iteration, inertia = assignment.inertia.value(), "iteration complete");
    }

    if termination == Termination::MaxIterReached {
        let warning = FitWarning::MaxIterReached { max_iter };
        warn!(max_iter, "{warning}");
        warnings.push(warning);
    }

    info!(
        n_iter,
        inertia = assignment.inertia.value(),
        %termination,
        "refinement complete"
    );

    Refined {
        medoids,
        assignment,
        n_iter,
        termination,
        inertia_history,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use medoids_distance::{FeatureMatrix, Metric};

    use super::*;

    fn line() -> DistanceMatrix {
        let x = FeatureMatrix::new(
            [0.0, 1.0, 2.0, 10.0, 11.0, 12.0].iter().map(|&v| vec![v]).collect(),
        )
        .unwrap();
        Metric::Euclidean.pairwise(&x).unwrap()
    }

    #[test]
    fn alternating_moves_to_cluster_center() {
        let d = line();
        let a = assign(&d, &[0, 3]);
        let step = Alternating.step(&d, &[0, 3], &a);
        assert_eq!(step.medoids, vec![1, 4]);
        assert!(step.empty_clusters.is_empty());
    }

    #[test]
    fn alternating_reports_empty_cluster() {
        let x = FeatureMatrix::new(vec![vec![1.0], vec![1.0], vec![1.0]]).unwrap();
        let d = Metric::Euclidean.pairwise(&x).unwrap();
        let a = assign(&d, &[0, 1]);
        let step = Alternating.step(&d, &[0, 1], &a);
        assert_eq!(step.empty_clusters, vec![1]);
        assert_eq!(step.medoids, vec![0, 1], "empty cluster keeps its medoid");
    }

    #[test]
    fn pam_applies_best_single_swap() {
        let d = line();
        let a = assign(&d, &[1, 2]);
        let step = Pam.step(&d, &[1, 2], &a);
        // Swapping medoid 2 for 4 drops inertia from 28 to 4.
        assert_eq!(step.medoids, vec![1, 4]);
    }

    #[test]
    fn pam_delta_matches_inertia_change() {
        let d = line();
        let medoids = [0, 2];
        let before = assign(&d, &medoids).inertia.value();
        let (nearest, second) = nearest_two(&d, &medoids);
        for h in [1, 3, 4, 5] {
            for (position, &i) in medoids.iter().enumerate() {
                let mut swapped = medoids.to_vec();
                swapped[position] = h;
                let after = assign(&d, &swapped).inertia.value();
                let delta = swap_delta(&d, i, h, &nearest, &second);
                assert!(
                    (after - before - delta).abs() < 1e-9,
                    "swap {i}->{h}: delta {delta} but inertia moved {}",
                    after - before
                );
            }
        }
    }

    #[test]
    fn pam_single_medoid_uses_infinite_second() {
        let d = line();
        let a = assign(&d, &[5]);
        let step = Pam.step(&d, &[5], &a);
        assert_eq!(step.medoids.len(), 1);
        assert!(assign(&d, &step.medoids).inertia.value() < a.inertia.value());
    }

    #[test]
    fn refine_converges_and_history_decreases() {
        let d = line();
        for method in [Method::Alternating, Method::Pam] {
            let refined = refine(&d, vec![0, 1], method.strategy(), 300);
            assert_eq!(refined.termination, Termination::Converged, "{method}");
            assert_eq!(refined.assignment.inertia.value(), 4.0, "{method}");
            for pair in refined.inertia_history.windows(2) {
                assert!(
                    pair[1].value() < pair[0].value(),
                    "{method}: history not strictly decreasing: {:?}",
                    refined.inertia_history
                );
            }
        }
    }

    #[test]
    fn refine_stops_at_max_iter_with_warning() {
        let d = line();
        let refined = refine(&d, vec![0, 3], &Alternating, 1);
        assert_eq!(refined.termination, Termination::MaxIterReached);
        assert_eq!(refined.n_iter, 1);
        assert_eq!(refined.medoids, vec![1, 4], "the accepted update is kept");
        assert_eq!(refined.warnings, vec![FitWarning::MaxIterReached { max_iter: 1 }]);
    }

    #[test]
    fn refine_counts_iterations_one_based() {
        let d = line();
        let refined = refine(&d, vec![0, 3], &Alternating, 2);
        assert_eq!(refined.termination, Termination::Converged);
        assert_eq!(refined.n_iter, 2);
        assert!(refined.warnings.is_empty());
    }
}
