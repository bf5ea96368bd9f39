//! Silhouette score for evaluating clustering quality.
//!
//! The silhouette score measures how similar a sample is to its own cluster
//! compared to other clusters. Values range from -1 (poor) to +1 (perfect).

use rayon::prelude::*;

use medoids_distance::DistanceMatrix;

use crate::error::ClusterError;
use crate::label::ClusterLabel;

/// Silhouette score for a single sample.
#[derive(Debug, Clone)]
pub struct SampleSilhouette {
    /// Mean intra-cluster distance (a(i)).
    pub a: f64,
    /// Mean nearest-cluster distance (b(i)).
    pub b: f64,
    /// Silhouette coefficient: (b - a) / max(a, b). In [-1, 1].
    pub score: f64,
    /// Cluster assignment of this sample.
    pub cluster: ClusterLabel,
}

/// Result of silhouette score computation.
#[derive(Debug, Clone)]
pub struct SilhouetteScore {
    /// Per-sample silhouette scores.
    pub per_sample: Vec<SampleSilhouette>,
    /// Mean silhouette score across all samples.
    pub mean_score: f64,
    /// Mean silhouette score per cluster.
    pub per_cluster: Vec<f64>,
}

/// Compute silhouette scores from a square training distance matrix.
///
/// For each sample `i`:
/// - `a(i)` = mean distance from `i` to all other members of its cluster
/// - `b(i)` = min over all other clusters c of (mean distance from `i` to members of c)
/// - `s(i)` = `(b(i) - a(i)) / max(a(i), b(i))`
///
/// Samples in singleton clusters score 0. Per-sample computation is
/// parallelized with rayon.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`ClusterError::LabelMismatch`] | `labels.len()` differs from the matrix size |
/// | [`ClusterError::SingleCluster`] | Fewer than 2 distinct clusters |
///
/// # Panics
///
/// Panics if any label index is `>= k`.
#[must_use = "compute_silhouette returns a Result that should be used"]
pub fn compute_silhouette(
    distances: &DistanceMatrix,
    labels: &[ClusterLabel],
    k: usize,
) -> Result<SilhouetteScore, ClusterError> {
    let n = distances.n_rows();
    if labels.len() != n {
        return Err(ClusterError::LabelMismatch { labels: labels.len(), samples: n });
    }

    let mut members: Vec<Vec<usize>> = vec![Vec::new(); k];
    for (i, label) in labels.iter().enumerate() {
        members[label.index()].push(i);
    }
    let n_nonempty = members.iter().filter(|m| !m.is_empty()).count();
    if n_nonempty < 2 {
        return Err(ClusterError::SingleCluster { n_clusters: n_nonempty });
    }

    let sum_to = |i: usize, cluster: &[usize]| -> f64 {
        let row = distances.row(i);
        cluster.iter().map(|&j| row[j]).sum::<f64>()
    };

    let per_sample: Vec<SampleSilhouette> = (0..n)
        .into_par_iter()
        .map(|i| {
            let own = labels[i].index();
            let own_members = &members[own];

            if own_members.len() <= 1 {
                return SampleSilhouette { a: 0.0, b: 0.0, score: 0.0, cluster: labels[i] };
            }

            // Self-distance is zero, so summing over all members is safe.
            let a = sum_to(i, own_members) / (own_members.len() - 1) as f64;

            let b = (0..k)
                .filter(|&c| c != own && !members[c].is_empty())
                .map(|c| sum_to(i, &members[c]) / members[c].len() as f64)
                .fold(f64::INFINITY, f64::min);

            let score = if a.max(b) == 0.0 { 0.0 } else { (b - a) / a.max(b) };

            SampleSilhouette { a, b, score, cluster: labels[i] }
        })
        .collect();

    let mean_score = per_sample.iter().map(|s| s.score).sum::<f64>() / n as f64;

    let per_cluster: Vec<f64> = members
        .iter()
        .map(|cluster| {
            if cluster.is_empty() {
                0.0
            } else {
                cluster.iter().map(|&i| per_sample[i].score).sum::<f64>() / cluster.len() as f64
            }
        })
        .collect();

    Ok(SilhouetteScore { per_sample, mean_score, per_cluster })
}
