//! Nearest-medoid assignment.

use rayon::prelude::*;
use tracing::{debug, instrument};

use medoids_distance::DistanceMatrix;

use crate::inertia::Inertia;
use crate::label::ClusterLabel;

/// Labels, per-sample nearest distances, and total inertia for one medoid set.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Position in the medoid set of each sample's nearest medoid.
    pub labels: Vec<ClusterLabel>,
    /// Distance from each sample to its nearest medoid.
    pub nearest: Vec<f64>,
    /// Sum of `nearest`, accumulated in sample order.
    pub inertia: Inertia,
}

impl Assignment {
    /// Return the sample indices assigned to each of `k` clusters.
    #[must_use]
    pub fn members(&self, k: usize) -> Vec<Vec<usize>> {
        let mut members = vec![Vec::new(); k];
        for (i, label) in self.labels.iter().enumerate() {
            members[label.index()].push(i);
        }
        members
    }
}

/// Assign every row of `distances` to the nearest of the given medoid columns.
///
/// Ties go to the medoid appearing first in `medoids`. Rows are scanned in
/// parallel; inertia is summed sequentially so the result does not depend on
/// thread scheduling.
#[instrument(skip(distances, medoids), fields(n = distances.n_rows(), k = medoids.len()))]
pub fn assign(distances: &DistanceMatrix, medoids: &[usize]) -> Assignment {
    let (labels, nearest): (Vec<ClusterLabel>, Vec<f64>) = (0..distances.n_rows())
        .into_par_iter()
        .map(|i| {
            let (position, dist) = nearest_medoid(distances.row(i), medoids);
            (ClusterLabel::new(position), dist)
        })
        .unzip();

    let inertia = Inertia::new(nearest.iter().sum());
    debug!(inertia = inertia.value(), "assignment complete");

    Assignment { labels, nearest, inertia }
}

/// Assign every row of a cross-distance matrix whose columns already are the
/// medoids, in medoid order.
#[must_use]
pub fn assign_to_columns(cross: &DistanceMatrix) -> Assignment {
    let columns: Vec<usize> = (0..cross.n_cols()).collect();
    assign(cross, &columns)
}

/// Return `(position, distance)` of the closest medoid; first wins on ties.
pub(crate) fn nearest_medoid(row: &[f64], medoids: &[usize]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (position, &m) in medoids.iter().enumerate() {
        if row[m] < best.1 {
            best = (position, row[m]);
        }
    }
    best
}
