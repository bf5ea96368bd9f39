//! Fitted k-medoids model.

use tracing::instrument;

use medoids_distance::{DistanceMatrix, FeatureMatrix, Metric, SparseMatrix};

use crate::assign::assign_to_columns;
use crate::config::Method;
use crate::error::ClusterError;
use crate::inertia::Inertia;
use crate::label::ClusterLabel;
use crate::result::{FitWarning, Termination};

/// Frozen result of a k-medoids fit.
///
/// Medoids are training rows: `medoid_indices()[c]` is the row index of the
/// medoid for cluster `c`, and `labels()[i]` is the cluster of training
/// sample `i`. New samples are labeled against the stored medoids without
/// further refinement.
#[derive(Debug, Clone)]
pub struct KMedoidsModel {
    pub(crate) metric: Metric,
    pub(crate) method: Method,
    pub(crate) init: String,
    pub(crate) medoid_indices: Vec<usize>,
    pub(crate) labels: Vec<ClusterLabel>,
    pub(crate) inertia: Inertia,
    pub(crate) n_iter: usize,
    pub(crate) termination: Termination,
    pub(crate) inertia_history: Vec<Inertia>,
    pub(crate) cluster_centers: Option<FeatureMatrix>,
    pub(crate) warnings: Vec<FitWarning>,
    pub(crate) n_train: usize,
}

impl KMedoidsModel {
    /// Return the number of clusters.
    #[must_use]
    pub fn n_clusters(&self) -> usize {
        self.medoid_indices.len()
    }

    /// Return the metric the model was fitted with.
    #[must_use]
    pub fn metric(&self) -> &Metric {
        &self.metric
    }

    /// Return the medoid update rule used while fitting.
    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    /// Return the name of the initialization strategy used while fitting.
    #[must_use]
    pub fn init(&self) -> &str {
        &self.init
    }

    /// Training row index of each medoid, in cluster order.
    #[must_use]
    pub fn medoid_indices(&self) -> &[usize] {
        &self.medoid_indices
    }

    /// Cluster of each training sample.
    #[must_use]
    pub fn labels(&self) -> &[ClusterLabel] {
        &self.labels
    }

    /// Sum of distances from each training sample to its medoid.
    #[must_use]
    pub fn inertia(&self) -> Inertia {
        self.inertia
    }

    /// Number of refinement iterations performed.
    #[must_use]
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    /// How refinement stopped.
    #[must_use]
    pub fn termination(&self) -> Termination {
        self.termination
    }

    /// Return true if refinement converged before the iteration limit.
    #[must_use]
    pub fn converged(&self) -> bool {
        self.termination == Termination::Converged
    }

    /// Inertia of the initial medoid set and of every accepted update.
    #[must_use]
    pub fn inertia_history(&self) -> &[Inertia] {
        &self.inertia_history
    }

    /// Feature rows of the medoids, or `None` for a precomputed fit.
    #[must_use]
    pub fn cluster_centers(&self) -> Option<&FeatureMatrix> {
        self.cluster_centers.as_ref()
    }

    /// Non-fatal conditions observed while fitting.
    #[must_use]
    pub fn warnings(&self) -> &[FitWarning] {
        &self.warnings
    }

    /// Number of training samples.
    #[must_use]
    pub fn n_train(&self) -> usize {
        self.n_train
    }

    /// Return the number of training samples assigned to each cluster.
    #[must_use]
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.n_clusters()];
        for label in &self.labels {
            sizes[label.index()] += 1;
        }
        sizes
    }

    /// Return the indices of all training samples assigned to `label`.
    #[must_use]
    pub fn members(&self, label: ClusterLabel) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter_map(|(i, &l)| (l == label).then_some(i))
            .collect()
    }

    /// Distances from every row of `x` to every medoid, `n_new × k`.
    ///
    /// For a precomputed fit, `x` holds the distances from each new sample to
    /// every training sample (`n_new × n_train`) and the medoid columns are
    /// selected from it.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::Distance`] | Feature count differs from training, precomputed width differs from `n_train`, negative precomputed entries, or invalid custom metric output |
    #[instrument(skip(self, x), fields(n_new = x.n_samples(), k = self.n_clusters()))]
    pub fn transform(&self, x: &FeatureMatrix) -> Result<DistanceMatrix, ClusterError> {
        match &self.cluster_centers {
            Some(centers) => Ok(self.metric.cross(x, centers)?),
            None => Ok(DistanceMatrix::precomputed_cross(x, self.n_train)?
                .select_columns(&self.medoid_indices)),
        }
    }

    /// Label every row of `x` with its nearest medoid.
    ///
    /// # Errors
    ///
    /// Same conditions as [`KMedoidsModel::transform`].
    pub fn predict(&self, x: &FeatureMatrix) -> Result<Vec<ClusterLabel>, ClusterError> {
        Ok(assign_to_columns(&self.transform(x)?).labels)
    }

    /// Label every row of `x` and return its distance to the chosen medoid.
    ///
    /// # Errors
    ///
    /// Same conditions as [`KMedoidsModel::transform`].
    pub fn predict_with_distance(
        &self,
        x: &FeatureMatrix,
    ) -> Result<Vec<(ClusterLabel, f64)>, ClusterError> {
        let assignment = assign_to_columns(&self.transform(x)?);
        Ok(assignment.labels.into_iter().zip(assignment.nearest).collect())
    }

    /// Densify `x` and compute its distances to every medoid.
    ///
    /// # Errors
    ///
    /// Same conditions as [`KMedoidsModel::transform`].
    pub fn transform_sparse(&self, x: &SparseMatrix) -> Result<DistanceMatrix, ClusterError> {
        self.transform(&x.to_dense()?)
    }

    /// Densify `x` and label every row with its nearest medoid.
    ///
    /// # Errors
    ///
    /// Same conditions as [`KMedoidsModel::transform`].
    pub fn predict_sparse(&self, x: &SparseMatrix) -> Result<Vec<ClusterLabel>, ClusterError> {
        self.predict(&x.to_dense()?)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::KMedoidsConfig;

    use super::*;

    fn blobs() -> FeatureMatrix {
        FeatureMatrix::new(vec![
            vec![0.0, 0.0],
            vec![0.5, 0.0],
            vec![0.0, 0.5],
            vec![10.0, 10.0],
            vec![10.5, 10.0],
            vec![10.0, 10.5],
        ])
        .unwrap()
    }

    #[test]
    fn sizes_and_members() {
        let model = KMedoidsConfig::new(2).unwrap().fit(&blobs()).unwrap();
        assert_eq!(model.cluster_sizes(), vec![3, 3]);
        let first = model.labels()[0];
        assert_eq!(model.members(first), vec![0, 1, 2]);
    }

    #[test]
    fn predict_new_points() {
        let model = KMedoidsConfig::new(2).unwrap().fit(&blobs()).unwrap();
        let new = FeatureMatrix::new(vec![vec![1.0, 1.0], vec![9.0, 9.0]]).unwrap();
        let labels = model.predict(&new).unwrap();
        assert_eq!(labels[0], model.labels()[0]);
        assert_eq!(labels[1], model.labels()[3]);
    }

    #[test]
    fn predict_with_distance_reports_nearest() {
        let model = KMedoidsConfig::new(2).unwrap().fit(&blobs()).unwrap();
        let transformed = model.transform(&blobs()).unwrap();
        let pairs = model.predict_with_distance(&blobs()).unwrap();
        for (i, (label, dist)) in pairs.iter().enumerate() {
            assert_eq!(*dist, transformed.get(i, label.index()));
        }
    }

    #[test]
    fn transform_rejects_wrong_feature_count() {
        let model = KMedoidsConfig::new(2).unwrap().fit(&blobs()).unwrap();
        let new = FeatureMatrix::new(vec![vec![1.0, 1.0, 1.0]]).unwrap();
        assert!(matches!(model.transform(&new), Err(ClusterError::Distance(_))));
    }

    #[test]
    fn precomputed_transform_selects_medoid_columns() {
        let d = Metric::Euclidean.pairwise(&blobs()).unwrap();
        let as_input = FeatureMatrix::new(d.to_rows()).unwrap();
        let model = KMedoidsConfig::new(2)
            .unwrap()
            .with_metric(Metric::Precomputed)
            .fit(&as_input)
            .unwrap();
        assert!(model.cluster_centers().is_none());

        let transformed = model.transform(&as_input).unwrap();
        assert_eq!(transformed, d.select_columns(model.medoid_indices()));

        let too_narrow = FeatureMatrix::new(vec![vec![0.0; 5]]).unwrap();
        assert!(matches!(model.transform(&too_narrow), Err(ClusterError::Distance(_))));
    }
}
