//! Model serialization and deserialization via bincode.

use std::path::Path;

use tracing::{debug, info, instrument};

use medoids_distance::{FeatureMatrix, Metric};

use crate::config::Method;
use crate::error::ClusterError;
use crate::inertia::Inertia;
use crate::label::ClusterLabel;
use crate::model::KMedoidsModel;
use crate::result::{FitWarning, Termination};

/// Current binary format version.
const FORMAT_VERSION: u32 = 1;

/// Versioned envelope for the serialized model.
#[derive(serde::Serialize, serde::Deserialize)]
struct ModelEnvelope {
    /// Format version for compatibility checking.
    format_version: u32,
    /// Metric name, parsed back with `Metric::from_str`.
    metric: String,
    method: Method,
    init: String,
    medoid_indices: Vec<usize>,
    labels: Vec<ClusterLabel>,
    inertia: Inertia,
    n_iter: usize,
    termination: Termination,
    inertia_history: Vec<Inertia>,
    cluster_centers: Option<FeatureMatrix>,
    warnings: Vec<FitWarning>,
    n_train: usize,
}

impl KMedoidsModel {
    /// Save the model to a binary file.
    ///
    /// Uses bincode encoding wrapped in a versioned envelope.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::UnserializableMetric`] | The model uses a custom metric |
    /// | [`ClusterError::SerializeModel`] | bincode encoding failed |
    /// | [`ClusterError::WriteModel`] | file write failed |
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ClusterError> {
        let path = path.as_ref();

        if self.metric.is_custom() {
            return Err(ClusterError::UnserializableMetric { metric: self.metric.to_string() });
        }

        let envelope = ModelEnvelope {
            format_version: FORMAT_VERSION,
            metric: self.metric.to_string(),
            method: self.method,
            init: self.init.clone(),
            medoid_indices: self.medoid_indices.clone(),
            labels: self.labels.clone(),
            inertia: self.inertia,
            n_iter: self.n_iter,
            termination: self.termination,
            inertia_history: self.inertia_history.clone(),
            cluster_centers: self.cluster_centers.clone(),
            warnings: self.warnings.clone(),
            n_train: self.n_train,
        };

        let bytes = bincode::serialize(&envelope)
            .map_err(|e| ClusterError::SerializeModel { source: e })?;

        std::fs::write(path, &bytes).map_err(|e| ClusterError::WriteModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        info!(size_bytes = bytes.len(), k = self.n_clusters(), "model saved");

        Ok(())
    }

    /// Load a model from a binary file.
    ///
    /// Checks the format version and returns an error on mismatch.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::ReadModel`] | file read failed |
    /// | [`ClusterError::DeserializeModel`] | bincode decoding failed |
    /// | [`ClusterError::IncompatibleModelVersion`] | format version mismatch |
    /// | [`ClusterError::Distance`] | stored metric name is not recognized |
    #[instrument(fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClusterError> {
        let path = path.as_ref();

        let bytes = std::fs::read(path).map_err(|e| ClusterError::ReadModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        let envelope: ModelEnvelope =
            bincode::deserialize(&bytes).map_err(|e| ClusterError::DeserializeModel {
                path: path.to_path_buf(),
                source: e,
            })?;

        if envelope.format_version != FORMAT_VERSION {
            return Err(ClusterError::IncompatibleModelVersion {
                expected: FORMAT_VERSION,
                found: envelope.format_version,
                path: path.to_path_buf(),
            });
        }

        let metric: Metric = envelope.metric.parse()?;

        debug!(
            k = envelope.medoid_indices.len(),
            n_train = envelope.n_train,
            %metric,
            "model loaded"
        );

        Ok(Self {
            metric,
            method: envelope.method,
            init: envelope.init,
            medoid_indices: envelope.medoid_indices,
            labels: envelope.labels,
            inertia: envelope.inertia,
            n_iter: envelope.n_iter,
            termination: envelope.termination,
            inertia_history: envelope.inertia_history,
            cluster_centers: envelope.cluster_centers,
            warnings: envelope.warnings,
            n_train: envelope.n_train,
        })
    }
}
