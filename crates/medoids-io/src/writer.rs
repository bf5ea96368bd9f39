//! JSON result writer for clustering, sweep, and prediction outputs.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use medoids_cluster::{ClusterLabel, KMedoidsModel, OptimizeResult};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::{ExperimentName, SampleId};

/// Writes clustering, sweep, and prediction results to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_cluster.json`,
/// `{experiment}_optimize.json`, and `{experiment}_predict.json`.
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self { output_dir: output_dir.to_path_buf(), experiment })
    }

    /// Write a fitted model's training result to `{experiment}_cluster.json`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::SampleCountMismatch`] | `sample_ids` and the model's labels differ in length |
    /// | [`IoError::SerializeJson`] | JSON encoding failed |
    /// | [`IoError::WriteFile`] | The file cannot be written |
    #[instrument(skip_all, fields(k = model.n_clusters()))]
    pub fn write_cluster(
        &self,
        sample_ids: &[SampleId],
        model: &KMedoidsModel,
    ) -> Result<PathBuf, IoError> {
        check_count(sample_ids.len(), model.labels().len())?;
        let path = self.artifact_path("cluster");

        let assignments: BTreeMap<&str, usize> = sample_ids
            .iter()
            .zip(model.labels())
            .map(|(id, label)| (id.as_str(), label.index()))
            .collect();

        let medoid_ids: Vec<&str> = model
            .medoid_indices()
            .iter()
            .map(|&m| sample_ids[m].as_str())
            .collect();

        let artifact = ClusterArtifact {
            experiment: self.experiment.as_str(),
            k: model.n_clusters(),
            metric: model.metric().to_string(),
            method: model.method().to_string(),
            init: model.init(),
            inertia: model.inertia().value(),
            converged: model.converged(),
            termination: model.termination().to_string(),
            iterations: model.n_iter(),
            inertia_history: model.inertia_history().iter().map(|i| i.value()).collect(),
            medoid_ids,
            medoid_indices: model.medoid_indices(),
            assignments,
            cluster_centers: model.cluster_centers().map(|c| c.to_rows()),
            cluster_sizes: model.cluster_sizes(),
            warnings: model.warnings().iter().map(ToString::to_string).collect(),
        };

        write_json(&path, &artifact)?;
        info!(path = %path.display(), "cluster result written");
        Ok(path)
    }

    /// Write a k sweep to `{experiment}_optimize.json`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::SerializeJson`] | JSON encoding failed |
    /// | [`IoError::WriteFile`] | The file cannot be written |
    #[instrument(skip_all, fields(n_k = result.results.len()))]
    pub fn write_optimize(
        &self,
        n_samples: usize,
        result: &OptimizeResult,
    ) -> Result<PathBuf, IoError> {
        let path = self.artifact_path("optimize");

        let results: Vec<KResultEntry> = result
            .results
            .iter()
            .map(|r| KResultEntry {
                k: r.k,
                inertia: r.inertia.value(),
                n_iter: r.n_iter,
                converged: r.converged,
                silhouette: r.silhouette,
            })
            .collect();

        let artifact = OptimizeArtifact {
            experiment: self.experiment.as_str(),
            n_samples,
            best_k: result.best_k(),
            best_k_by_silhouette: result.best_k_by_silhouette(),
            results,
        };

        write_json(&path, &artifact)?;
        info!(path = %path.display(), "optimize result written");
        Ok(path)
    }

    /// Write per-sample predictions to `{experiment}_predict.json`.
    ///
    /// Each prediction is the nearest cluster and the distance to its medoid.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::SampleCountMismatch`] | `sample_ids` and `predictions` differ in length |
    /// | [`IoError::SerializeJson`] | JSON encoding failed |
    /// | [`IoError::WriteFile`] | The file cannot be written |
    #[instrument(skip_all, fields(n = predictions.len()))]
    pub fn write_predictions(
        &self,
        sample_ids: &[SampleId],
        predictions: &[(ClusterLabel, f64)],
    ) -> Result<PathBuf, IoError> {
        check_count(sample_ids.len(), predictions.len())?;
        let path = self.artifact_path("predict");

        let entries: Vec<PredictionEntry> = sample_ids
            .iter()
            .zip(predictions)
            .map(|(id, &(label, distance))| PredictionEntry {
                sample_id: id.as_str(),
                cluster: label.index(),
                distance,
            })
            .collect();

        let artifact = PredictArtifact {
            experiment: self.experiment.as_str(),
            n_samples: entries.len(),
            predictions: entries,
        };

        write_json(&path, &artifact)?;
        info!(path = %path.display(), "predictions written");
        Ok(path)
    }

    /// Return the path where the model binary should be saved.
    ///
    /// Does not write anything; just computes `{output_dir}/{experiment}_model.bin`.
    #[must_use]
    pub fn model_path(&self) -> PathBuf {
        self.output_dir.join(self.experiment.file_name("model", "bin"))
    }

    fn artifact_path(&self, kind: &str) -> PathBuf {
        self.output_dir.join(self.experiment.file_name(kind, "json"))
    }
}

fn check_count(expected: usize, got: usize) -> Result<(), IoError> {
    if expected != got {
        return Err(IoError::SampleCountMismatch { expected, got });
    }
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, artifact: &T) -> Result<(), IoError> {
    let json = serde_json::to_string_pretty(artifact).map_err(|e| IoError::SerializeJson {
        path: path.to_path_buf(),
        source: e,
    })?;
    fs::write(path, &json).map_err(|e| IoError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct ClusterArtifact<'a> {
    experiment: &'a str,
    k: usize,
    metric: String,
    method: String,
    init: &'a str,
    inertia: f64,
    converged: bool,
    termination: String,
    iterations: usize,
    inertia_history: Vec<f64>,
    medoid_ids: Vec<&'a str>,
    medoid_indices: &'a [usize],
    assignments: BTreeMap<&'a str, usize>,
    cluster_centers: Option<Vec<Vec<f64>>>,
    cluster_sizes: Vec<usize>,
    warnings: Vec<String>,
}

#[derive(Serialize)]
struct OptimizeArtifact<'a> {
    experiment: &'a str,
    n_samples: usize,
    best_k: Option<usize>,
    best_k_by_silhouette: Option<usize>,
    results: Vec<KResultEntry>,
}

#[derive(Serialize)]
struct KResultEntry {
    k: usize,
    inertia: f64,
    n_iter: usize,
    converged: bool,
    silhouette: Option<f64>,
}

#[derive(Serialize)]
struct PredictArtifact<'a> {
    experiment: &'a str,
    n_samples: usize,
    predictions: Vec<PredictionEntry<'a>>,
}

#[derive(Serialize)]
struct PredictionEntry<'a> {
    sample_id: &'a str,
    cluster: usize,
    distance: f64,
}
