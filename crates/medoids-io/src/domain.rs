//! Sample identifiers, experiment names, and the loaded feature dataset.

use std::fmt;
use std::str::FromStr;

use medoids_distance::FeatureMatrix;
use serde::Serialize;

use crate::IoError;

/// Label of one input row, taken from the first CSV column.
///
/// Serializes as a bare string and orders lexicographically, so it can key
/// the assignment map of a cluster artifact directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SampleId(String);

impl SampleId {
    pub(crate) fn new(id: String) -> Self {
        debug_assert!(!id.is_empty());
        Self(id)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SampleId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Prefix shared by every artifact of one run.
///
/// Restricted to `[a-zA-Z0-9_-]+` so it is always a single path component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Validate `name` as an artifact prefix.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidExperimentName`] if the name is empty or
    /// contains anything outside `[a-zA-Z0-9_-]`.
    pub fn new(name: impl Into<String>) -> Result<Self, IoError> {
        let name = name.into();
        let valid = !name.is_empty()
            && name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'));
        if !valid {
            return Err(IoError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the `kind` artifact, e.g. `run1_cluster.json`.
    #[must_use]
    pub fn file_name(&self, kind: &str, extension: &str) -> String {
        format!("{}_{kind}.{extension}", self.0)
    }
}

impl FromStr for ExperimentName {
    type Err = IoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Feature rows read from one CSV, with their sample IDs and column names.
///
/// `sample_ids()[i]` labels row `i` of `features()`.
#[derive(Debug)]
pub struct FeatureDataset {
    sample_ids: Vec<SampleId>,
    feature_names: Vec<String>,
    features: FeatureMatrix,
}

impl FeatureDataset {
    pub(crate) fn new(
        sample_ids: Vec<SampleId>,
        feature_names: Vec<String>,
        features: FeatureMatrix,
    ) -> Self {
        debug_assert_eq!(sample_ids.len(), features.n_samples());
        Self { sample_ids, feature_names, features }
    }

    #[must_use]
    pub fn sample_ids(&self) -> &[SampleId] {
        &self.sample_ids
    }

    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    #[must_use]
    pub fn features(&self) -> &FeatureMatrix {
        &self.features
    }

    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Sample IDs of the given rows, in the order given.
    ///
    /// Used to name medoids, which are stored as row indices.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::SampleCountMismatch`] if a row is out of range.
    pub fn ids_of(&self, rows: &[usize]) -> Result<Vec<&SampleId>, IoError> {
        rows.iter()
            .map(|&row| {
                self.sample_ids.get(row).ok_or(IoError::SampleCountMismatch {
                    expected: row + 1,
                    got: self.sample_ids.len(),
                })
            })
            .collect()
    }
}
