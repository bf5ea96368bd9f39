use std::path::PathBuf;

use medoids_distance::DistanceError;

/// Errors from k-medoids configuration, fitting, prediction, and model I/O.
#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    /// Returned when the requested number of clusters is zero.
    #[error("n_clusters should be a nonnegative integer. {value} was given")]
    InvalidNClusters {
        /// The invalid value provided.
        value: usize,
    },

    /// Returned when the iteration limit is zero.
    #[error("max_iter should be a nonnegative integer. {value} was given")]
    InvalidMaxIter {
        /// The invalid value provided.
        value: usize,
    },

    /// Returned when an initialization strategy name is not recognized.
    #[error("init needs to be one of the following: 'random', 'heuristic', 'k-medoids++'")]
    UnknownInit {
        /// The unrecognized name.
        name: String,
    },

    /// Returned when a refinement method name is not recognized.
    #[error("method needs to be one of the following: 'alternating', 'pam'")]
    UnknownMethod {
        /// The unrecognized name.
        name: String,
    },

    /// Returned when more medoids are requested than there are samples.
    #[error("The number of medoids ({k}) must be less than the number of samples {n}.")]
    TooManyClusters {
        /// Requested number of medoids.
        k: usize,
        /// Number of samples provided.
        n: usize,
    },

    /// Returned when min_k exceeds max_k in a cluster-count sweep.
    #[error("min_k ({min_k}) must not exceed max_k ({max_k})")]
    InvalidKRange {
        /// The minimum k value.
        min_k: usize,
        /// The maximum k value.
        max_k: usize,
    },

    /// Returned when caller-supplied initial medoids are unusable.
    #[error("invalid initial medoids: {reason}")]
    InvalidInitialMedoids {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when silhouette scoring sees fewer than two non-empty clusters.
    #[error("silhouette requires at least 2 non-empty clusters, got {n_clusters}")]
    SingleCluster {
        /// Number of non-empty clusters.
        n_clusters: usize,
    },

    /// Returned when the label count does not match the number of samples.
    #[error("got {labels} labels for {samples} samples")]
    LabelMismatch {
        /// Number of labels provided.
        labels: usize,
        /// Number of samples in the distance matrix.
        samples: usize,
    },

    /// Returned when the CLARA subsample is smaller than the number of clusters.
    #[error("n_sampling ({n_sampling}) must be at least n_clusters ({k})")]
    SamplingTooSmall {
        /// Requested subsample size.
        n_sampling: usize,
        /// Requested number of clusters.
        k: usize,
    },

    /// Returned when CLARA is asked to run zero sampling rounds.
    #[error("n_sampling_iter should be a positive integer. {value} was given")]
    InvalidSamplingIter {
        /// The invalid value provided.
        value: usize,
    },

    /// Returned when CLARA is configured with the precomputed metric.
    #[error("CLARA draws subsamples from feature rows and does not support the precomputed metric")]
    PrecomputedUnsupported,

    /// Returned when saving a model fitted with a caller-supplied metric.
    #[error("model fitted with custom metric \"{metric}\" cannot be serialized")]
    UnserializableMetric {
        /// Display name of the custom metric.
        metric: String,
    },

    /// Returned when model serialization fails.
    #[error("failed to serialize model")]
    SerializeModel {
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when model deserialization fails.
    #[error("failed to deserialize model from {path}")]
    DeserializeModel {
        /// Path to the model file that could not be deserialized.
        path: PathBuf,
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when writing the model file fails.
    #[error("failed to write model to {path}")]
    WriteModel {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when reading the model file fails.
    #[error("failed to read model from {path}")]
    ReadModel {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when loading a model with an incompatible format version.
    #[error("incompatible model version in {path}: expected {expected}, found {found}")]
    IncompatibleModelVersion {
        /// The model format version this build expects.
        expected: u32,
        /// The model format version found in the file.
        found: u32,
        /// Path to the model file.
        path: PathBuf,
    },

    /// Wraps a feature validation or distance computation error.
    #[error(transparent)]
    Distance(#[from] DistanceError),
}
