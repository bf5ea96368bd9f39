//! Configuration builders for k-medoids, CLARA, and cluster-count sweeps.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use medoids_distance::{DistanceMatrix, FeatureMatrix, Metric, SparseMatrix};

use crate::error::ClusterError;
use crate::init::MedoidInitializer;
use crate::label::ClusterLabel;
use crate::model::KMedoidsModel;
use crate::result::OptimizeResult;

/// Medoid update rule applied on each refinement iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Method {
    /// Per-cluster update: each medoid moves to the member of its cluster
    /// with the smallest total in-cluster distance.
    #[default]
    Alternating,
    /// Partitioning Around Medoids: the single best medoid/non-medoid swap
    /// over the whole medoid set.
    Pam,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alternating => f.write_str("alternating"),
            Self::Pam => f.write_str("pam"),
        }
    }
}

impl FromStr for Method {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alternating" => Ok(Self::Alternating),
            "pam" => Ok(Self::Pam),
            other => Err(ClusterError::UnknownMethod { name: other.to_string() }),
        }
    }
}

/// Initial medoid selection strategy.
#[derive(Debug, Clone, Default)]
pub enum InitStrategy {
    /// `k` distinct samples drawn uniformly with the configured seed.
    Random,
    /// The `k` samples with the smallest total distance to all others.
    #[default]
    Heuristic,
    /// Greedy k-medoids++ seeding.
    KMedoidsPlusPlus,
    /// Explicit initial medoid row indices.
    Indices(Vec<usize>),
    /// Caller-supplied selection.
    Custom(Arc<dyn MedoidInitializer>),
}

impl fmt::Display for InitStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Random => "random",
            Self::Heuristic => "heuristic",
            Self::KMedoidsPlusPlus => "k-medoids++",
            Self::Indices(_) => "indices",
            Self::Custom(_) => "custom",
        };
        f.write_str(name)
    }
}

impl FromStr for InitStrategy {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(Self::Random),
            "heuristic" => Ok(Self::Heuristic),
            "k-medoids++" => Ok(Self::KMedoidsPlusPlus),
            other => Err(ClusterError::UnknownInit { name: other.to_string() }),
        }
    }
}

/// Configuration for k-medoids clustering.
///
/// Construct via [`KMedoidsConfig::new`] (or [`Default`] for 8 clusters),
/// then chain `with_*` methods to override defaults.
///
/// # Defaults
///
/// | Parameter    | Default                    |
/// |--------------|----------------------------|
/// | `n_clusters` | 8 (via `Default`)          |
/// | `metric`     | `Metric::Euclidean`        |
/// | `method`     | `Method::Alternating`      |
/// | `init`       | `InitStrategy::Heuristic`  |
/// | `max_iter`   | 300                        |
/// | `seed`       | 42                         |
#[derive(Debug, Clone)]
pub struct KMedoidsConfig {
    pub(crate) n_clusters: usize,
    pub(crate) metric: Metric,
    pub(crate) method: Method,
    pub(crate) init: InitStrategy,
    pub(crate) max_iter: usize,
    pub(crate) seed: u64,
}

impl Default for KMedoidsConfig {
    fn default() -> Self {
        Self {
            n_clusters: 8,
            metric: Metric::Euclidean,
            method: Method::Alternating,
            init: InitStrategy::Heuristic,
            max_iter: 300,
            seed: 42,
        }
    }
}

impl KMedoidsConfig {
    /// Create a configuration for `n_clusters` medoids.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::InvalidNClusters`] | `n_clusters` is zero |
    pub fn new(n_clusters: usize) -> Result<Self, ClusterError> {
        if n_clusters == 0 {
            return Err(ClusterError::InvalidNClusters { value: n_clusters });
        }
        Ok(Self { n_clusters, ..Self::default() })
    }

    /// Set the dissimilarity metric.
    #[must_use]
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Set the medoid update rule.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set the initial medoid selection strategy.
    #[must_use]
    pub fn with_init(mut self, init: InitStrategy) -> Self {
        self.init = init;
        self
    }

    /// Set the maximum number of refinement iterations. Zero is rejected at fit time.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the seed for random and k-medoids++ initialization.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the number of clusters.
    #[must_use]
    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    /// Return the dissimilarity metric.
    #[must_use]
    pub fn metric(&self) -> &Metric {
        &self.metric
    }

    /// Return the medoid update rule.
    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    /// Return the initial medoid selection strategy.
    #[must_use]
    pub fn init(&self) -> &InitStrategy {
        &self.init
    }

    /// Return the maximum number of refinement iterations.
    #[must_use]
    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Fit k-medoids to `x`.
    ///
    /// With [`Metric::Precomputed`], `x` is the square training distance matrix.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::InvalidNClusters`] | `n_clusters` is zero |
    /// | [`ClusterError::InvalidMaxIter`] | `max_iter` is zero |
    /// | [`ClusterError::TooManyClusters`] | `n_clusters > n_samples` |
    /// | [`ClusterError::InvalidInitialMedoids`] | Explicit or custom initial medoids are invalid |
    /// | [`ClusterError::Distance`] | Malformed precomputed matrix or invalid custom metric output |
    pub fn fit(&self, x: &FeatureMatrix) -> Result<KMedoidsModel, ClusterError> {
        crate::kmedoids::fit(self, x)
    }

    /// Densify `x` and fit k-medoids to it.
    ///
    /// # Errors
    ///
    /// Same conditions as [`KMedoidsConfig::fit`].
    pub fn fit_sparse(&self, x: &SparseMatrix) -> Result<KMedoidsModel, ClusterError> {
        self.fit(&x.to_dense()?)
    }

    /// Fit to `x` and return the training labels.
    ///
    /// # Errors
    ///
    /// Same conditions as [`KMedoidsConfig::fit`].
    pub fn fit_predict(&self, x: &FeatureMatrix) -> Result<Vec<ClusterLabel>, ClusterError> {
        let model = self.fit(x)?;
        model.predict(x)
    }

    /// Fit to `x` and return the distances from every training sample to every medoid.
    ///
    /// # Errors
    ///
    /// Same conditions as [`KMedoidsConfig::fit`].
    pub fn fit_transform(&self, x: &FeatureMatrix) -> Result<DistanceMatrix, ClusterError> {
        let model = self.fit(x)?;
        model.transform(x)
    }

    /// Densify `x`, fit to it, and return the training labels.
    ///
    /// # Errors
    ///
    /// Same conditions as [`KMedoidsConfig::fit`].
    pub fn fit_predict_sparse(&self, x: &SparseMatrix) -> Result<Vec<ClusterLabel>, ClusterError> {
        self.fit_predict(&x.to_dense()?)
    }

    /// Densify `x`, fit to it, and return the training-to-medoid distances.
    ///
    /// # Errors
    ///
    /// Same conditions as [`KMedoidsConfig::fit`].
    pub fn fit_transform_sparse(&self, x: &SparseMatrix) -> Result<DistanceMatrix, ClusterError> {
        self.fit_transform(&x.to_dense()?)
    }

    pub(crate) fn validate(&self, n_samples: usize) -> Result<(), ClusterError> {
        if self.n_clusters == 0 {
            return Err(ClusterError::InvalidNClusters { value: self.n_clusters });
        }
        if self.max_iter == 0 {
            return Err(ClusterError::InvalidMaxIter { value: self.max_iter });
        }
        if self.n_clusters > n_samples {
            return Err(ClusterError::TooManyClusters { k: self.n_clusters, n: n_samples });
        }
        Ok(())
    }
}

// ── ClaraConfig ───────────────────────────────────────────────────────────────

/// Configuration for CLARA (Clustering LARge Applications).
///
/// CLARA runs PAM on several random subsamples and keeps the medoid set with
/// the lowest inertia over the full dataset, so the pairwise matrix is only
/// ever built for `n_sampling` rows at a time.
///
/// # Defaults
///
/// | Parameter         | Default                    |
/// |-------------------|----------------------------|
/// | `metric`          | `Metric::Euclidean`        |
/// | `init`            | `InitStrategy::Heuristic`  |
/// | `max_iter`        | 300                        |
/// | `n_sampling`      | `min(n, 40 + 2 * n_clusters)` |
/// | `n_sampling_iter` | 5                          |
/// | `seed`            | 42                         |
#[derive(Debug, Clone)]
pub struct ClaraConfig {
    pub(crate) n_clusters: usize,
    pub(crate) metric: Metric,
    pub(crate) init: InitStrategy,
    pub(crate) max_iter: usize,
    pub(crate) n_sampling: Option<usize>,
    pub(crate) n_sampling_iter: usize,
    pub(crate) seed: u64,
}

impl ClaraConfig {
    /// Create a CLARA configuration for `n_clusters` medoids.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::InvalidNClusters`] | `n_clusters` is zero |
    pub fn new(n_clusters: usize) -> Result<Self, ClusterError> {
        if n_clusters == 0 {
            return Err(ClusterError::InvalidNClusters { value: n_clusters });
        }
        Ok(Self {
            n_clusters,
            metric: Metric::Euclidean,
            init: InitStrategy::Heuristic,
            max_iter: 300,
            n_sampling: None,
            n_sampling_iter: 5,
            seed: 42,
        })
    }

    /// Set the dissimilarity metric. [`Metric::Precomputed`] is rejected at fit time.
    #[must_use]
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Set the initial medoid strategy applied to each subsample.
    #[must_use]
    pub fn with_init(mut self, init: InitStrategy) -> Self {
        self.init = init;
        self
    }

    /// Set the maximum number of PAM iterations per subsample.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the subsample size.
    #[must_use]
    pub fn with_n_sampling(mut self, n_sampling: usize) -> Self {
        self.n_sampling = Some(n_sampling);
        self
    }

    /// Set the number of subsampling rounds.
    #[must_use]
    pub fn with_n_sampling_iter(mut self, n_sampling_iter: usize) -> Self {
        self.n_sampling_iter = n_sampling_iter;
        self
    }

    /// Set the seed from which per-round seeds are derived.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the number of clusters.
    #[must_use]
    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    /// Return the dissimilarity metric.
    #[must_use]
    pub fn metric(&self) -> &Metric {
        &self.metric
    }

    /// Return the initial medoid selection strategy.
    #[must_use]
    pub fn init(&self) -> &InitStrategy {
        &self.init
    }

    /// Return the maximum number of PAM iterations per subsample.
    #[must_use]
    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    /// Return the subsample size for a dataset of `n_samples` rows.
    #[must_use]
    pub fn n_sampling(&self, n_samples: usize) -> usize {
        self.n_sampling
            .unwrap_or_else(|| n_samples.min(40 + 2 * self.n_clusters))
    }

    /// Return the number of subsampling rounds.
    #[must_use]
    pub fn n_sampling_iter(&self) -> usize {
        self.n_sampling_iter
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Fit CLARA to `x`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::PrecomputedUnsupported`] | Metric is precomputed |
    /// | [`ClusterError::InvalidMaxIter`] | `max_iter` is zero |
    /// | [`ClusterError::InvalidSamplingIter`] | `n_sampling_iter` is zero |
    /// | [`ClusterError::TooManyClusters`] | `n_clusters > n_samples` |
    /// | [`ClusterError::SamplingTooSmall`] | `n_sampling < n_clusters` |
    /// | [`ClusterError::Distance`] | Invalid custom metric output |
    pub fn fit(&self, x: &FeatureMatrix) -> Result<KMedoidsModel, ClusterError> {
        crate::clara::fit(self, x)
    }
}

// ── OptimizeConfig ────────────────────────────────────────────────────────────

/// Configuration for cluster-count selection.
///
/// Fits k-medoids for each k in `[min_k, max_k]` on a single shared distance
/// matrix and reports the inertia curve. The elbow is picked by maximum
/// second derivative; see [`OptimizeResult::best_k`].
///
/// # Defaults
///
/// | Parameter    | Default                   |
/// |--------------|---------------------------|
/// | `metric`     | `Metric::Euclidean`       |
/// | `method`     | `Method::Alternating`     |
/// | `init`       | `InitStrategy::Heuristic` |
/// | `max_iter`   | 300                       |
/// | `seed`       | 42                        |
/// | `silhouette` | false                     |
#[derive(Debug, Clone)]
pub struct OptimizeConfig {
    pub(crate) min_k: usize,
    pub(crate) max_k: usize,
    pub(crate) metric: Metric,
    pub(crate) method: Method,
    pub(crate) init: InitStrategy,
    pub(crate) max_iter: usize,
    pub(crate) seed: u64,
    pub(crate) silhouette: bool,
}

impl OptimizeConfig {
    /// Create a sweep over the cluster range `[min_k, max_k]`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::InvalidNClusters`] | `min_k` is zero |
    /// | [`ClusterError::InvalidKRange`] | `min_k > max_k` |
    pub fn new(min_k: usize, max_k: usize) -> Result<Self, ClusterError> {
        if min_k == 0 {
            return Err(ClusterError::InvalidNClusters { value: min_k });
        }
        if min_k > max_k {
            return Err(ClusterError::InvalidKRange { min_k, max_k });
        }
        Ok(Self {
            min_k,
            max_k,
            metric: Metric::Euclidean,
            method: Method::Alternating,
            init: InitStrategy::Heuristic,
            max_iter: 300,
            seed: 42,
            silhouette: false,
        })
    }

    /// Set the dissimilarity metric.
    #[must_use]
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Set the medoid update rule.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set the initial medoid selection strategy. Explicit indices are only
    /// valid when they match every k in the range.
    #[must_use]
    pub fn with_init(mut self, init: InitStrategy) -> Self {
        self.init = init;
        self
    }

    /// Set the maximum number of refinement iterations per k.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the random seed, shared by every k.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Also compute the mean silhouette score for every k with at least two
    /// non-empty clusters.
    #[must_use]
    pub fn with_silhouette(mut self, silhouette: bool) -> Self {
        self.silhouette = silhouette;
        self
    }

    /// Return the minimum cluster count (inclusive).
    #[must_use]
    pub fn min_k(&self) -> usize {
        self.min_k
    }

    /// Return the maximum cluster count (inclusive).
    #[must_use]
    pub fn max_k(&self) -> usize {
        self.max_k
    }

    /// Return the dissimilarity metric.
    #[must_use]
    pub fn metric(&self) -> &Metric {
        &self.metric
    }

    /// Return the medoid update rule.
    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    /// Return the maximum number of refinement iterations per k.
    #[must_use]
    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Return whether silhouette scores are computed.
    #[must_use]
    pub fn silhouette(&self) -> bool {
        self.silhouette
    }

    /// Fit every k in the range and return the inertia curve.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::InvalidMaxIter`] | `max_iter` is zero |
    /// | [`ClusterError::TooManyClusters`] | `max_k > n_samples` |
    /// | [`ClusterError::Distance`] | Malformed precomputed matrix or invalid custom metric output |
    pub fn fit(&self, x: &FeatureMatrix) -> Result<OptimizeResult, ClusterError> {
        crate::kmedoids::optimize(self, x)
    }
}
