//! Distance metrics and pairwise distance computation.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::error::DistanceError;
use crate::features::FeatureMatrix;
use crate::matrix::DistanceMatrix;

const METRIC_NAMES: &str =
    "euclidean, l2, sqeuclidean, manhattan, cityblock, l1, cosine, chebyshev, precomputed";

type DistanceFn = dyn Fn(&[f64], &[f64]) -> f64 + Send + Sync;

/// A caller-supplied binary distance function.
///
/// The function receives two rows of equal length and must return a finite,
/// non-negative value. Symmetry is recommended but not required.
#[derive(Clone)]
pub struct CustomMetric {
    name: String,
    func: Arc<DistanceFn>,
}

impl CustomMetric {
    /// Wrap `func` under a display name used in logs and error messages.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[f64], &[f64]) -> f64 + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Return the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, a: &[f64], b: &[f64]) -> f64 {
        (self.func)(a, b)
    }
}

impl fmt::Debug for CustomMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomMetric").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Dissimilarity used to build the distance matrix.
#[derive(Debug, Clone, Default)]
pub enum Metric {
    /// `sqrt(sum((a - b)^2))`.
    #[default]
    Euclidean,
    /// `sum((a - b)^2)`.
    SquaredEuclidean,
    /// `sum(|a - b|)`.
    Manhattan,
    /// `1 - cos(a, b)`, clipped to `[0, 2]`. Zero vectors have similarity 0.
    Cosine,
    /// `max(|a - b|)`.
    Chebyshev,
    /// Input already is the square distance matrix.
    Precomputed,
    /// Caller-supplied function.
    Custom(CustomMetric),
}

impl Metric {
    /// Return true for [`Metric::Precomputed`].
    #[must_use]
    pub fn is_precomputed(&self) -> bool {
        matches!(self, Self::Precomputed)
    }

    /// Return true for [`Metric::Custom`].
    #[must_use]
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }

    /// Distance between two rows.
    ///
    /// Returns `None` for [`Metric::Precomputed`], which has no row-level
    /// definition.
    #[must_use]
    pub fn distance(&self, a: &[f64], b: &[f64]) -> Option<f64> {
        debug_assert_eq!(a.len(), b.len());
        let value = match self {
            Self::Euclidean => squared_euclidean(a, b).sqrt(),
            Self::SquaredEuclidean => squared_euclidean(a, b),
            Self::Manhattan => a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum(),
            Self::Cosine => cosine(a, b),
            Self::Chebyshev => a.iter().zip(b).map(|(x, y)| (x - y).abs()).fold(0.0, f64::max),
            Self::Custom(custom) => custom.call(a, b),
            Self::Precomputed => return None,
        };
        Some(value)
    }

    /// Compute the square training distance matrix.
    ///
    /// For [`Metric::Precomputed`], `x` itself is validated and returned as the
    /// matrix. Otherwise every ordered pair is evaluated (rows in parallel)
    /// and the diagonal is fixed at zero.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DistanceError::NotSquare`], [`DistanceError::Asymmetric`], [`DistanceError::NonZeroDiagonal`], [`DistanceError::NegativeDistance`] | Precomputed input is malformed |
    /// | [`DistanceError::InvalidMetricOutput`] | A custom metric returned NaN, infinity, or a negative value |
    #[instrument(skip(self, x), fields(metric = %self, n = x.n_samples()))]
    pub fn pairwise(&self, x: &FeatureMatrix) -> Result<DistanceMatrix, DistanceError> {
        if self.is_precomputed() {
            return DistanceMatrix::precomputed(x);
        }

        let n = x.n_samples();
        let rows: Vec<Vec<f64>> = (0..n)
            .into_par_iter()
            .map(|i| {
                let a = x.row(i);
                (0..n)
                    .map(|j| {
                        if i == j {
                            Ok(0.0)
                        } else {
                            self.checked(a, x.row(j), i, j)
                        }
                    })
                    .collect::<Result<Vec<f64>, DistanceError>>()
            })
            .collect::<Result<_, _>>()?;

        debug!(n, "pairwise distance matrix computed");
        Ok(DistanceMatrix::from_raw(n, n, rows.concat()))
    }

    /// Compute the `n_new × n_ref` matrix of distances from each row of
    /// `x_new` to each row of `reference`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DistanceError::PrecomputedCross`] | Metric is precomputed |
    /// | [`DistanceError::DimensionMismatch`] | Feature counts differ |
    /// | [`DistanceError::InvalidMetricOutput`] | A custom metric returned an invalid value |
    #[instrument(skip(self, x_new, reference), fields(metric = %self, n_new = x_new.n_samples(), n_ref = reference.n_samples()))]
    pub fn cross(
        &self,
        x_new: &FeatureMatrix,
        reference: &FeatureMatrix,
    ) -> Result<DistanceMatrix, DistanceError> {
        if self.is_precomputed() {
            return Err(DistanceError::PrecomputedCross);
        }
        if x_new.n_features() != reference.n_features() {
            return Err(DistanceError::DimensionMismatch {
                expected: reference.n_features(),
                got: x_new.n_features(),
            });
        }

        let n_ref = reference.n_samples();
        let rows: Vec<Vec<f64>> = (0..x_new.n_samples())
            .into_par_iter()
            .map(|i| {
                let a = x_new.row(i);
                (0..n_ref)
                    .map(|j| self.checked(a, reference.row(j), i, j))
                    .collect::<Result<Vec<f64>, DistanceError>>()
            })
            .collect::<Result<_, _>>()?;

        Ok(DistanceMatrix::from_raw(x_new.n_samples(), n_ref, rows.concat()))
    }

    fn checked(&self, a: &[f64], b: &[f64], row: usize, col: usize) -> Result<f64, DistanceError> {
        let value = self.distance(a, b).ok_or(DistanceError::PrecomputedCross)?;
        if !value.is_finite() || value < 0.0 {
            return Err(DistanceError::InvalidMetricOutput {
                metric: self.to_string(),
                row,
                col,
                value,
            });
        }
        Ok(value)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Euclidean => "euclidean",
            Self::SquaredEuclidean => "sqeuclidean",
            Self::Manhattan => "manhattan",
            Self::Cosine => "cosine",
            Self::Chebyshev => "chebyshev",
            Self::Precomputed => "precomputed",
            Self::Custom(custom) => custom.name(),
        };
        f.write_str(name)
    }
}

impl FromStr for Metric {
    type Err = DistanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "euclidean" | "l2" => Ok(Self::Euclidean),
            "sqeuclidean" => Ok(Self::SquaredEuclidean),
            "manhattan" | "cityblock" | "l1" => Ok(Self::Manhattan),
            "cosine" => Ok(Self::Cosine),
            "chebyshev" => Ok(Self::Chebyshev),
            "precomputed" => Ok(Self::Precomputed),
            other => Err(DistanceError::UnknownMetric {
                name: other.to_string(),
                expected: METRIC_NAMES,
            }),
        }
    }
}

impl PartialEq for Metric {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Custom(a), Self::Custom(b)) => Arc::ptr_eq(&a.func, &b.func),
            (a, b) => std::mem::discriminant(a) == std::mem::discriminant(b),
        }
    }
}

fn squared_euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let norm_a = a.iter().map(|v| v * v).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    (1.0 - dot / (norm_a * norm_b)).clamp(0.0, 2.0)
}
