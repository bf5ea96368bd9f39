//! Feature matrices, distance metrics, and dense distance matrices.
//!
//! Pure math library with no I/O. Validates dense and sparse sample input,
//! resolves metric names, and builds the pairwise and cross-distance
//! matrices that medoid clustering runs on.

mod error;
mod features;
mod matrix;
mod metric;
mod sparse;

pub use error::DistanceError;
pub use features::FeatureMatrix;
pub use matrix::{DistanceMatrix, SYMMETRY_TOL};
pub use metric::{CustomMetric, Metric};
pub use sparse::SparseMatrix;
