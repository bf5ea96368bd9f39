//! Dense feature matrix with validation guarantees.

use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::error::DistanceError;

/// Owned, validated, row-major dense matrix of `f64` values.
///
/// Guaranteed non-empty in both dimensions with all values finite. Rows are
/// samples, columns are features. In precomputed mode the same type carries
/// a distance matrix, one row per sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    n_rows: usize,
    n_cols: usize,
    data: Vec<f64>,
}

impl FeatureMatrix {
    /// Build a matrix from a vector of rows.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DistanceError::EmptyMatrix`] | No rows, or the first row is empty |
    /// | [`DistanceError::RaggedRows`] | A row differs in length from the first |
    /// | [`DistanceError::NonFiniteValue`] | Any value is NaN or infinite |
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self, DistanceError> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        if n_rows == 0 || n_cols == 0 {
            return Err(DistanceError::EmptyMatrix { rows: n_rows, cols: n_cols });
        }

        let mut data = Vec::with_capacity(n_rows * n_cols);
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != n_cols {
                return Err(DistanceError::RaggedRows {
                    row,
                    expected: n_cols,
                    got: values.len(),
                });
            }
            data.extend(values);
        }

        Self::from_flat(n_rows, n_cols, data)
    }

    /// Build a matrix from a flat row-major buffer.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DistanceError::EmptyMatrix`] | `n_rows` or `n_cols` is zero |
    /// | [`DistanceError::ShapeMismatch`] | `data.len() != n_rows * n_cols` |
    /// | [`DistanceError::NonFiniteValue`] | Any value is NaN or infinite |
    pub fn from_flat(n_rows: usize, n_cols: usize, data: Vec<f64>) -> Result<Self, DistanceError> {
        if n_rows == 0 || n_cols == 0 {
            return Err(DistanceError::EmptyMatrix { rows: n_rows, cols: n_cols });
        }
        if data.len() != n_rows * n_cols {
            return Err(DistanceError::ShapeMismatch {
                rows: n_rows,
                cols: n_cols,
                len: data.len(),
            });
        }
        if let Some(pos) = data.iter().position(|v| !v.is_finite()) {
            return Err(DistanceError::NonFiniteValue {
                row: pos / n_cols,
                col: pos % n_cols,
            });
        }
        Ok(Self { n_rows, n_cols, data })
    }

    /// Return the number of rows (samples).
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.n_rows
    }

    /// Return the number of columns (features).
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_cols
    }

    /// Return `(rows, cols)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }

    /// Borrow row `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= n_samples()`.
    #[must_use]
    pub fn row(&self, i: usize) -> &[f64] {
        assert!(i < self.n_rows, "row index {i} out of bounds for {} rows", self.n_rows);
        &self.data[i * self.n_cols..(i + 1) * self.n_cols]
    }

    /// Iterate over rows in order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[f64]> + '_ {
        self.data.chunks_exact(self.n_cols)
    }

    /// Return a new matrix containing the given rows, in the given order.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of bounds or `indices` is empty.
    #[must_use]
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        assert!(!indices.is_empty(), "cannot select zero rows");
        let mut data = Vec::with_capacity(indices.len() * self.n_cols);
        for &i in indices {
            data.extend_from_slice(self.row(i));
        }
        Self {
            n_rows: indices.len(),
            n_cols: self.n_cols,
            data,
        }
    }

    /// Return the rows as owned vectors.
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.rows().map(<[f64]>::to_vec).collect()
    }

    /// Borrow the flat row-major buffer.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Population standard deviation over every value in the matrix.
    #[must_use]
    pub fn std(&self) -> f64 {
        let n = self.data.len() as f64;
        let mean = self.data.iter().sum::<f64>() / n;
        let var = self.data.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        var.sqrt()
    }
}

impl Index<(usize, usize)> for FeatureMatrix {
    type Output = f64;

    fn index(&self, (i, j): (usize, usize)) -> &Self::Output {
        assert!(j < self.n_cols, "column index {j} out of bounds for {} columns", self.n_cols);
        &self.row(i)[j]
    }
}

impl TryFrom<Vec<Vec<f64>>> for FeatureMatrix {
    type Error = DistanceError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        Self::new(rows)
    }
}
