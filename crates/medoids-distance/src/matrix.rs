//! Dense distance matrix.

use std::ops::Index;

use crate::error::DistanceError;
use crate::features::FeatureMatrix;

/// Absolute tolerance used when validating symmetry and the zero diagonal
/// of a precomputed matrix.
pub const SYMMETRY_TOL: f64 = 1e-10;

/// Dense, row-major matrix of non-negative distances.
///
/// A training matrix is square (`n × n`) with entry `(i, j)` holding the
/// distance from sample `i` to sample `j`. Cross-distance matrices used at
/// prediction time are `n_new × k` or `n_new × n_train`.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    n_rows: usize,
    n_cols: usize,
    data: Vec<f64>,
}

impl DistanceMatrix {
    /// Wrap a row-major buffer that is already known to be valid.
    pub(crate) fn from_raw(n_rows: usize, n_cols: usize, data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len(), n_rows * n_cols);
        Self { n_rows, n_cols, data }
    }

    /// Validate a caller-supplied square distance matrix.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DistanceError::NotSquare`] | Row count differs from column count |
    /// | [`DistanceError::NegativeDistance`] | Any entry is negative |
    /// | [`DistanceError::NonZeroDiagonal`] | `|d[i][i]| > SYMMETRY_TOL` |
    /// | [`DistanceError::Asymmetric`] | `|d[i][j] - d[j][i]| > SYMMETRY_TOL` |
    pub fn precomputed(x: &FeatureMatrix) -> Result<Self, DistanceError> {
        let (rows, cols) = x.shape();
        if rows != cols {
            return Err(DistanceError::NotSquare { rows, cols });
        }
        check_non_negative(x)?;

        for i in 0..rows {
            let diag = x[(i, i)];
            if diag.abs() > SYMMETRY_TOL {
                return Err(DistanceError::NonZeroDiagonal { index: i, value: diag });
            }
            for j in (i + 1)..cols {
                let (upper, lower) = (x[(i, j)], x[(j, i)]);
                if (upper - lower).abs() > SYMMETRY_TOL {
                    return Err(DistanceError::Asymmetric { i, j, upper, lower });
                }
            }
        }

        Ok(Self::from_raw(rows, cols, x.as_slice().to_vec()))
    }

    /// Validate a caller-supplied `n_new × n_train` matrix of distances from
    /// new samples to every training sample.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DistanceError::DimensionMismatch`] | Column count differs from `n_train` |
    /// | [`DistanceError::NegativeDistance`] | Any entry is negative |
    pub fn precomputed_cross(x: &FeatureMatrix, n_train: usize) -> Result<Self, DistanceError> {
        let (rows, cols) = x.shape();
        if cols != n_train {
            return Err(DistanceError::DimensionMismatch { expected: n_train, got: cols });
        }
        check_non_negative(x)?;
        Ok(Self::from_raw(rows, cols, x.as_slice().to_vec()))
    }

    /// Return the number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Return the number of columns.
    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Return true if the matrix is square.
    #[must_use]
    pub fn is_square(&self) -> bool {
        self.n_rows == self.n_cols
    }

    /// Return the distance at `(i, j)`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= n_rows()` or `j >= n_cols()`.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.n_rows, "row index {i} out of bounds for matrix with {} rows", self.n_rows);
        assert!(j < self.n_cols, "column index {j} out of bounds for matrix with {} columns", self.n_cols);
        self.data[i * self.n_cols + j]
    }

    /// Borrow row `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= n_rows()`.
    #[must_use]
    pub fn row(&self, i: usize) -> &[f64] {
        assert!(i < self.n_rows, "row index {i} out of bounds for matrix with {} rows", self.n_rows);
        &self.data[i * self.n_cols..(i + 1) * self.n_cols]
    }

    /// Iterate over rows in order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[f64]> + '_ {
        self.data.chunks_exact(self.n_cols)
    }

    /// Sum of each row, accumulated left to right.
    #[must_use]
    pub fn row_sums(&self) -> Vec<f64> {
        self.rows().map(|r| r.iter().sum()).collect()
    }

    /// Return a new matrix keeping only the given columns, in the given order.
    ///
    /// # Panics
    ///
    /// Panics if any column index is out of bounds.
    #[must_use]
    pub fn select_columns(&self, columns: &[usize]) -> Self {
        let mut data = Vec::with_capacity(self.n_rows * columns.len());
        for row in self.rows() {
            data.extend(columns.iter().map(|&c| row[c]));
        }
        Self::from_raw(self.n_rows, columns.len(), data)
    }

    /// Return the square sub-matrix over `indices` (rows and columns).
    ///
    /// # Panics
    ///
    /// Panics if any index is out of bounds.
    #[must_use]
    pub fn submatrix(&self, indices: &[usize]) -> Self {
        let mut data = Vec::with_capacity(indices.len() * indices.len());
        for &i in indices {
            let row = self.row(i);
            data.extend(indices.iter().map(|&j| row[j]));
        }
        Self::from_raw(indices.len(), indices.len(), data)
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
}

impl Index<(usize, usize)> for DistanceMatrix {
    type Output = f64;

    fn index(&self, (i, j): (usize, usize)) -> &Self::Output {
        &self.row(i)[j]
    }
}

fn check_non_negative(x: &FeatureMatrix) -> Result<(), DistanceError> {
    for (row, values) in x.rows().enumerate() {
        if let Some(col) = values.iter().position(|&v| v < 0.0) {
            return Err(DistanceError::NegativeDistance { row, col, value: values[col] });
        }
    }
    Ok(())
}
