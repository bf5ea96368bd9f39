//! Compressed sparse row input.
//!
//! Medoid selection needs every pairwise distance, so sparse input is
//! densified before any distance is computed.

use crate::error::DistanceError;
use crate::features::FeatureMatrix;

/// Sparse matrix in compressed sparse row (CSR) layout.
///
/// Row `i` holds the entries `data[indptr[i]..indptr[i + 1]]` at columns
/// `indices[indptr[i]..indptr[i + 1]]`. Missing entries are zero.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    n_rows: usize,
    n_cols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f64>,
}

impl SparseMatrix {
    /// Build a CSR matrix from its raw arrays.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DistanceError::EmptyMatrix`] | `n_rows` or `n_cols` is zero |
    /// | [`DistanceError::InvalidSparse`] | `indptr` is not monotone, does not have `n_rows + 1` entries, or a column index is out of range |
    /// | [`DistanceError::NonFiniteValue`] | A stored value is NaN or infinite |
    pub fn new(
        n_rows: usize,
        n_cols: usize,
        indptr: Vec<usize>,
        indices: Vec<usize>,
        data: Vec<f64>,
    ) -> Result<Self, DistanceError> {
        if n_rows == 0 || n_cols == 0 {
            return Err(DistanceError::EmptyMatrix { rows: n_rows, cols: n_cols });
        }
        if indptr.len() != n_rows + 1 {
            return Err(DistanceError::InvalidSparse {
                reason: format!("indptr has {} entries, expected {}", indptr.len(), n_rows + 1),
            });
        }
        if indptr[0] != 0 || indptr.windows(2).any(|w| w[0] > w[1]) {
            return Err(DistanceError::InvalidSparse {
                reason: "indptr must start at 0 and be non-decreasing".to_string(),
            });
        }
        let nnz = indptr[n_rows];
        if indices.len() != nnz || data.len() != nnz {
            return Err(DistanceError::InvalidSparse {
                reason: format!(
                    "indptr declares {nnz} entries but indices has {} and data has {}",
                    indices.len(),
                    data.len()
                ),
            });
        }
        if let Some(&col) = indices.iter().find(|&&c| c >= n_cols) {
            return Err(DistanceError::InvalidSparse {
                reason: format!("column index {col} out of range for {n_cols} columns"),
            });
        }
        for row in 0..n_rows {
            for pos in indptr[row]..indptr[row + 1] {
                if !data[pos].is_finite() {
                    return Err(DistanceError::NonFiniteValue { row, col: indices[pos] });
                }
            }
        }
        Ok(Self { n_rows, n_cols, indptr, indices, data })
    }

    /// Build a CSR matrix from `(row, col, value)` triplets.
    ///
    /// Triplets may arrive in any order. Duplicate coordinates are summed.
    ///
    /// # Errors
    ///
    /// Same conditions as [`SparseMatrix::new`], plus
    /// [`DistanceError::InvalidSparse`] when a row index is out of range.
    pub fn from_triplets(
        n_rows: usize,
        n_cols: usize,
        triplets: &[(usize, usize, f64)],
    ) -> Result<Self, DistanceError> {
        if let Some(&(row, _, _)) = triplets.iter().find(|(r, _, _)| *r >= n_rows) {
            return Err(DistanceError::InvalidSparse {
                reason: format!("row index {row} out of range for {n_rows} rows"),
            });
        }

        let mut sorted: Vec<(usize, usize, f64)> = triplets.to_vec();
        sorted.sort_by_key(|&(r, c, _)| (r, c));

        let mut indptr = vec![0usize; n_rows + 1];
        let mut indices = Vec::with_capacity(sorted.len());
        let mut data: Vec<f64> = Vec::with_capacity(sorted.len());
        let mut last: Option<(usize, usize)> = None;

        for (row, col, value) in sorted {
            if last == Some((row, col)) {
                if let Some(v) = data.last_mut() {
                    *v += value;
                }
                continue;
            }
            indices.push(col);
            data.push(value);
            indptr[row + 1] += 1;
            last = Some((row, col));
        }
        for row in 0..n_rows {
            indptr[row + 1] += indptr[row];
        }

        Self::new(n_rows, n_cols, indptr, indices, data)
    }

    /// Return `(rows, cols)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }

    /// Return the number of stored entries.
    #[must_use]
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Expand into a dense [`FeatureMatrix`].
    ///
    /// # Errors
    ///
    /// Returns [`DistanceError::NonFiniteValue`] if summing duplicate entries
    /// overflowed to infinity.
    pub fn to_dense(&self) -> Result<FeatureMatrix, DistanceError> {
        let mut dense = vec![0.0; self.n_rows * self.n_cols];
        for row in 0..self.n_rows {
            for pos in self.indptr[row]..self.indptr[row + 1] {
                dense[row * self.n_cols + self.indices[pos]] += self.data[pos];
            }
        }
        FeatureMatrix::from_flat(self.n_rows, self.n_cols, dense)
    }
}
