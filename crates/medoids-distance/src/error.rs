//! Error types for feature validation and distance computation.

/// Errors from feature matrix validation, metric lookup, and distance computation.
#[derive(Debug, thiserror::Error)]
pub enum DistanceError {
    /// Returned when a matrix has no rows or no columns.
    #[error("matrix must be non-empty, got {rows} rows and {cols} columns")]
    EmptyMatrix {
        /// Number of rows provided.
        rows: usize,
        /// Number of columns provided.
        cols: usize,
    },

    /// Returned when a row has a different length than the first row.
    #[error("row {row} has {got} values, expected {expected}")]
    RaggedRows {
        /// Zero-based index of the offending row.
        row: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        got: usize,
    },

    /// Returned when a flat buffer does not match the declared shape.
    #[error("buffer of length {len} does not fit shape ({rows}, {cols})")]
    ShapeMismatch {
        /// Declared number of rows.
        rows: usize,
        /// Declared number of columns.
        cols: usize,
        /// Actual buffer length.
        len: usize,
    },

    /// Returned when a value is NaN or infinite.
    #[error("non-finite value at ({row}, {col})")]
    NonFiniteValue {
        /// Zero-based row index.
        row: usize,
        /// Zero-based column index.
        col: usize,
    },

    /// Returned when a precomputed distance matrix is not square.
    #[error("precomputed distance matrix must be square, got shape ({rows}, {cols})")]
    NotSquare {
        /// Number of rows.
        rows: usize,
        /// Number of columns.
        cols: usize,
    },

    /// Returned when a precomputed distance matrix is not symmetric.
    #[error("precomputed distance matrix is not symmetric: d[{i}][{j}] = {upper} but d[{j}][{i}] = {lower}")]
    Asymmetric {
        /// Row of the upper-triangle entry.
        i: usize,
        /// Column of the upper-triangle entry.
        j: usize,
        /// Value at `(i, j)`.
        upper: f64,
        /// Value at `(j, i)`.
        lower: f64,
    },

    /// Returned when a precomputed distance matrix has a non-zero diagonal entry.
    #[error("precomputed distance matrix has non-zero diagonal: d[{index}][{index}] = {value}")]
    NonZeroDiagonal {
        /// Diagonal position.
        index: usize,
        /// Offending value.
        value: f64,
    },

    /// Returned when a distance is negative.
    #[error("negative distance {value} at ({row}, {col})")]
    NegativeDistance {
        /// Zero-based row index.
        row: usize,
        /// Zero-based column index.
        col: usize,
        /// Offending value.
        value: f64,
    },

    /// Returned when two inputs disagree on the number of columns.
    #[error("expected {expected} columns, got {got}")]
    DimensionMismatch {
        /// Expected column count.
        expected: usize,
        /// Actual column count.
        got: usize,
    },

    /// Returned when a metric name is not recognized.
    #[error("unknown metric \"{name}\" (expected one of: {expected})")]
    UnknownMetric {
        /// The unrecognized name.
        name: String,
        /// Comma-separated list of accepted names.
        expected: &'static str,
    },

    /// Returned when a custom metric produces a NaN, infinite, or negative value.
    #[error("metric \"{metric}\" returned invalid distance {value} for pair ({row}, {col})")]
    InvalidMetricOutput {
        /// Name of the metric.
        metric: String,
        /// Row of the pair.
        row: usize,
        /// Column of the pair.
        col: usize,
        /// Offending value.
        value: f64,
    },

    /// Returned when pairwise distances are requested in precomputed mode
    /// for a reference set other than the training matrix.
    #[error("cross distances are not defined for the precomputed metric; pass the distance matrix directly")]
    PrecomputedCross,

    /// Returned when a sparse matrix has an inconsistent structure.
    #[error("invalid sparse structure: {reason}")]
    InvalidSparse {
        /// Description of the inconsistency.
        reason: String,
    },
}
