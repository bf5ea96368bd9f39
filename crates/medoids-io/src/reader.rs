//! CSV feature reader with full input validation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use medoids_distance::FeatureMatrix;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::{FeatureDataset, SampleId};

/// Reads a feature table from a CSV file.
///
/// Expected CSV format:
/// - Header row required (first column is the sample ID, remaining are feature names)
/// - `sample_id,f1,f2,...,fm`
/// - One row per sample, all rows must have the same number of columns
///
/// A precomputed distance matrix uses the same layout: one column per
/// training sample.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::NoFeatureColumns`] | Only the sample ID column, no feature columns |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::EmptySampleId`] | First column of a row is empty |
/// | [`IoError::NonFiniteValue`] | Cell is NaN, Inf, or unparseable float |
/// | [`IoError::DuplicateSampleId`] | Same sample ID appears twice |
pub struct FeatureReader {
    path: PathBuf,
}

impl FeatureReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self { path: path.to_path_buf() }
    }

    /// Read and validate the CSV file, returning a [`FeatureDataset`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<FeatureDataset, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) lets the InconsistentRowLength check below report
        // short rows instead of a low-level CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?;
        let expected_cols = header.len();
        debug!(expected_cols, "read CSV header");

        if expected_cols < 2 {
            return Err(IoError::NoFeatureColumns { path: self.path.clone() });
        }
        let feature_names: Vec<String> = header.iter().skip(1).map(String::from).collect();
        let n_features = feature_names.len();

        let mut sample_ids = Vec::new();
        let mut data = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;

            let id = record.get(0).unwrap_or("").to_string();
            if record.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    sample_id: id,
                    expected: expected_cols,
                    got: record.len(),
                });
            }
            if id.is_empty() {
                return Err(IoError::EmptySampleId { path: self.path.clone(), row_index });
            }
            if let Some(&first_row) = seen.get(&id) {
                return Err(IoError::DuplicateSampleId {
                    path: self.path.clone(),
                    sample_id: id,
                    first_row,
                    second_row: row_index,
                });
            }
            seen.insert(id.clone(), row_index);

            for (col_index, raw) in record.iter().skip(1).enumerate() {
                data.push(self.parse_value(raw, row_index, col_index)?);
            }
            sample_ids.push(SampleId::new(id));
        }

        if sample_ids.is_empty() {
            return Err(IoError::EmptyDataset { path: self.path.clone() });
        }

        let features = FeatureMatrix::from_flat(sample_ids.len(), n_features, data)?;

        info!(n_samples = sample_ids.len(), n_features, "feature dataset loaded");

        Ok(FeatureDataset::new(sample_ids, feature_names, features))
    }

    fn parse_value(&self, raw: &str, row_index: usize, col_index: usize) -> Result<f64, IoError> {
        let non_finite = || IoError::NonFiniteValue {
            path: self.path.clone(),
            row_index,
            col_index,
            raw: raw.to_string(),
        };
        let value: f64 = raw.parse().map_err(|_| non_finite())?;
        if !value.is_finite() {
            return Err(non_finite());
        }
        Ok(value)
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}
