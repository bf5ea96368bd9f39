//! File I/O, validation, and serialization for the medoids pipeline.

mod domain;
mod error;
mod reader;
mod writer;

pub use domain::{ExperimentName, FeatureDataset, SampleId};
pub use error::IoError;
pub use reader::FeatureReader;
pub use writer::ResultWriter;
