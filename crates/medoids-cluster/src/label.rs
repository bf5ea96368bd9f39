use std::fmt;

use serde::{Deserialize, Serialize};

/// A cluster assignment label: the position of a medoid in the medoid set,
/// not the row index of the medoid sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClusterLabel(usize);

impl ClusterLabel {
    /// Create a new cluster label from a zero-based medoid position.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based medoid position.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ClusterLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ClusterLabel> for usize {
    fn from(label: ClusterLabel) -> Self {
        label.0
    }
}
