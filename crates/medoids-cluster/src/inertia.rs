use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Sum of distances from each sample to its nearest medoid.
///
/// Distances are not squared: the objective is whatever dissimilarity the
/// metric produced. Lower inertia indicates tighter clusters.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Inertia(f64);

impl Inertia {
    /// Create a new inertia value.
    pub(crate) fn new(value: f64) -> Self {
        Self(value)
    }

    /// Return the raw inertia value.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Total ordering comparison using [`f64::total_cmp`].
    #[must_use]
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }

    /// Return true if `self` is strictly below `other`.
    #[must_use]
    pub fn improves_on(self, other: Self) -> bool {
        self.0 < other.0
    }
}

impl fmt::Display for Inertia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use super::Inertia;

    #[test]
    fn display_format() {
        let inertia = Inertia::new(0.2);
        assert_eq!(format!("{inertia}"), "0.200000");
    }

    #[test]
    fn total_cmp_ordering() {
        let a = Inertia::new(1.0);
        let b = Inertia::new(2.0);
        assert_eq!(a.total_cmp(&b), Ordering::Less);
        assert_eq!(b.total_cmp(&a), Ordering::Greater);
        assert_eq!(a.total_cmp(&a), Ordering::Equal);
    }

    #[test]
    fn improvement_is_strict() {
        let a = Inertia::new(1.0);
        assert!(Inertia::new(0.5).improves_on(a));
        assert!(!Inertia::new(1.0).improves_on(a), "ties are not improvements");
        assert!(!Inertia::new(1.5).improves_on(a));
    }
}
