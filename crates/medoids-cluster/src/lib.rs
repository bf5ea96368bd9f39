//! k-medoids clustering over arbitrary distance metrics.
//!
//! Medoids are actual training samples. Fitting builds a pairwise distance
//! matrix once, picks initial medoids (random, heuristic, k-medoids++, or
//! caller-supplied), then refines them with either the alternating
//! (Voronoi-iteration) update or PAM swaps until the medoid set stops
//! changing or the inertia stops strictly decreasing. CLARA runs PAM on
//! random subsamples for datasets too large for a full distance matrix.

mod assign;
mod clara;
mod config;
mod error;
mod inertia;
mod init;
mod kmedoids;
mod label;
mod model;
mod refine;
mod result;
mod serialize;
mod silhouette;

pub use assign::{Assignment, assign, assign_to_columns};
pub use config::{ClaraConfig, InitStrategy, KMedoidsConfig, Method, OptimizeConfig};
pub use error::ClusterError;
pub use inertia::Inertia;
pub use init::{MedoidInitializer, heuristic_medoids, kmedoids_plus_plus, random_medoids};
pub use label::ClusterLabel;
pub use model::KMedoidsModel;
pub use refine::{Alternating, Pam, Refined, StepOutcome, UpdateStrategy, refine};
pub use result::{FitWarning, KResult, OptimizeResult, Termination};
pub use silhouette::{SampleSilhouette, SilhouetteScore, compute_silhouette};
