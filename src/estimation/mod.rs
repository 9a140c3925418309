//! Carbon emission and eco-points estimation.

pub mod activity;
pub mod artifacts;
pub mod emissions;
pub mod fallback;
pub mod features;
pub mod forest;
pub mod model;
pub mod service;
pub mod synthetic;
pub mod training;

pub use activity::{ActivityInput, Category, EcoPointsEstimate, PredictionSource};
pub use artifacts::{ArtifactError, ArtifactPaths};
pub use emissions::estimate_emissions;
pub use service::{EcoEstimator, EstimatorConfig};
pub use training::{TrainingError, TrainingMetrics, TrainingParams};
