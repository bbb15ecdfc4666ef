//! Classifier loading and inference.
//!
//! [`PredictionEngine`] owns the loaded classifier for the lifetime of the
//! process and runs the [`FeatureTransformer`](crate::features::FeatureTransformer)
//! in front of it. Construct one at startup and pass it to whatever handles
//! requests; there is no global model.

pub mod artifact;
pub mod engine;

pub use artifact::{Classifier, FittedClassifier, ModelArtifact};
pub use engine::{PredictionEngine, PredictionSummary, RowPrediction, churn_status};
