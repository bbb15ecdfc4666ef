//! Classifier artifacts.
//!
//! A model artifact is a JSON document wrapping a fitted linfa model,
//! serialized with linfa's own serde support:
//!
//! ```json
//! { "feature_columns": ["TotalCharges", "Month-to-month", "One year", "Two year", "PhoneService", "tenure"],
//!   "classifier": { "kind": "decision_tree", "model": { ... } } }
//! ```
//!
//! `kind` is `logistic_regression` (a `linfa_logistic::FittedLogisticRegression`)
//! or `decision_tree` (a `linfa_trees::DecisionTree`), both over `f64`
//! features and `usize` labels. Whether the model fits the feature matrix is
//! only discovered when predicting; `feature_columns` is informational.

use crate::error::{ChurnError, LoadError, PredictError};
use crate::utils::write_atomic;
use linfa::traits::Predict;
use linfa_logistic::FittedLogisticRegression;
use linfa_trees::DecisionTree;
use ndarray::{Array1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", content = "model", rename_all = "snake_case")]
pub enum FittedClassifier {
    LogisticRegression(FittedLogisticRegression<f64, usize>),
    DecisionTree(DecisionTree<f64, usize>),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelArtifact {
    #[serde(default)]
    pub feature_columns: Vec<String>,
    pub classifier: FittedClassifier,
}

impl ModelArtifact {
    pub fn new(feature_columns: &[&str], classifier: FittedClassifier) -> Self {
        Self {
            feature_columns: feature_columns.iter().map(|c| (*c).to_owned()).collect(),
            classifier,
        }
    }

    /// Read and parse an artifact file.
    ///
    /// # Errors
    ///
    /// [`LoadError::NotFound`] if the file is absent, [`LoadError::Io`] if it
    /// cannot be read, [`LoadError::Corrupt`] if it is not a valid artifact.
    pub fn read(path: &Path) -> Result<Self, LoadError> {
        let bytes = std::fs::read(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LoadError::NotFound(path.to_path_buf())
            } else {
                LoadError::Io {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        serde_json::from_slice(&bytes).map_err(|e| LoadError::Corrupt {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Write the artifact as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn write(&self, path: &Path) -> Result<(), ChurnError> {
        write_atomic(path, &serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    /// Turn the artifact into a ready classifier.
    ///
    /// # Errors
    ///
    /// [`LoadError::Incompatible`] if a logistic model has non-finite
    /// parameters or a coefficient count that contradicts `feature_columns`.
    pub fn into_classifier(self) -> Result<Box<dyn Classifier>, LoadError> {
        match self.classifier {
            FittedClassifier::LogisticRegression(model) => {
                let params = model.params();
                if params.is_empty() {
                    return Err(LoadError::Incompatible(
                        "logistic regression has no coefficients".to_owned(),
                    ));
                }
                if !model.intercept().is_finite() || params.iter().any(|c| !c.is_finite()) {
                    return Err(LoadError::Incompatible(
                        "logistic regression parameters must be finite".to_owned(),
                    ));
                }
                if !self.feature_columns.is_empty() && self.feature_columns.len() != params.len() {
                    return Err(LoadError::Incompatible(format!(
                        "artifact lists {} feature columns but the model has {} coefficients",
                        self.feature_columns.len(),
                        params.len()
                    )));
                }
                Ok(Box::new(model))
            }
            FittedClassifier::DecisionTree(tree) => Ok(Box::new(tree)),
        }
    }
}

/// Something that maps feature rows to class labels (0 = retain, 1 = churn).
///
/// Implementations are immutable after construction and may be shared
/// between threads.
pub trait Classifier: Send + Sync + std::fmt::Debug {
    /// One label per row, in row order.
    ///
    /// # Errors
    ///
    /// [`PredictError::Inference`] if the matrix does not fit the model.
    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Vec<i64>, PredictError>;

    fn name(&self) -> &'static str;
}

fn to_labels(predicted: &Array1<usize>) -> Result<Vec<i64>, PredictError> {
    predicted
        .iter()
        .map(|l| {
            i64::try_from(*l).map_err(|e| PredictError::Inference(format!("label {l}: {e}")))
        })
        .collect()
}

impl Classifier for FittedLogisticRegression<f64, usize> {
    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Vec<i64>, PredictError> {
        if features.ncols() != self.params().len() {
            return Err(PredictError::Inference(format!(
                "model expects {} features, got {}",
                self.params().len(),
                features.ncols()
            )));
        }
        let predicted: Array1<usize> = Predict::predict(self, &features);
        to_labels(&predicted)
    }

    fn name(&self) -> &'static str {
        "logistic_regression"
    }
}

impl Classifier for DecisionTree<f64, usize> {
    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Vec<i64>, PredictError> {
        if let Some(feature) = self.features().into_iter().find(|f| *f >= features.ncols()) {
            return Err(PredictError::Inference(format!(
                "tree splits on feature {feature} but rows have {} features",
                features.ncols()
            )));
        }
        let predicted: Array1<usize> = Predict::predict(self, &features);
        to_labels(&predicted)
    }

    fn name(&self) -> &'static str {
        "decision_tree"
    }
}


#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used)]

    use super::testing::*;
    use super::*;
    use crate::features::FEATURE_COLUMNS;
    use ndarray::array;

    // TotalCharges, Month-to-month, One year, Two year, PhoneService, tenure
    fn rows() -> ndarray::Array2<f64> {
        array![
            [29.85, 1.0, 0.0, 0.0, 0.0, 1.0],
            [1889.5, 0.0, 1.0, 0.0, 1.0, 34.0],
            [2279.0, 0.0, 0.0, 1.0, 1.0, 20.5],
            [1840.75, 0.0, 0.0, 0.0, 1.0, 45.0],
        ]
    }

    #[test]
    fn test_tree_predicts_month_to_month_churn() {
        let tree = month_to_month_tree();
        assert_eq!(Classifier::predict(&tree, rows().view()).unwrap(), vec![1, 0, 0, 0]);
        assert_eq!(tree.name(), "decision_tree");
    }

    #[test]
    fn test_logistic_predicts_month_to_month_churn() {
        let model = month_to_month_logistic();
        assert_eq!(Classifier::predict(&model, rows().view()).unwrap(), vec![1, 0, 0, 0]);

        let p = model.predict_probabilities(&rows());
        assert!(p[0] > 0.5 && p[1] < 0.5);
    }

    #[test]
    fn test_shape_mismatch_is_inference_error() {
        let narrow = array![[1.0, 2.0]];
        assert!(matches!(
            Classifier::predict(&month_to_month_logistic(), narrow.view()),
            Err(PredictError::Inference(_))
        ));
        assert!(matches!(
            Classifier::predict(&month_to_month_tree(), narrow.view()),
            Err(PredictError::Inference(_))
        ));
    }

    #[test]
    fn test_artifact_survives_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        ModelArtifact::new(
            &FEATURE_COLUMNS,
            FittedClassifier::LogisticRegression(month_to_month_logistic()),
        )
        .write(&path)
        .unwrap();

        let artifact = ModelArtifact::read(&path).unwrap();
        assert_eq!(artifact.feature_columns, FEATURE_COLUMNS);
        let classifier = artifact.into_classifier().unwrap();
        assert_eq!(classifier.name(), "logistic_regression");
        assert_eq!(classifier.predict(rows().view()).unwrap(), vec![1, 0, 0, 0]);

        let document: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(document["classifier"]["kind"], "logistic_regression");
    }

    #[test]
    fn test_declared_columns_must_match_coefficients() {
        let artifact = ModelArtifact::new(
            &["TotalCharges", "tenure"],
            FittedClassifier::LogisticRegression(month_to_month_logistic()),
        );
        assert!(matches!(
            artifact.into_classifier(),
            Err(LoadError::Incompatible(_))
        ));
    }

    #[test]
    fn test_read_reports_missing_and_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("model.json");
        assert!(matches!(
            ModelArtifact::read(&missing),
            Err(LoadError::NotFound(_))
        ));

        std::fs::write(&missing, b"\x80\x04pickle").unwrap();
        assert!(matches!(
            ModelArtifact::read(&missing),
            Err(LoadError::Corrupt { .. })
        ));

        std::fs::write(&missing, br#"{"classifier": {"kind": "random_forest", "model": {}}}"#).unwrap();
        assert!(matches!(
            ModelArtifact::read(&missing),
            Err(LoadError::Corrupt { .. })
        ));
    }
}
