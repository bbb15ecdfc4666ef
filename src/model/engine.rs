use super::artifact::{Classifier, ModelArtifact};
use crate::data::Dataset;
use crate::error::{LoadError, PredictError};
use crate::features::FeatureTransformer;
use serde::Serialize;
use std::path::Path;
use std::sync::OnceLock;

/// Applies the feature transformer and a loaded classifier to datasets.
///
/// The classifier is set once, either by [`PredictionEngine::load_model`] or
/// [`PredictionEngine::with_classifier`], and only read afterwards, so one
/// engine can serve many threads behind an `Arc`.
#[derive(Debug, Default)]
pub struct PredictionEngine {
    transformer: FeatureTransformer,
    classifier: OnceLock<Box<dyn Classifier>>,
}

impl PredictionEngine {
    pub fn new(transformer: FeatureTransformer) -> Self {
        Self {
            transformer,
            classifier: OnceLock::new(),
        }
    }

    /// An engine with an already-built classifier.
    pub fn with_classifier(transformer: FeatureTransformer, classifier: Box<dyn Classifier>) -> Self {
        let engine = Self::new(transformer);
        let _ = engine.classifier.set(classifier);
        engine
    }

    pub fn transformer(&self) -> &FeatureTransformer {
        &self.transformer
    }

    pub fn is_loaded(&self) -> bool {
        self.classifier.get().is_some()
    }

    /// Load the classifier artifact. Succeeds at most once per engine.
    ///
    /// # Errors
    ///
    /// [`LoadError::AlreadyLoaded`] on a second call; otherwise the artifact
    /// read or validation failure.
    pub fn load_model(&self, path: &Path) -> Result<(), LoadError> {
        if self.is_loaded() {
            return Err(LoadError::AlreadyLoaded);
        }

        let classifier = ModelArtifact::read(path)?.into_classifier()?;
        let name = classifier.name();
        self.classifier
            .set(classifier)
            .map_err(|_already| LoadError::AlreadyLoaded)?;

        tracing::info!(model_path = %path.display(), model = name, "Model loaded successfully");
        Ok(())
    }

    /// Transform `dataset` and classify every row.
    ///
    /// Labels are in input row order. Under
    /// [`MissingContractPolicy::DropRows`](crate::features::MissingContractPolicy::DropRows)
    /// rows without a contract yield no label.
    ///
    /// # Errors
    ///
    /// [`PredictError::ModelNotLoaded`] before a successful load, otherwise
    /// the transformation or classifier failure.
    pub fn predict(&self, dataset: &Dataset) -> Result<Vec<i64>, PredictError> {
        Ok(self
            .predict_rows(dataset)?
            .into_iter()
            .map(|p| p.label)
            .collect())
    }

    /// Like [`predict`](Self::predict), with each label paired with the
    /// input row it was computed from.
    ///
    /// # Errors
    ///
    /// As [`predict`](Self::predict).
    pub fn predict_rows(&self, dataset: &Dataset) -> Result<Vec<RowPrediction>, PredictError> {
        let classifier = self.classifier.get().ok_or(PredictError::ModelNotLoaded)?;

        let features = self.transformer.features(dataset)?;
        let labels = classifier.predict(features.view())?;
        if labels.len() != features.nrows() {
            return Err(PredictError::Inference(format!(
                "classifier returned {} labels for {} rows",
                labels.len(),
                features.nrows()
            )));
        }

        tracing::debug!(rows = labels.len(), "Prediction made successfully");
        Ok(features
            .row_ids()
            .iter()
            .zip(labels)
            .map(|(row, label)| RowPrediction { row: *row, label })
            .collect())
    }
}

/// A label and the 0-based input row it belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RowPrediction {
    pub row: usize,
    pub label: i64,
}

/// Aggregate view over a batch of labels.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PredictionSummary {
    pub total_customers: usize,
    pub churn_count: usize,
    /// Percentage of churn labels, 0 for an empty batch.
    pub churn_rate: f64,
}

impl PredictionSummary {
    pub fn from_labels(labels: &[i64]) -> Self {
        let total_customers = labels.len();
        let churn_count = labels.iter().filter(|l| **l == 1).count();
        let churn_rate = if total_customers == 0 {
            0.0
        } else {
            churn_count as f64 / total_customers as f64 * 100.0
        };
        Self {
            total_customers,
            churn_count,
            churn_rate,
        }
    }
}

/// Human-readable status for a label.
pub fn churn_status(label: i64) -> &'static str {
    if label == 1 { "Churn" } else { "No Churn" }
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used)]

    use super::*;
    use crate::features::{MissingContractPolicy, TransformerConfig};
    use crate::model::artifact::testing::{month_to_month_tree, write_tree_artifact};
    use anyhow::Result;
    use polars::prelude::*;
    use std::sync::Arc;

    fn sample() -> Result<Dataset> {
        Ok(Dataset::from_frame(df!(
            "TotalCharges" => [2000.0, 3000.0, 1500.0],
            "Contract" => ["Month-to-month", "One year", "Two year"],
            "PhoneService" => ["Yes", "No", "Yes"],
            "tenure" => [12.0, 24.0, 6.0],
        )?)?)
    }

    // Churn iff month-to-month.
    fn month_to_month_model() -> Box<dyn Classifier> {
        Box::new(month_to_month_tree())
    }

    fn write_artifact(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("model.json");
        write_tree_artifact(&path);
        path
    }

    #[test]
    fn test_predict_before_load() -> Result<()> {
        let engine = PredictionEngine::default();
        let err = engine.predict(&sample()?).unwrap_err();
        assert!(matches!(err, PredictError::ModelNotLoaded));
        assert!(!engine.is_loaded());
        Ok(())
    }

    #[test]
    fn test_load_then_predict() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let engine = PredictionEngine::default();
        engine.load_model(&write_artifact(dir.path()))?;
        assert_eq!(engine.predict(&sample()?)?, vec![1, 0, 0]);
        Ok(())
    }

    #[test]
    fn test_load_only_once() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = write_artifact(dir.path());
        let engine = PredictionEngine::default();
        engine.load_model(&path)?;
        assert!(matches!(
            engine.load_model(&path),
            Err(LoadError::AlreadyLoaded)
        ));
        Ok(())
    }

    #[test]
    fn test_failed_load_leaves_engine_unloaded() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let engine = PredictionEngine::default();
        assert!(matches!(
            engine.load_model(&dir.path().join("absent.json")),
            Err(LoadError::NotFound(_))
        ));
        assert!(!engine.is_loaded());
        assert!(matches!(
            engine.predict(&sample()?),
            Err(PredictError::ModelNotLoaded)
        ));
        Ok(())
    }

    #[test]
    fn test_transform_errors_surface() -> Result<()> {
        let engine =
            PredictionEngine::with_classifier(FeatureTransformer::default(), month_to_month_model());
        let ds = Dataset::from_frame(df!(
            "TotalCharges" => [1.0],
            "Contract" => ["One year"],
            "tenure" => [1.0],
        )?)?;
        assert!(matches!(
            engine.predict(&ds),
            Err(PredictError::Transform(_))
        ));
        Ok(())
    }

    #[test]
    fn test_shared_across_threads() -> Result<()> {
        let engine = Arc::new(PredictionEngine::with_classifier(
            FeatureTransformer::default(),
            month_to_month_model(),
        ));
        let ds = Arc::new(sample()?);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = Arc::clone(&engine);
                let ds = Arc::clone(&ds);
                std::thread::spawn(move || engine.predict(&ds).unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), vec![1, 0, 0]);
        }
        Ok(())
    }

    #[test]
    fn test_dropped_rows_keep_input_row_numbers() -> Result<()> {
        let transformer = FeatureTransformer::new(TransformerConfig {
            missing_contract: MissingContractPolicy::DropRows,
            ..Default::default()
        });
        let engine = PredictionEngine::with_classifier(transformer, month_to_month_model());
        let ds = Dataset::from_frame(df!(
            "TotalCharges" => [1.0, 2.0, 3.0],
            "Contract" => [None, Some("Month-to-month"), Some("Two year")],
            "PhoneService" => ["Yes", "No", "Yes"],
            "tenure" => [1.0, 2.0, 3.0],
        )?)?;

        let rows = engine.predict_rows(&ds)?;
        assert_eq!(
            rows,
            [
                RowPrediction { row: 1, label: 1 },
                RowPrediction { row: 2, label: 0 },
            ]
        );
        assert_eq!(engine.predict(&ds)?, vec![1, 0]);
        Ok(())
    }

    #[test]
    fn test_prediction_summary() {
        let summary = PredictionSummary::from_labels(&[1, 0, 0, 1]);
        assert_eq!(summary.total_customers, 4);
        assert_eq!(summary.churn_count, 2);
        assert!((summary.churn_rate - 50.0).abs() < 1e-12);
        assert!((PredictionSummary::from_labels(&[]).churn_rate).abs() < f64::EPSILON);
        assert_eq!(churn_status(1), "Churn");
        assert_eq!(churn_status(0), "No Churn");
    }
}
