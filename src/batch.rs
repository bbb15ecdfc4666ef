//! End-to-end batch scoring.
//!
//! ```text
//! load input ─> drift check vs reference ─> report file
//!     │              (failure only logged)
//!     └─────> predict ─> summary ─> predictions file (optional)
//! ```

use crate::config::PipelineConfig;
use crate::data::{Dataset, load_dataset, write_predictions};
use crate::error::{Result, ResultExt as _};
use crate::model::{PredictionEngine, PredictionSummary};
use crate::monitor::{DriftDetector, DriftReport, DriftSummary, render};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// What a drift check produced.
#[derive(Clone, Debug, Serialize)]
pub struct DriftOutcome {
    pub summary: DriftSummary,
    pub report_path: PathBuf,
}

#[derive(Clone, Debug, Serialize)]
pub struct BatchOutcome {
    pub input: PathBuf,
    pub labels: Vec<i64>,
    pub summary: PredictionSummary,
    /// `None` when monitoring is off or the check failed.
    pub drift: Option<DriftOutcome>,
    pub predictions_path: Option<PathBuf>,
}

/// Compare `dataset` with the configured reference and write the report.
///
/// # Errors
///
/// Returns an error if no reference is configured, the reference cannot be
/// loaded, or the report cannot be rendered or written.
pub fn check_drift(config: &PipelineConfig, dataset: &Dataset) -> Result<(DriftReport, DriftOutcome)> {
    let reference = config.reference_path.as_deref().ok_or_else(|| {
        crate::error::ChurnError::Config("no reference dataset configured".to_owned())
    })?;

    let detector = DriftDetector::from_path(reference)?
        .with_threshold(config.drift_threshold)
        .with_policy(config.divergence_policy);
    let report = detector.detect_drift(dataset, None)?;
    let summary = report.summary();

    let report_path = render(&summary, &report, config.report_format)?.persist(&config.report_dir)?;
    Ok((
        report,
        DriftOutcome {
            summary,
            report_path,
        },
    ))
}

/// Score every row of `input`. The model is loaded from
/// `config.model_path` unless `engine` already has one.
///
/// # Errors
///
/// Returns an error if the input cannot be loaded, the model cannot be
/// loaded, prediction fails, or the prediction table cannot be written.
/// Drift monitoring failures are logged and do not fail the batch.
pub fn run_batch(
    config: &PipelineConfig,
    engine: &PredictionEngine,
    input: &Path,
) -> Result<BatchOutcome> {
    tracing::info!(input = %input.display(), "Starting batch prediction");
    let dataset = load_dataset(input)
        .with_context(|| format!("Failed to load {}", input.display()))?;
    tracing::info!(
        rows = dataset.height(),
        columns = dataset.columns().len(),
        "Data loaded successfully"
    );

    let drift = if config.reference_path.is_some() {
        match check_drift(config, &dataset) {
            Ok((_, outcome)) => {
                tracing::info!(report = %outcome.report_path.display(), "Drift report generated");
                Some(outcome)
            }
            Err(e) => {
                tracing::error!(error = %e, "Drift check failed, continuing with prediction");
                None
            }
        }
    } else {
        tracing::debug!("No reference dataset configured, drift check skipped");
        None
    };

    if !engine.is_loaded() {
        engine.load_model(&config.model_path)?;
    }
    let rows = engine.predict_rows(&dataset)?;
    let labels: Vec<i64> = rows.iter().map(|p| p.label).collect();
    let summary = PredictionSummary::from_labels(&labels);
    tracing::info!(
        total_customers = summary.total_customers,
        churn_count = summary.churn_count,
        churn_rate = format!("{:.2}%", summary.churn_rate),
        "Predictions completed"
    );

    let predictions_path = match &config.predictions_path {
        Some(path) => {
            write_predictions(&rows, path)
                .with_context(|| format!("Failed to write predictions to {}", path.display()))?;
            Some(path.clone())
        }
        None => None,
    };

    Ok(BatchOutcome {
        input: input.to_path_buf(),
        labels,
        summary,
        drift,
        predictions_path,
    })
}
