use super::profile::{
    CategoricalProfile, ColumnProfile, DatasetProfile, NumericProfile, profile_column,
};
use super::report::{DriftMetric, DriftReport};
use crate::data::{Dataset, load_dataset};
use crate::error::{DatasetError, ReferenceLoadError};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_DRIFT_THRESHOLD: f64 = 0.05;

/// How numeric columns are scored. Categorical columns always use the
/// largest difference in category share.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DivergencePolicy {
    /// Mean of the relative mean shift and the relative stddev shift.
    #[default]
    MomentShift,
    /// Kolmogorov-Smirnov distance between the quantile sketches.
    QuantileDistance,
}

/// Compares datasets against a reference profile built once at construction.
#[derive(Clone, Debug)]
pub struct DriftDetector {
    reference: DatasetProfile,
    threshold: f64,
    policy: DivergencePolicy,
}

impl DriftDetector {
    /// # Errors
    ///
    /// [`ReferenceLoadError::Empty`] for a dataset without rows or columns,
    /// [`ReferenceLoadError::Profile`] if it cannot be profiled.
    pub fn new(reference: &Dataset) -> Result<Self, ReferenceLoadError> {
        if reference.is_empty() || reference.columns().is_empty() {
            return Err(ReferenceLoadError::Empty);
        }

        let profile = DatasetProfile::build(reference)?;
        tracing::info!(
            rows = profile.row_count(),
            columns = profile.len(),
            "Reference profile built"
        );

        Ok(Self {
            reference: profile,
            threshold: DEFAULT_DRIFT_THRESHOLD,
            policy: DivergencePolicy::default(),
        })
    }

    /// Load the reference dataset from a CSV or JSON file.
    ///
    /// # Errors
    ///
    /// [`ReferenceLoadError::Unreadable`] if the file cannot be loaded,
    /// otherwise as [`DriftDetector::new`].
    pub fn from_path(path: &Path) -> Result<Self, ReferenceLoadError> {
        let dataset = load_dataset(path).map_err(|e| ReferenceLoadError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::new(&dataset)
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: DivergencePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn policy(&self) -> DivergencePolicy {
        self.policy
    }

    pub fn reference(&self) -> &DatasetProfile {
        &self.reference
    }

    /// Score every column shared by the reference and `current`.
    ///
    /// Columns present on only one side are skipped. A shared column is
    /// always read as the kind the reference gave it, so a numeric column
    /// that arrives as text (blank `TotalCharges` tokens, say) is still
    /// compared as numbers. `threshold` overrides the detector's threshold
    /// for this call.
    ///
    /// # Errors
    ///
    /// Returns an error only if `current` cannot be profiled.
    pub fn detect_drift(
        &self,
        current: &Dataset,
        threshold: Option<f64>,
    ) -> Result<DriftReport, DatasetError> {
        let threshold = threshold.unwrap_or(self.threshold);

        let mut metrics = Vec::with_capacity(self.reference.len());
        for (name, reference) in self.reference.columns() {
            let Some(current_kind) = current.kind(name) else {
                tracing::debug!(column = name, "Column not in current data, skipped");
                continue;
            };
            if current_kind != reference.kind() {
                tracing::debug!(
                    column = name,
                    reference = reference.kind().as_str(),
                    current = current_kind.as_str(),
                    "Reading column as its reference kind"
                );
            }

            let observed = profile_column(current, name, reference.kind())?;
            let score = self.divergence(reference, &observed).unwrap_or_default();
            metrics.push((name.to_owned(), DriftMetric::new(score, threshold)));
        }

        let report = DriftReport::new(Utc::now(), metrics);
        let summary = report.summary();
        tracing::info!(
            drift_detected = summary.drift_detected,
            drift_score = summary.drift_score,
            features_drifted = ?summary.features_drifted,
            "Drift metrics computed"
        );
        Ok(report)
    }

    /// `None` when the two profiles are of different kinds.
    pub fn divergence(&self, reference: &ColumnProfile, current: &ColumnProfile) -> Option<f64> {
        match (reference, current) {
            (ColumnProfile::Categorical(r), ColumnProfile::Categorical(c)) => {
                Some(categorical_divergence(r, c))
            }
            (ColumnProfile::Numeric(r), ColumnProfile::Numeric(c)) => Some(match self.policy {
                DivergencePolicy::MomentShift => moment_shift_divergence(r, c),
                DivergencePolicy::QuantileDistance => quantile_distance(r, c),
            }),
            _ => None,
        }
    }
}

/// Largest absolute difference in category share over the union of
/// categories seen on either side.
pub fn categorical_divergence(reference: &CategoricalProfile, current: &CategoricalProfile) -> f64 {
    reference
        .frequencies
        .keys()
        .chain(current.frequencies.keys())
        .map(|category| {
            let r = reference.frequencies.get(category).copied().unwrap_or(0.0);
            let c = current.frequencies.get(category).copied().unwrap_or(0.0);
            (r - c).abs()
        })
        .fold(0.0, f64::max)
}

/// Average of `|Δmean| / |ref_mean|` and `|Δstd| / ref_std`. Each term is 0
/// when its reference value is 0.
pub fn moment_shift_divergence(reference: &NumericProfile, current: &NumericProfile) -> f64 {
    let ref_mean = reference.mean.unwrap_or(0.0);
    let cur_mean = current.mean.unwrap_or(0.0);
    let mean_shift = if ref_mean == 0.0 {
        0.0
    } else {
        (ref_mean - cur_mean).abs() / ref_mean.abs()
    };

    let ref_std = reference.std_dev.unwrap_or(0.0);
    let cur_std = current.std_dev.unwrap_or(0.0);
    let std_shift = if ref_std == 0.0 {
        0.0
    } else {
        (ref_std - cur_std).abs() / ref_std
    };

    f64::midpoint(mean_shift, std_shift)
}

/// Kolmogorov-Smirnov distance between the step CDFs of two quantile
/// sketches. A side without observations is maximally distant from a side
/// with some.
pub fn quantile_distance(reference: &NumericProfile, current: &NumericProfile) -> f64 {
    match (reference.quantiles.is_empty(), current.quantiles.is_empty()) {
        (true, true) => return 0.0,
        (true, false) | (false, true) => return 1.0,
        (false, false) => {}
    }

    reference
        .quantiles
        .iter()
        .chain(&current.quantiles)
        .map(|x| (sketch_cdf(&reference.quantiles, *x) - sketch_cdf(&current.quantiles, *x)).abs())
        .fold(0.0, f64::max)
}

/// Probability level of the last sketch point at or below `x`.
fn sketch_cdf(quantiles: &[f64], x: f64) -> f64 {
    let below = quantiles.partition_point(|q| *q <= x);
    match (below, quantiles.len()) {
        (0, _) => 0.0,
        (_, 1) => 1.0,
        (k, n) => (k - 1) as f64 / (n - 1) as f64,
    }
}
