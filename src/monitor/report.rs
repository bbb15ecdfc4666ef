use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Divergence of one column and whether it crossed the threshold.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DriftMetric {
    /// Serialized as `kl_divergence` for compatibility with existing
    /// report consumers. The value is not a KL divergence.
    #[serde(rename = "kl_divergence")]
    pub divergence_score: f64,
    pub drift_detected: bool,
}

impl DriftMetric {
    /// Drift is flagged strictly above the threshold.
    pub fn new(divergence_score: f64, threshold: f64) -> Self {
        Self {
            divergence_score,
            drift_detected: divergence_score > threshold,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnDrift {
    pub distribution: DriftMetric,
}

/// Per-column drift results of one comparison, in reference column order.
///
/// ```json
/// { "timestamp": "2024-05-01T10:00:00Z",
///   "columns": { "Contract": { "distribution": { "kl_divergence": 0.31, "drift_detected": true } } } }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    timestamp: DateTime<Utc>,
    columns: IndexMap<String, ColumnDrift>,
}

impl DriftReport {
    pub fn new(
        timestamp: DateTime<Utc>,
        metrics: impl IntoIterator<Item = (String, DriftMetric)>,
    ) -> Self {
        Self {
            timestamp,
            columns: metrics
                .into_iter()
                .map(|(name, distribution)| (name, ColumnDrift { distribution }))
                .collect(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn metric(&self, column: &str) -> Option<&DriftMetric> {
        self.columns.get(column).map(|c| &c.distribution)
    }

    pub fn metrics(&self) -> impl Iterator<Item = (&str, &DriftMetric)> {
        self.columns
            .iter()
            .map(|(name, c)| (name.as_str(), &c.distribution))
    }

    pub fn summary(&self) -> DriftSummary {
        DriftSummary::from_report(self)
    }
}

/// Roll-up of a [`DriftReport`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DriftSummary {
    pub drift_detected: bool,
    /// Largest divergence over all compared columns, 0 if none were compared.
    pub drift_score: f64,
    /// Drifted columns in report order.
    pub features_drifted: Vec<String>,
}

impl DriftSummary {
    pub fn from_report(report: &DriftReport) -> Self {
        let mut drift_score: f64 = 0.0;
        let mut features_drifted = Vec::new();
        for (name, metric) in report.metrics() {
            drift_score = drift_score.max(metric.divergence_score);
            if metric.drift_detected {
                features_drifted.push(name.to_owned());
            }
        }

        Self {
            drift_detected: !features_drifted.is_empty(),
            drift_score,
            features_drifted,
        }
    }
}
