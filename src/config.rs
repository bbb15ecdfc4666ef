use crate::error::{ChurnError, Result};
use crate::features::TransformerConfig;
use crate::monitor::{DEFAULT_DRIFT_THRESHOLD, DivergencePolicy, ReportFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_MODEL_PATH: &str = "CHURNGUARD_MODEL_PATH";
pub const ENV_REFERENCE_PATH: &str = "CHURNGUARD_REFERENCE_PATH";
pub const ENV_REPORT_DIR: &str = "CHURNGUARD_REPORT_DIR";
pub const ENV_DRIFT_THRESHOLD: &str = "CHURNGUARD_DRIFT_THRESHOLD";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Classifier artifact (JSON).
    pub model_path: PathBuf,
    /// Reference dataset for drift monitoring. Monitoring is off when unset.
    pub reference_path: Option<PathBuf>,
    pub report_dir: PathBuf,
    pub report_format: ReportFormat,
    pub drift_threshold: f64,
    pub divergence_policy: DivergencePolicy,
    pub transformer: TransformerConfig,
    /// Where batch runs write their prediction table, if anywhere.
    pub predictions_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/model.json"),
            reference_path: Some(PathBuf::from("data/reference_data.csv")),
            report_dir: default_report_dir(),
            report_format: ReportFormat::Html,
            drift_threshold: DEFAULT_DRIFT_THRESHOLD,
            divergence_policy: DivergencePolicy::default(),
            transformer: TransformerConfig::default(),
            predictions_path: None,
        }
    }
}

fn base_dir(root: Option<PathBuf>) -> PathBuf {
    root.unwrap_or_else(|| PathBuf::from(".")).join("churnguard")
}

fn default_report_dir() -> PathBuf {
    base_dir(dirs::data_dir()).join("reports")
}

pub fn get_config_path() -> PathBuf {
    base_dir(dirs::config_dir()).join("config.json")
}

impl PipelineConfig {
    /// Load from `path`, or from [`get_config_path`] when `None`, then apply
    /// environment overrides. A missing file at the default location yields
    /// the defaults; a missing explicit file is an error.
    ///
    /// # Errors
    ///
    /// [`ChurnError::Config`] if the file cannot be read or parsed, or an
    /// override or the resulting settings are invalid.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (get_config_path(), false),
        };

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                ChurnError::Config(format!("cannot read {}: {e}", path.display()))
            })?;
            serde_json::from_str::<Self>(&content).map_err(|e| {
                ChurnError::Config(format!("invalid config {}: {e}", path.display()))
            })?
        } else if explicit {
            return Err(ChurnError::Config(format!(
                "config file {} does not exist",
                path.display()
            )));
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `CHURNGUARD_*` overrides looked up through `lookup`.
    ///
    /// # Errors
    ///
    /// [`ChurnError::Config`] if the threshold override is not a number.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = lookup(ENV_MODEL_PATH) {
            self.model_path = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_REFERENCE_PATH) {
            self.reference_path = if v.is_empty() {
                None
            } else {
                Some(PathBuf::from(v))
            };
        }
        if let Some(v) = lookup(ENV_REPORT_DIR) {
            self.report_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_DRIFT_THRESHOLD) {
            self.drift_threshold = v.trim().parse().map_err(|e| {
                ChurnError::Config(format!("{ENV_DRIFT_THRESHOLD}={v}: {e}"))
            })?;
        }
        Ok(())
    }

    /// # Errors
    ///
    /// [`ChurnError::Config`] for a negative or non-finite threshold or fill value.
    pub fn validate(&self) -> Result<()> {
        if !self.drift_threshold.is_finite() || self.drift_threshold < 0.0 {
            return Err(ChurnError::Config(format!(
                "drift threshold must be a non-negative number, got {}",
                self.drift_threshold
            )));
        }
        if !self.transformer.total_charges_fill.is_finite() {
            return Err(ChurnError::Config(
                "TotalCharges fill value must be finite".to_owned(),
            ));
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        crate::utils::write_atomic(path, content.as_bytes())?;
        Ok(())
    }
}
