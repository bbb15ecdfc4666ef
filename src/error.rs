//! Centralized error handling for churnguard.
//!
//! Each pipeline stage has its own error enum so callers can match on the
//! failure they care about:
//!
//! - [`ValidationError`]: a request record violates the field rules. Recoverable.
//! - [`TransformError`]: the feature transformer cannot proceed on a batch.
//! - [`LoadError`] / [`PredictError`]: the classifier is missing or unusable.
//! - [`ReferenceLoadError`]: drift monitoring cannot start. Prediction is unaffected.
//! - [`RenderError`]: a drift report could not be written.
//! - [`DatasetError`]: reading, writing or profiling a tabular dataset failed.
//!
//! All of them convert into [`ChurnError`] so the `?` operator works across
//! stage boundaries:
//!
//! ```no_run
//! use churnguard::error::{ChurnError, Result};
//! use churnguard::data::io::load_dataset;
//!
//! fn row_count(path: &str) -> Result<usize> {
//!     // DatasetError converts into ChurnError via From
//!     let dataset = load_dataset(path.as_ref())?;
//!     Ok(dataset.height())
//! }
//! ```
//!
//! The [`ResultExt`] trait adds `.context()` to any result whose error
//! converts into [`ChurnError`].

use std::fmt;
use std::path::PathBuf;

/// Record-level validation failure. The first failing rule wins.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must be one of: {}", .allowed.join(", "))]
    InvalidEnum {
        field: &'static str,
        allowed: &'static [&'static str],
    },

    #[error("{field} cannot be negative")]
    OutOfRange { field: &'static str },
}

impl ValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidEnum { field, .. } | Self::OutOfRange { field } => field,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// A required raw column is absent. Reported before any cleanup runs.
    #[error("required column '{0}' is missing from the dataset")]
    MissingColumn(String),

    #[error("malformed value in column '{column}': {detail}")]
    MalformedValue { column: String, detail: String },

    #[error("frame operation failed: {0}")]
    Frame(#[from] polars::error::PolarsError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

impl TransformError {
    pub(crate) fn malformed(column: &str, detail: impl Into<String>) -> Self {
        Self::MalformedValue {
            column: column.to_owned(),
            detail: detail.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("model artifact not found at {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read model artifact {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("model artifact {} is corrupt: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("model artifact is incompatible: {0}")]
    Incompatible(String),

    #[error("a model has already been loaded into this engine")]
    AlreadyLoaded,
}

#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("Model not loaded. Please load the model first using load_model()")]
    ModelNotLoaded,

    #[error(transparent)]
    Transform(#[from] TransformError),

    /// The classifier rejected the feature matrix (shape or index mismatch).
    #[error("classifier failed: {0}")]
    Inference(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ReferenceLoadError {
    #[error("reference dataset {} could not be read: {reason}", .path.display())]
    Unreadable { path: PathBuf, reason: String },

    #[error("reference dataset is empty")]
    Empty,

    #[error("reference profile could not be built: {0}")]
    Profile(#[from] DatasetError),
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to serialize drift report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write report to {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("unsupported file extension: {0}")]
    UnsupportedFormat(String),

    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Polars(#[from] polars::error::PolarsError),
}

/// Main error type for churnguard operations.
#[derive(Debug)]
pub enum ChurnError {
    Io(std::io::Error),

    Validation(ValidationError),

    Transform(TransformError),

    Load(LoadError),

    Predict(PredictError),

    Reference(ReferenceLoadError),

    Render(RenderError),

    Dataset(DatasetError),

    /// Configuration file or override problems
    Config(String),

    /// Generic error with context
    Other(String),
}

impl fmt::Display for ChurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Validation(e) => write!(f, "Validation error: {e}"),
            Self::Transform(e) => write!(f, "Transformation error: {e}"),
            Self::Load(e) => write!(f, "Model load error: {e}"),
            Self::Predict(e) => write!(f, "Prediction error: {e}"),
            Self::Reference(e) => write!(f, "Drift reference error: {e}"),
            Self::Render(e) => write!(f, "Report error: {e}"),
            Self::Dataset(e) => write!(f, "Data processing error: {e}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ChurnError {}

impl From<std::io::Error> for ChurnError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ValidationError> for ChurnError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<TransformError> for ChurnError {
    fn from(err: TransformError) -> Self {
        Self::Transform(err)
    }
}

impl From<LoadError> for ChurnError {
    fn from(err: LoadError) -> Self {
        Self::Load(err)
    }
}

impl From<PredictError> for ChurnError {
    fn from(err: PredictError) -> Self {
        Self::Predict(err)
    }
}

impl From<ReferenceLoadError> for ChurnError {
    fn from(err: ReferenceLoadError) -> Self {
        Self::Reference(err)
    }
}

impl From<RenderError> for ChurnError {
    fn from(err: RenderError) -> Self {
        Self::Render(err)
    }
}

impl From<DatasetError> for ChurnError {
    fn from(err: DatasetError) -> Self {
        Self::Dataset(err)
    }
}

impl From<polars::error::PolarsError> for ChurnError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::Dataset(DatasetError::Polars(err))
    }
}

impl From<serde_json::Error> for ChurnError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

/// Result type alias for churnguard operations.
pub type Result<T> = std::result::Result<T, ChurnError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<ChurnError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err: ChurnError = e.into();
            ChurnError::Other(format!("{}: {}", msg.into(), err))
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err: ChurnError = e.into();
            ChurnError::Other(format!("{}: {}", f(), err))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        let err = ValidationError::InvalidEnum {
            field: "Contract",
            allowed: &["Month-to-month", "One year", "Two year"],
        };
        assert_eq!(
            err.to_string(),
            "Contract must be one of: Month-to-month, One year, Two year"
        );
        assert_eq!(err.field(), "Contract");

        let err = ValidationError::OutOfRange { field: "tenure" };
        assert_eq!(err.to_string(), "tenure cannot be negative");
    }

    #[test]
    fn test_error_display() {
        let err: ChurnError = TransformError::MissingColumn("PhoneService".to_owned()).into();
        assert_eq!(
            err.to_string(),
            "Transformation error: required column 'PhoneService' is missing from the dataset"
        );
    }

    #[test]
    fn test_predict_error_wraps_transform() {
        let err: PredictError = TransformError::malformed("tenure", "not a number").into();
        assert!(matches!(
            err,
            PredictError::Transform(TransformError::MalformedValue { .. })
        ));
    }

    #[test]
    fn test_result_context() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "model.json",
        ));

        let result: Result<()> = result.context("Failed to read model");
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read model")
        );
    }
}
