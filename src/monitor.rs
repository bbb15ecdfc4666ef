//! Data drift monitoring.
//!
//! A [`DriftDetector`] profiles a reference dataset once and scores later
//! datasets against it column by column:
//!
//! ```no_run
//! use churnguard::monitor::{DriftDetector, ReportFormat, render};
//! # fn main() -> anyhow::Result<()> {
//! let current = churnguard::data::load_dataset("current.csv".as_ref())?;
//! let detector = DriftDetector::from_path("reference.csv".as_ref())?;
//! let report = detector.detect_drift(&current, None)?;
//! let summary = report.summary();
//! render(&summary, &report, ReportFormat::Html)?.persist("reports".as_ref())?;
//! # Ok(())
//! # }
//! ```

pub mod detector;
pub mod profile;
pub mod renderer;
pub mod report;
pub mod synth;

pub use detector::{DEFAULT_DRIFT_THRESHOLD, DivergencePolicy, DriftDetector};
pub use profile::{ColumnProfile, DatasetProfile};
pub use renderer::{Artifact, ReportFormat, render};
pub use report::{DriftMetric, DriftReport, DriftSummary};
