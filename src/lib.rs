//! # churnguard
//!
//! Customer churn scoring with data drift monitoring.
//!
//! ## Quick Start
//!
//! ```no_run
//! use churnguard::data::load_dataset;
//! use churnguard::model::{PredictionEngine, PredictionSummary};
//!
//! # fn main() -> anyhow::Result<()> {
//! let engine = PredictionEngine::default();
//! engine.load_model("models/model.json".as_ref())?;
//!
//! let customers = load_dataset("data/customers.csv".as_ref())?;
//! let labels = engine.predict(&customers)?;
//! let summary = PredictionSummary::from_labels(&labels);
//! println!("churn rate: {:.2}%", summary.churn_rate);
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Modules
//!
//! - [`schema`]: customer records and their field rules
//! - [`data`]: the typed [`Dataset`](data::Dataset) and CSV/JSON I/O
//! - [`features`]: cleanup and encoding into the classifier's feature matrix
//! - [`model`]: classifier artifacts and the [`PredictionEngine`](model::PredictionEngine)
//! - [`monitor`]: reference profiles, drift detection and report rendering
//! - [`api`]: request/response contract of the scoring endpoint
//! - [`batch`]: the drift-check-then-score batch flow
//! - [`config`], [`logging`], [`error`], [`utils`]: plumbing
//!
//! ## Column kinds
//!
//! Every dataset column is tagged [`Numeric`](data::ColumnKind::Numeric) or
//! [`Categorical`](data::ColumnKind::Categorical) when the dataset is built.
//! The transformer and the drift detector branch on that tag and never
//! inspect values to guess a type.

#![warn(clippy::all, rust_2018_idioms)]

pub mod api;
pub mod batch;
pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod logging;
pub mod model;
pub mod monitor;
pub mod schema;
pub mod utils;
