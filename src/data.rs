//! Tabular data handling.
//!
//! [`Dataset`] wraps a Polars `DataFrame` and fixes a [`ColumnKind`] tag for
//! every column at ingestion, so downstream stages branch on the tag instead
//! of inspecting values. The [`io`] module reads and writes datasets on disk.

pub mod dataset;
pub mod io;

pub use dataset::{ColumnKind, ColumnSpec, Dataset};
pub use io::{load_dataset, save_dataset, write_predictions};
