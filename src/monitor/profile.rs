//! Per-column summaries used for drift comparison.
//!
//! Numeric columns keep the moments and a quantile sketch; categorical
//! columns keep the share of each observed value. Values are sorted before
//! aggregating, so a profile does not depend on row order.

use crate::data::{ColumnKind, Dataset};
use crate::error::DatasetError;
use indexmap::IndexMap;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of points in the quantile sketch (0.00, 0.05, …, 1.00).
pub const QUANTILE_POINTS: usize = 21;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NumericProfile {
    pub count: usize,
    pub null_count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation (ddof = 1).
    pub std_dev: Option<f64>,
    /// Empty when the column has no observed values.
    pub quantiles: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoricalProfile {
    pub count: usize,
    pub null_count: usize,
    /// Share of each value among the non-missing rows.
    pub frequencies: BTreeMap<String, f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ColumnProfile {
    Numeric(NumericProfile),
    Categorical(CategoricalProfile),
}

impl ColumnProfile {
    pub fn kind(&self) -> ColumnKind {
        match self {
            Self::Numeric(_) => ColumnKind::Numeric,
            Self::Categorical(_) => ColumnKind::Categorical,
        }
    }
}

/// Column profiles of one dataset, in the dataset's column order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    row_count: usize,
    columns: IndexMap<String, ColumnProfile>,
}

impl DatasetProfile {
    /// # Errors
    ///
    /// Returns an error if a column cannot be read or aggregated.
    pub fn build(dataset: &Dataset) -> Result<Self, DatasetError> {
        let mut columns = IndexMap::with_capacity(dataset.columns().len());
        for spec in dataset.columns() {
            let profile = profile_column(dataset, &spec.name, spec.kind)?;
            columns.insert(spec.name.clone(), profile);
        }

        Ok(Self {
            row_count: dataset.height(),
            columns,
        })
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.get(name)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &ColumnProfile)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Profile one column as `kind`, whatever kind the dataset tagged it with.
///
/// Reading a categorical column as numeric is lenient: tokens that do not
/// parse, blanks included, count as missing.
///
/// # Errors
///
/// Returns an error if the column does not exist or cannot be aggregated.
pub fn profile_column(
    dataset: &Dataset,
    name: &str,
    kind: ColumnKind,
) -> Result<ColumnProfile, DatasetError> {
    Ok(match kind {
        ColumnKind::Numeric => {
            ColumnProfile::Numeric(profile_numeric(name, &dataset.numeric_values(name)?)?)
        }
        ColumnKind::Categorical => {
            ColumnProfile::Categorical(profile_categorical(&dataset.categorical_values(name)?))
        }
    })
}

/// Non-finite values are treated as missing.
///
/// # Errors
///
/// Returns an error if Polars fails to compute a quantile.
pub fn profile_numeric(name: &str, values: &[Option<f64>]) -> PolarsResult<NumericProfile> {
    let mut observed: Vec<f64> = values
        .iter()
        .flatten()
        .copied()
        .filter(|x| x.is_finite())
        .collect();
    observed.sort_by(f64::total_cmp);
    let null_count = values.len() - observed.len();

    let ca = Float64Chunked::from_vec(name.into(), observed);
    let mean = ca.mean();
    let std_dev = ca.std(1).filter(|s| s.is_finite());

    let mut quantiles = Vec::with_capacity(QUANTILE_POINTS);
    if !ca.is_empty() {
        for i in 0..QUANTILE_POINTS {
            let p = i as f64 / (QUANTILE_POINTS - 1) as f64;
            if let Some(q) = ca.quantile(p, QuantileMethod::Linear)? {
                quantiles.push(q);
            }
        }
    }

    Ok(NumericProfile {
        count: values.len(),
        null_count,
        mean,
        std_dev,
        quantiles,
    })
}

pub fn profile_categorical(values: &[Option<String>]) -> CategoricalProfile {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut observed = 0usize;
    for value in values.iter().flatten() {
        *counts.entry(value.clone()).or_insert(0) += 1;
        observed += 1;
    }

    let frequencies = counts
        .into_iter()
        .map(|(k, n)| (k, n as f64 / observed as f64))
        .collect();

    CategoricalProfile {
        count: values.len(),
        null_count: values.len() - observed,
        frequencies,
    }
}
