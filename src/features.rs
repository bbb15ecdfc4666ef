//! Feature engineering for the churn classifier.
//!
//! [`FeatureTransformer::transform`] cleans the four raw prediction columns
//! and adds one indicator column per contract type;
//! [`FeatureTransformer::select_features`] then projects the result onto the
//! fixed [`FEATURE_COLUMNS`] order the classifier was trained on. Both steps
//! are deterministic and keep the row order of the input.
//!
//! Cleanup rules:
//!
//! | Column         | Missing value                         | Encoding                    |
//! |----------------|---------------------------------------|-----------------------------|
//! | `TotalCharges` | frozen training mean (2279)           | float                       |
//! | `Contract`     | see [`MissingContractPolicy`]         | three 0/1 indicator columns |
//! | `PhoneService` | `No`                                  | `Yes` → 1, `No` → 0         |
//! | `tenure`       | mean of the observed values in batch  | float                       |

use crate::data::{ColumnKind, Dataset};
use crate::error::TransformError;
use crate::schema::{Contract, PhoneService};
use ndarray::{Array2, ArrayView2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Mean `TotalCharges` of the training set. Not recomputed per batch.
pub const TOTAL_CHARGES_FILL: f64 = 2279.0;

pub const REQUIRED_COLUMNS: [&str; 4] = ["TotalCharges", "Contract", "PhoneService", "tenure"];

/// Column order of the feature matrix. The classifier depends on it.
pub const FEATURE_COLUMNS: [&str; 6] = [
    "TotalCharges",
    "Month-to-month",
    "One year",
    "Two year",
    "PhoneService",
    "tenure",
];

/// What to do with rows whose `Contract` is missing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingContractPolicy {
    /// Keep the row; all three contract indicators are 0.
    #[default]
    ZeroEncode,
    /// Remove the row before encoding. The output has fewer rows than the input.
    DropRows,
    /// Fail the batch with [`TransformError::MalformedValue`].
    Reject,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformerConfig {
    pub total_charges_fill: f64,
    pub missing_contract: MissingContractPolicy,
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            total_charges_fill: TOTAL_CHARGES_FILL,
            missing_contract: MissingContractPolicy::default(),
        }
    }
}

/// Numeric features, one row per record, columns in [`FEATURE_COLUMNS`] order.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureMatrix {
    values: Array2<f64>,
    /// Input row each matrix row came from.
    row_ids: Vec<usize>,
}

impl FeatureMatrix {
    pub fn columns(&self) -> &'static [&'static str] {
        &FEATURE_COLUMNS
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.values.nrows() == 0
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    pub fn row(&self, index: usize) -> Option<Vec<f64>> {
        (index < self.values.nrows()).then(|| self.values.row(index).to_vec())
    }

    /// 0-based input row of every matrix row. Differs from `0..nrows` only
    /// when rows were dropped during the transform.
    pub fn row_ids(&self) -> &[usize] {
        &self.row_ids
    }
}

#[derive(Clone, Debug, Default)]
pub struct FeatureTransformer {
    config: TransformerConfig,
}

impl FeatureTransformer {
    pub fn new(config: TransformerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransformerConfig {
        &self.config
    }

    /// Clean the raw prediction columns and add the contract indicators.
    ///
    /// Columns other than the four prediction fields are passed through
    /// untouched.
    ///
    /// # Errors
    ///
    /// [`TransformError::MissingColumn`] if a required column is absent (checked
    /// before any cleanup), [`TransformError::MalformedValue`] if a value is
    /// outside its column's domain.
    pub fn transform(&self, dataset: &Dataset) -> Result<Dataset, TransformError> {
        self.transform_rows(dataset).map(|(transformed, _)| transformed)
    }

    /// The transformed dataset and the input row behind each of its rows.
    fn transform_rows(&self, dataset: &Dataset) -> Result<(Dataset, Vec<usize>), TransformError> {
        tracing::info!(
            rows = dataset.height(),
            columns = dataset.columns().len(),
            "Starting data transformation"
        );

        for name in REQUIRED_COLUMNS {
            if !dataset.contains(name) {
                return Err(TransformError::MissingColumn(name.to_owned()));
            }
        }

        tracing::debug!("Handling missing values in TotalCharges");
        let fill = self.config.total_charges_fill;
        let total_charges: Vec<f64> = parse_numeric(dataset, "TotalCharges")?
            .into_iter()
            .map(|v| v.unwrap_or(fill))
            .collect();

        tracing::debug!("Handling Contract column");
        let contracts = parse_contracts(dataset)?;
        let keep = self.contract_row_mask(&contracts)?;

        tracing::debug!("Converting PhoneService to binary");
        let phone_service = encode_phone_service(dataset)?;

        let tenure = parse_numeric(dataset, "tenure")?;

        let (mut frame, row_ids, total_charges, contracts, phone_service, tenure) = match keep {
            Some(mask) => {
                let dropped = mask.iter().filter(|k| !**k).count();
                tracing::warn!(dropped, "Dropping rows with missing Contract");
                let frame = dataset
                    .frame()
                    .filter(&BooleanChunked::from_slice("keep".into(), &mask))?;
                (
                    frame,
                    retain((0..mask.len()).collect::<Vec<usize>>(), &mask),
                    retain(total_charges, &mask),
                    retain(contracts, &mask),
                    retain(phone_service, &mask),
                    retain(tenure, &mask),
                )
            }
            None => (
                dataset.frame().clone(),
                (0..dataset.height()).collect::<Vec<usize>>(),
                total_charges,
                contracts,
                phone_service,
                tenure,
            ),
        };

        tracing::debug!("Handling tenure column");
        let tenure = impute_batch_mean("tenure", tenure)?;

        frame.with_column(Column::new("TotalCharges".into(), total_charges))?;
        frame.with_column(Column::new("PhoneService".into(), phone_service))?;
        frame.with_column(Column::new("tenure".into(), tenure))?;

        tracing::debug!("Creating indicator columns for Contract");
        for contract in Contract::ALL {
            let indicator: Vec<i32> = contracts
                .iter()
                .map(|c| i32::from(*c == Some(contract)))
                .collect();
            frame.with_column(Column::new(contract.as_str().into(), indicator))?;
        }

        tracing::info!(
            rows = frame.height(),
            columns = frame.width(),
            "Data transformation completed"
        );
        Ok((Dataset::from_frame(frame)?, row_ids))
    }

    /// Project a transformed dataset onto [`FEATURE_COLUMNS`].
    ///
    /// # Errors
    ///
    /// [`TransformError::MissingColumn`] if a feature column is absent,
    /// [`TransformError::MalformedValue`] if one is not numeric or still holds
    /// missing values.
    pub fn select_features(&self, dataset: &Dataset) -> Result<FeatureMatrix, TransformError> {
        let row_ids = (0..dataset.height()).collect();
        self.select_rows(dataset, row_ids)
    }

    fn select_rows(
        &self,
        dataset: &Dataset,
        row_ids: Vec<usize>,
    ) -> Result<FeatureMatrix, TransformError> {
        for name in FEATURE_COLUMNS {
            match dataset.kind(name) {
                None => return Err(TransformError::MissingColumn(name.to_owned())),
                Some(ColumnKind::Categorical) => {
                    return Err(TransformError::malformed(name, "expected a numeric column"));
                }
                Some(ColumnKind::Numeric) => {}
            }

            if let Some(row) = dataset.numeric_values(name)?.iter().position(Option::is_none) {
                return Err(TransformError::malformed(
                    name,
                    format!("row {row}: missing after cleanup"),
                ));
            }
        }

        let values = dataset
            .frame()
            .select(FEATURE_COLUMNS)?
            .to_ndarray::<Float64Type>(IndexOrder::C)?;
        tracing::debug!(rows = values.nrows(), "Features selected");
        Ok(FeatureMatrix { values, row_ids })
    }

    /// [`transform`](Self::transform) followed by [`select_features`](Self::select_features).
    ///
    /// # Errors
    ///
    /// See both steps.
    pub fn features(&self, dataset: &Dataset) -> Result<FeatureMatrix, TransformError> {
        let (transformed, row_ids) = self.transform_rows(dataset)?;
        self.select_rows(&transformed, row_ids)
    }

    /// `Some(mask)` when rows must be dropped, `None` when every row is kept.
    fn contract_row_mask(
        &self,
        contracts: &[Option<Contract>],
    ) -> Result<Option<Vec<bool>>, TransformError> {
        let missing = contracts.iter().position(Option::is_none);
        let Some(first_missing) = missing else {
            return Ok(None);
        };

        match self.config.missing_contract {
            MissingContractPolicy::ZeroEncode => Ok(None),
            MissingContractPolicy::DropRows => {
                Ok(Some(contracts.iter().map(Option::is_some).collect()))
            }
            MissingContractPolicy::Reject => Err(TransformError::malformed(
                "Contract",
                format!("row {first_missing}: value is missing"),
            )),
        }
    }
}

fn retain<T>(values: Vec<T>, mask: &[bool]) -> Vec<T> {
    values
        .into_iter()
        .zip(mask)
        .filter_map(|(v, keep)| keep.then_some(v))
        .collect()
}

/// Read a column as numbers. Blank strings, NaN and infinities count as
/// missing; any other unparsable token is an error.
fn parse_numeric(dataset: &Dataset, column: &str) -> Result<Vec<Option<f64>>, TransformError> {
    if dataset.kind(column) == Some(ColumnKind::Numeric) {
        return Ok(dataset.numeric_values(column)?);
    }

    dataset
        .categorical_values(column)?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            let Some(raw) = v else {
                return Ok(None);
            };
            let token = raw.trim();
            if token.is_empty() {
                return Ok(None);
            }
            token
                .parse::<f64>()
                .map(|x| x.is_finite().then_some(x))
                .map_err(|e| {
                    TransformError::malformed(column, format!("row {row}: '{raw}' ({e})"))
                })
        })
        .collect()
}

fn parse_contracts(dataset: &Dataset) -> Result<Vec<Option<Contract>>, TransformError> {
    dataset
        .categorical_values("Contract")?
        .into_iter()
        .enumerate()
        .map(|(row, v)| match v {
            None => Ok(None),
            Some(s) => Contract::parse(&s).map(Some).ok_or_else(|| {
                TransformError::malformed("Contract", format!("row {row}: unknown value '{s}'"))
            }),
        })
        .collect()
}

/// Missing values become `No`. Columns already holding 0/1 indicators are
/// accepted so the transformer can run over its own output.
fn encode_phone_service(dataset: &Dataset) -> Result<Vec<i32>, TransformError> {
    let malformed = |row: usize, value: &dyn std::fmt::Display| {
        TransformError::malformed(
            "PhoneService",
            format!("row {row}: unexpected value '{value}'"),
        )
    };

    if dataset.kind("PhoneService") == Some(ColumnKind::Numeric) {
        return dataset
            .numeric_values("PhoneService")?
            .into_iter()
            .enumerate()
            .map(|(row, v)| match v {
                None => Ok(PhoneService::No.indicator()),
                Some(x) if x == 0.0 => Ok(0),
                Some(x) if x == 1.0 => Ok(1),
                Some(x) => Err(malformed(row, &x)),
            })
            .collect();
    }

    dataset
        .categorical_values("PhoneService")?
        .into_iter()
        .enumerate()
        .map(|(row, v)| match v {
            None => Ok(PhoneService::No.indicator()),
            Some(s) => PhoneService::parse(&s)
                .map(|p| p.indicator())
                .ok_or_else(|| malformed(row, &s)),
        })
        .collect()
}

fn impute_batch_mean(column: &str, values: Vec<Option<f64>>) -> Result<Vec<f64>, TransformError> {
    let ca = Float64Chunked::from_iter_options(column.into(), values.into_iter());
    if ca.null_count() == 0 {
        return Ok(ca.into_no_null_iter().collect());
    }

    let Some(mean) = ca.mean() else {
        return Err(TransformError::malformed(
            column,
            "no observed values to impute the batch mean from",
        ));
    };
    tracing::debug!(column, mean, missing = ca.null_count(), "Imputing batch mean");
    Ok(ca.into_iter().map(|v| v.unwrap_or(mean)).collect())
}
