use crate::error::DatasetError;
use crate::schema::CustomerRecord;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Type tag assigned to a column when a dataset is ingested.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

impl ColumnKind {
    pub fn of(dtype: &DataType) -> Self {
        if dtype.is_primitive_numeric() {
            Self::Numeric
        } else {
            Self::Categorical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Categorical => "categorical",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
}

/// An ordered set of rows sharing one column set.
///
/// Numeric columns keep their Polars dtype. Every other column is stored as a
/// string column and tagged [`ColumnKind::Categorical`]. Missing values are
/// Polars nulls.
#[derive(Clone, Debug)]
pub struct Dataset {
    frame: DataFrame,
    columns: Vec<ColumnSpec>,
}

impl Dataset {
    /// Wrap a frame, tagging each column as numeric or categorical.
    ///
    /// # Errors
    ///
    /// Returns an error if a non-numeric column cannot be cast to strings.
    pub fn from_frame(frame: DataFrame) -> Result<Self, DatasetError> {
        let mut frame = frame;
        let names: Vec<String> = frame
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let dtype = frame.column(&name)?.dtype().clone();
            let kind = ColumnKind::of(&dtype);
            if kind == ColumnKind::Categorical && dtype != DataType::String {
                let casted = frame.column(&name)?.cast(&DataType::String)?;
                frame.with_column(casted)?;
            }
            columns.push(ColumnSpec { name, kind });
        }

        Ok(Self { frame, columns })
    }

    /// Build a dataset holding the four prediction fields of each record.
    ///
    /// # Errors
    ///
    /// Returns an error if Polars rejects the assembled frame.
    pub fn from_records(records: &[CustomerRecord]) -> Result<Self, DatasetError> {
        let total_charges: Vec<f64> = records.iter().map(|r| r.total_charges).collect();
        let contract: Vec<&str> = records.iter().map(|r| r.contract.as_str()).collect();
        let phone_service: Vec<&str> = records.iter().map(|r| r.phone_service.as_str()).collect();
        let tenure: Vec<f64> = records.iter().map(|r| r.tenure).collect();

        let frame = DataFrame::new(vec![
            Column::new("TotalCharges".into(), total_charges),
            Column::new("Contract".into(), contract),
            Column::new("PhoneService".into(), phone_service),
            Column::new("tenure".into(), tenure),
        ])?;
        Self::from_frame(frame)
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn kind(&self, name: &str) -> Option<ColumnKind> {
        self.columns.iter().find(|c| c.name == name).map(|c| c.kind)
    }

    /// Values of a column as floats. NaN and infinities are reported as missing.
    ///
    /// Categorical columns are cast leniently, so unparsable strings also
    /// come back as `None`; callers that must reject them parse
    /// [`Dataset::categorical_values`] themselves.
    ///
    /// # Errors
    ///
    /// Returns an error if the column does not exist or cannot be cast.
    pub fn numeric_values(&self, name: &str) -> Result<Vec<Option<f64>>, DatasetError> {
        let series = self
            .frame
            .column(name)?
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        let ca = series.f64()?;
        Ok(ca
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect())
    }

    /// Values of a column rendered as strings.
    ///
    /// # Errors
    ///
    /// Returns an error if the column does not exist or cannot be cast.
    pub fn categorical_values(&self, name: &str) -> Result<Vec<Option<String>>, DatasetError> {
        let series = self
            .frame
            .column(name)?
            .as_materialized_series()
            .cast(&DataType::String)?;
        let ca = series.str()?;
        Ok(ca.into_iter().map(|v| v.map(str::to_owned)).collect())
    }
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used)]

    use super::*;
    use anyhow::Result;

    #[test]
    fn test_non_finite_numbers_read_as_missing() -> Result<()> {
        let ds = Dataset::from_frame(df!("x" => [1.0, f64::INFINITY, f64::NEG_INFINITY, f64::NAN])?)?;
        assert_eq!(ds.numeric_values("x")?, vec![Some(1.0), None, None, None]);
        Ok(())
    }

    #[test]
    fn test_kinds_fixed_at_ingestion() -> Result<()> {
        let df = df!(
            "tenure" => [1i64, 2, 3],
            "Contract" => ["One year", "Two year", "One year"],
            "Churned" => [true, false, true],
        )?;
        let ds = Dataset::from_frame(df)?;

        assert_eq!(ds.kind("tenure"), Some(ColumnKind::Numeric));
        assert_eq!(ds.kind("Contract"), Some(ColumnKind::Categorical));
        assert_eq!(ds.kind("Churned"), Some(ColumnKind::Categorical));
        assert_eq!(ds.kind("missing"), None);
        assert_eq!(
            ds.categorical_values("Churned")?,
            vec![
                Some("true".to_owned()),
                Some("false".to_owned()),
                Some("true".to_owned())
            ]
        );
        Ok(())
    }

    #[test]
    fn test_numeric_values_treat_nan_as_missing() -> Result<()> {
        let df = df!("x" => [Some(1.5), None, Some(f64::NAN)])?;
        let ds = Dataset::from_frame(df)?;
        assert_eq!(ds.numeric_values("x")?, vec![Some(1.5), None, None]);
        Ok(())
    }

    #[test]
    fn test_from_records() -> Result<()> {
        let record: CustomerRecord = serde_json::from_str(
            r#"{"TotalCharges": 2000, "Contract": "One year", "PhoneService": "Yes", "tenure": 24}"#,
        )?;
        let ds = Dataset::from_records(&[record])?;
        assert_eq!(ds.height(), 1);
        let names: Vec<&str> = ds.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["TotalCharges", "Contract", "PhoneService", "tenure"]);
        assert_eq!(ds.numeric_values("tenure")?.first().copied().unwrap(), Some(24.0));
        Ok(())
    }
}
