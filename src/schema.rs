//! Accepted customer record shape and its field rules.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const CONTRACT_VALUES: [&str; 3] = ["Month-to-month", "One year", "Two year"];
pub const PHONE_SERVICE_VALUES: [&str; 2] = ["Yes", "No"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Contract {
    #[serde(rename = "Month-to-month")]
    MonthToMonth,
    #[serde(rename = "One year")]
    OneYear,
    #[serde(rename = "Two year")]
    TwoYear,
}

impl Contract {
    /// All contract types, in feature-column order.
    pub const ALL: [Self; 3] = [Self::MonthToMonth, Self::OneYear, Self::TwoYear];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Month-to-month" => Some(Self::MonthToMonth),
            "One year" => Some(Self::OneYear),
            "Two year" => Some(Self::TwoYear),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MonthToMonth => "Month-to-month",
            Self::OneYear => "One year",
            Self::TwoYear => "Two year",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhoneService {
    Yes,
    No,
}

impl PhoneService {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Yes" => Some(Self::Yes),
            "No" => Some(Self::No),
            _ => None,
        }
    }

    pub fn indicator(&self) -> i32 {
        match self {
            Self::Yes => 1,
            Self::No => 0,
        }
    }
}

/// One customer as submitted for scoring.
///
/// Fields other than the four used for prediction are kept in `extra` and
/// otherwise ignored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    #[serde(rename = "TotalCharges")]
    pub total_charges: f64,
    #[serde(rename = "Contract")]
    pub contract: String,
    #[serde(rename = "PhoneService")]
    pub phone_service: String,
    pub tenure: f64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl CustomerRecord {
    pub fn new(
        total_charges: f64,
        contract: impl Into<String>,
        phone_service: impl Into<String>,
        tenure: f64,
    ) -> Self {
        Self {
            total_charges,
            contract: contract.into(),
            phone_service: phone_service.into(),
            tenure,
            extra: BTreeMap::new(),
        }
    }

    /// See [`validate`].
    ///
    /// # Errors
    ///
    /// Returns the first rule the record breaks.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate(self)
    }
}

/// Checks Contract, PhoneService, TotalCharges and tenure in that order and
/// reports the first violation.
///
/// # Errors
///
/// [`ValidationError::InvalidEnum`] for an unknown Contract or PhoneService,
/// [`ValidationError::OutOfRange`] for a negative (or NaN) TotalCharges or tenure.
pub fn validate(record: &CustomerRecord) -> Result<(), ValidationError> {
    if Contract::parse(&record.contract).is_none() {
        return Err(ValidationError::InvalidEnum {
            field: "Contract",
            allowed: &CONTRACT_VALUES,
        });
    }
    if PhoneService::parse(&record.phone_service).is_none() {
        return Err(ValidationError::InvalidEnum {
            field: "PhoneService",
            allowed: &PHONE_SERVICE_VALUES,
        });
    }
    if !is_non_negative(record.total_charges) {
        return Err(ValidationError::OutOfRange {
            field: "TotalCharges",
        });
    }
    if !is_non_negative(record.tenure) {
        return Err(ValidationError::OutOfRange { field: "tenure" });
    }
    Ok(())
}

// NaN compares false, so it is rejected here as well.
fn is_non_negative(v: f64) -> bool {
    v >= 0.0
}
