//! Request/response contract of the scoring endpoint, without a transport.
//!
//! A host (HTTP server, queue consumer, the CLI) builds one
//! [`PredictionEngine`] at startup and hands it to [`handle_prediction`] for
//! every request.

use crate::data::Dataset;
use crate::model::{PredictionEngine, churn_status};
use crate::schema::CustomerRecord;
use serde::{Deserialize, Serialize};

pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

/// The four scoring fields. Absent fields default to `0` or the empty
/// string and are then caught by validation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionRequest {
    #[serde(rename = "TotalCharges")]
    pub total_charges: f64,
    #[serde(rename = "Contract")]
    pub contract: String,
    #[serde(rename = "PhoneService")]
    pub phone_service: String,
    pub tenure: f64,
}

impl From<PredictionRequest> for CustomerRecord {
    fn from(req: PredictionRequest) -> Self {
        Self::new(req.total_charges, req.contract, req.phone_service, req.tenure)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: i64,
    pub churn_status: String,
}

/// Error body plus the status code a transport should answer with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{status}: {error}")]
pub struct ApiError {
    #[serde(skip)]
    pub status: u16,
    pub error: String,
}

impl ApiError {
    pub fn bad_request(error: impl Into<String>) -> Self {
        Self {
            status: STATUS_BAD_REQUEST,
            error: error.into(),
        }
    }

    pub fn internal(error: impl Into<String>) -> Self {
        Self {
            status: STATUS_INTERNAL_ERROR,
            error: error.into(),
        }
    }
}

/// Validate and score one customer.
///
/// # Errors
///
/// A 400 [`ApiError`] if the record fails validation, a 500 one if the
/// engine cannot produce a label.
pub fn handle_prediction(
    engine: &PredictionEngine,
    request: PredictionRequest,
) -> Result<PredictionResponse, ApiError> {
    let record = CustomerRecord::from(request);
    tracing::info!(
        contract = %record.contract,
        phone_service = %record.phone_service,
        "Received prediction request"
    );

    if let Err(e) = record.validate() {
        tracing::warn!(error = %e, "Invalid data received");
        return Err(ApiError::bad_request(e.to_string()));
    }

    let labels = Dataset::from_records(std::slice::from_ref(&record))
        .map_err(|e| e.to_string())
        .and_then(|ds| engine.predict(&ds).map_err(|e| e.to_string()))
        .map_err(|e| {
            tracing::error!(error = %e, "Error during prediction");
            ApiError::internal(e)
        })?;

    let prediction = labels
        .first()
        .copied()
        .ok_or_else(|| ApiError::internal("no prediction produced"))?;

    tracing::info!(prediction, "Prediction made successfully");
    Ok(PredictionResponse {
        prediction,
        churn_status: churn_status(prediction).to_owned(),
    })
}

/// [`handle_prediction`] over a JSON body. Returns the status code and the
/// JSON response body.
pub fn handle_prediction_json(engine: &PredictionEngine, body: &str) -> (u16, String) {
    let outcome = serde_json::from_str::<PredictionRequest>(body)
        .map_err(|e| ApiError::bad_request(format!("invalid request body: {e}")))
        .and_then(|request| handle_prediction(engine, request));

    let (status, rendered) = match outcome {
        Ok(response) => (200, serde_json::to_string(&response)),
        Err(err) => (err.status, serde_json::to_string(&err)),
    };
    match rendered {
        Ok(body) => (status, body),
        Err(e) => (
            STATUS_INTERNAL_ERROR,
            format!(r#"{{"error":"failed to encode response: {e}"}}"#),
        ),
    }
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used)]

    use super::*;
    use crate::features::FeatureTransformer;
    use crate::model::artifact::testing::month_to_month_tree;

    // Churn iff month-to-month.
    fn engine() -> PredictionEngine {
        PredictionEngine::with_classifier(
            FeatureTransformer::default(),
            Box::new(month_to_month_tree()),
        )
    }

    fn request(contract: &str) -> PredictionRequest {
        PredictionRequest {
            total_charges: 1500.0,
            contract: contract.to_owned(),
            phone_service: "Yes".to_owned(),
            tenure: 6.0,
        }
    }

    #[test]
    fn test_churn_response() {
        let response = handle_prediction(&engine(), request("Month-to-month")).unwrap();
        assert_eq!(response.prediction, 1);
        assert_eq!(response.churn_status, "Churn");

        let response = handle_prediction(&engine(), request("Two year")).unwrap();
        assert_eq!(response.churn_status, "No Churn");
    }

    #[test]
    fn test_validation_failure_is_400() {
        let err = handle_prediction(&engine(), request("Quarterly")).unwrap_err();
        assert_eq!(err.status, STATUS_BAD_REQUEST);
        assert_eq!(
            err.error,
            "Contract must be one of: Month-to-month, One year, Two year"
        );
    }

    #[test]
    fn test_unloaded_engine_is_500() {
        let err = handle_prediction(&PredictionEngine::default(), request("One year")).unwrap_err();
        assert_eq!(err.status, STATUS_INTERNAL_ERROR);
        assert!(err.error.contains("Model not loaded"));
    }

    #[test]
    fn test_json_round() {
        let (status, body) = handle_prediction_json(
            &engine(),
            r#"{"TotalCharges": 2000, "Contract": "One year", "PhoneService": "Yes", "tenure": 24}"#,
        );
        assert_eq!(status, 200);
        assert_eq!(body, r#"{"prediction":0,"churn_status":"No Churn"}"#);
    }

    #[test]
    fn test_json_missing_field_fails_validation() {
        let (status, body) =
            handle_prediction_json(&engine(), r#"{"TotalCharges": 10, "Contract": "One year"}"#);
        assert_eq!(status, STATUS_BAD_REQUEST);
        assert!(body.contains("PhoneService must be one of"));
    }

    #[test]
    fn test_json_garbage_is_400() {
        let (status, body) = handle_prediction_json(&engine(), "not json");
        assert_eq!(status, STATUS_BAD_REQUEST);
        assert!(body.starts_with(r#"{"error":"invalid request body"#));
    }
}
