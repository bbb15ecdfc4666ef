//! Synthetic customer data with a controllable share of drifted rows.
//!
//! Drifted rows lean towards long contracts, longer tenure, higher monthly
//! charges, more streaming, more phone service, more paperless billing and
//! more female customers. Useful for exercising the drift monitor end to end.

use crate::data::Dataset;
use crate::error::DatasetError;
use polars::prelude::*;
use rand::distributions::Distribution as _;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use statrs::distribution::Normal;

pub const DEFAULT_SEED: u64 = 42;

/// A normal distribution clipped to `[min, max]`.
struct Clipped {
    normal: Normal,
    min: f64,
    max: f64,
}

impl Clipped {
    fn new(mean: f64, std_dev: f64, min: f64, max: f64) -> Result<Self, DatasetError> {
        let normal = Normal::new(mean, std_dev)
            .map_err(|e| DatasetError::InvalidParameter(format!("normal({mean}, {std_dev}): {e}")))?;
        Ok(Self { normal, min, max })
    }

    fn sample(&self, rng: &mut StdRng) -> f64 {
        self.normal.sample(rng).clamp(self.min, self.max)
    }
}

fn pick<'a>(rng: &mut StdRng, options: &[&'a str]) -> &'a str {
    options[rng.gen_range(0..options.len())]
}

/// Generate `n` customers; each row is drifted with probability
/// `drift_factor`. The same seed always yields the same dataset.
///
/// # Errors
///
/// [`DatasetError::InvalidParameter`] if `drift_factor` is outside `[0, 1]`.
pub fn generate_customers(n: usize, drift_factor: f64, seed: u64) -> Result<Dataset, DatasetError> {
    if !(0.0..=1.0).contains(&drift_factor) {
        return Err(DatasetError::InvalidParameter(format!(
            "drift factor {drift_factor} is outside [0, 1]"
        )));
    }

    let tenure = Clipped::new(32.0, 24.0, 0.0, 72.0)?;
    let tenure_drift = Clipped::new(45.0, 20.0, 0.0, 72.0)?;
    let monthly = Clipped::new(65.0, 30.0, 20.0, 120.0)?;
    let monthly_drift = Clipped::new(85.0, 30.0, 20.0, 120.0)?;
    let total = Clipped::new(2280.0, 2266.0, 0.0, 8684.0)?;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut gender = Vec::with_capacity(n);
    let mut senior = Vec::with_capacity(n);
    let mut contract = Vec::with_capacity(n);
    let mut tenure_col = Vec::with_capacity(n);
    let mut monthly_col = Vec::with_capacity(n);
    let mut total_col = Vec::with_capacity(n);
    let mut phone = Vec::with_capacity(n);
    let mut paperless = Vec::with_capacity(n);
    let mut streaming_tv = Vec::with_capacity(n);
    let mut streaming_movies = Vec::with_capacity(n);

    let mut drifted = 0usize;
    for _ in 0..n {
        let drift = rng.r#gen::<f64>() < drift_factor;
        drifted += usize::from(drift);

        senior.push(pick(&mut rng, &["0", "1"]));
        total_col.push(total.sample(&mut rng));
        streaming_movies.push(pick(&mut rng, &["Yes", "No", "No internet service"]));

        if drift {
            gender.push(pick(&mut rng, &["Female", "Female", "Male"]));
            contract.push(pick(&mut rng, &["One year", "Two year"]));
            tenure_col.push(tenure_drift.sample(&mut rng));
            monthly_col.push(monthly_drift.sample(&mut rng));
            phone.push(pick(&mut rng, &["Yes", "Yes", "Yes", "No"]));
            paperless.push(pick(&mut rng, &["Yes", "Yes", "No"]));
            streaming_tv.push(pick(&mut rng, &["Yes", "Yes", "No"]));
        } else {
            gender.push(pick(&mut rng, &["Male", "Female"]));
            contract.push(pick(&mut rng, &["Month-to-month", "One year", "Two year"]));
            tenure_col.push(tenure.sample(&mut rng));
            monthly_col.push(monthly.sample(&mut rng));
            phone.push(pick(&mut rng, &["Yes", "No"]));
            paperless.push(pick(&mut rng, &["Yes", "No"]));
            streaming_tv.push(pick(&mut rng, &["Yes", "No", "No internet service"]));
        }
    }

    let frame = df!(
        "gender" => gender,
        "SeniorCitizen" => senior,
        "Contract" => contract,
        "tenure" => tenure_col,
        "MonthlyCharges" => monthly_col,
        "TotalCharges" => total_col,
        "PhoneService" => phone,
        "PaperlessBilling" => paperless,
        "StreamingTV" => streaming_tv,
        "StreamingMovies" => streaming_movies,
    )?;

    tracing::info!(rows = n, drifted, drift_factor, seed, "Generated synthetic customers");
    Dataset::from_frame(frame)
}
