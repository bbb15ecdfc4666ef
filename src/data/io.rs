use super::Dataset;
use crate::error::DatasetError;
use crate::model::RowPrediction;
use crate::utils::write_atomic;
use polars::prelude::*;
use std::path::Path;

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Read a CSV or JSON file into a frame.
///
/// # Errors
///
/// Returns an error if the file is missing, has an unsupported extension, or
/// cannot be parsed.
pub fn load_frame(path: &Path) -> Result<DataFrame, DatasetError> {
    if !path.exists() {
        return Err(DatasetError::NotFound(path.to_path_buf()));
    }

    let ext = extension(path);
    let df = match ext.as_str() {
        "csv" => LazyCsvReader::new(path)
            .with_infer_schema_length(Some(10_000))
            .with_has_header(true)
            .finish()?
            .collect()?,
        "json" => JsonReader::new(std::fs::File::open(path)?).finish()?,
        _ => return Err(DatasetError::UnsupportedFormat(ext)),
    };

    Ok(df)
}

/// Load a dataset and tag its columns.
///
/// # Errors
///
/// See [`load_frame`].
pub fn load_dataset(path: &Path) -> Result<Dataset, DatasetError> {
    let df = load_frame(path)?;
    tracing::info!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "Dataset loaded"
    );
    Dataset::from_frame(df)
}

fn frame_to_csv(df: &DataFrame) -> Result<Vec<u8>, DatasetError> {
    let mut df = df.clone();
    let mut buf = Vec::new();
    CsvWriter::new(&mut buf).include_header(true).finish(&mut df)?;
    Ok(buf)
}

/// Write a dataset as CSV.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn save_dataset(dataset: &Dataset, path: &Path) -> Result<(), DatasetError> {
    let buf = frame_to_csv(dataset.frame())?;
    write_atomic(path, &buf)?;
    Ok(())
}

/// Write the batch prediction table (`id`, `predict_result`, `prediction_date`).
///
/// `id` is the 0-based input row the prediction was computed from, so rows
/// dropped before scoring leave gaps.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_predictions(predictions: &[RowPrediction], path: &Path) -> Result<(), DatasetError> {
    let today = chrono::Local::now().date_naive().to_string();
    let ids: Vec<u64> = predictions.iter().map(|p| p.row as u64).collect();
    let labels: Vec<i64> = predictions.iter().map(|p| p.label).collect();
    let dates: Vec<&str> = vec![today.as_str(); predictions.len()];

    let df = DataFrame::new(vec![
        Column::new("id".into(), ids),
        Column::new("predict_result".into(), labels),
        Column::new("prediction_date".into(), dates),
    ])?;

    write_atomic(path, &frame_to_csv(&df)?)?;
    tracing::info!(path = %path.display(), rows = predictions.len(), "Predictions written");
    Ok(())
}
