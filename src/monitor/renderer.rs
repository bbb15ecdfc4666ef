use super::report::{DriftReport, DriftSummary};
use crate::error::RenderError;
use crate::utils::{escape_html, fmt_opt, write_atomic};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// The report document as pretty-printed JSON.
    #[default]
    Json,
    /// A standalone styled page.
    Html,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Html => "html",
        }
    }
}

/// A rendered drift report, not yet written anywhere.
#[derive(Clone, Debug, PartialEq)]
pub struct Artifact {
    pub format: ReportFormat,
    pub content: String,
    generated_at: DateTime<Utc>,
}

impl Artifact {
    /// `drift_report_<YYYYmmdd_HHMMSS_mmm>.<ext>` in local time.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.file_stem(), self.format.extension())
    }

    fn file_stem(&self) -> String {
        format!(
            "drift_report_{}",
            self.generated_at
                .with_timezone(&Local)
                .format("%Y%m%d_%H%M%S_%3f")
        )
    }

    /// Write the artifact into `dir` and return its path. The file appears
    /// under its final name only once fully written. An existing report of
    /// the same name is never replaced; a `_<n>` suffix is added instead.
    ///
    /// # Errors
    ///
    /// [`RenderError::Io`] if the directory or file cannot be written.
    pub fn persist(&self, dir: &Path) -> Result<PathBuf, RenderError> {
        let path = self.free_path(dir);
        write_atomic(&path, self.content.as_bytes()).map_err(|source| RenderError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::info!(path = %path.display(), format = ?self.format, "Drift report saved");
        Ok(path)
    }

    fn free_path(&self, dir: &Path) -> PathBuf {
        let stem = self.file_stem();
        let ext = self.format.extension();
        let mut path = dir.join(format!("{stem}.{ext}"));
        let mut n = 1;
        while path.exists() {
            path = dir.join(format!("{stem}_{n}.{ext}"));
            n += 1;
        }
        path
    }
}

/// Serialize a report. Metrics are taken as given, never recomputed.
///
/// # Errors
///
/// [`RenderError::Serialize`] if JSON serialization fails.
pub fn render(
    summary: &DriftSummary,
    report: &DriftReport,
    format: ReportFormat,
) -> Result<Artifact, RenderError> {
    let content = match format {
        ReportFormat::Json => render_json(report)?,
        ReportFormat::Html => render_html(summary, report),
    };
    Ok(Artifact {
        format,
        content,
        generated_at: report.timestamp(),
    })
}

/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_json(report: &DriftReport) -> Result<String, RenderError> {
    Ok(serde_json::to_string_pretty(report)?)
}

const STYLE: &str = r"
        body { font-family: Arial, sans-serif; line-height: 1.6; margin: 0; padding: 20px; background-color: #f5f5f5; }
        .container { max-width: 1200px; margin: 0 auto; background-color: white; padding: 20px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
        h1, h2 { color: #333; }
        .summary { background-color: #f8f9fa; padding: 15px; border-radius: 4px; margin-bottom: 20px; }
        .drift-detected { color: #dc3545; font-weight: bold; }
        .no-drift { color: #28a745; font-weight: bold; }
        table { width: 100%; border-collapse: collapse; margin-top: 20px; }
        th, td { padding: 12px; text-align: left; border-bottom: 1px solid #ddd; }
        th { background-color: #f8f9fa; }
        tr:hover { background-color: #f5f5f5; }
        .timestamp { color: #666; font-size: 0.9em; }
";

fn flag(detected: bool) -> (&'static str, &'static str) {
    if detected {
        ("drift-detected", "Yes")
    } else {
        ("no-drift", "No")
    }
}

pub fn render_html(summary: &DriftSummary, report: &DriftReport) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    html.push_str("    <meta charset=\"utf-8\">\n");
    html.push_str("    <title>Data Drift Report</title>\n");
    html.push_str(&format!("    <style>{STYLE}    </style>\n"));
    html.push_str("</head>\n<body>\n<div class=\"container\">\n");
    html.push_str("    <h1>Data Drift Report</h1>\n");
    html.push_str(&format!(
        "    <div class=\"timestamp\">Generated at: {}</div>\n",
        report.timestamp().to_rfc3339()
    ));

    let (class, label) = flag(summary.drift_detected);
    html.push_str("    <div class=\"summary\">\n        <h2>Summary</h2>\n");
    html.push_str(&format!(
        "        <p>Drift Detected: <span class=\"{class}\">{label}</span></p>\n"
    ));
    html.push_str(&format!(
        "        <p>Overall Drift Score: {}</p>\n",
        fmt_opt(Some(summary.drift_score))
    ));
    html.push_str(&format!(
        "        <p>Number of Features with Drift: {}</p>\n",
        summary.features_drifted.len()
    ));
    html.push_str("    </div>\n");

    html.push_str("    <h2>Detailed Results</h2>\n    <table>\n");
    html.push_str(
        "        <tr><th>Feature</th><th>KL Divergence</th><th>Drift Detected</th></tr>\n",
    );
    for (column, metric) in report.metrics() {
        let (class, label) = flag(metric.drift_detected);
        html.push_str(&format!(
            "        <tr><td>{}</td><td>{}</td><td class=\"{class}\">{label}</td></tr>\n",
            escape_html(column),
            fmt_opt(Some(metric.divergence_score))
        ));
    }
    html.push_str("    </table>\n</div>\n</body>\n</html>\n");

    html
}
