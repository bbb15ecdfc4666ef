use anyhow::{Context as _, Result};
use churnguard::api::{PredictionRequest, handle_prediction};
use churnguard::batch::{check_drift, run_batch};
use churnguard::config::{PipelineConfig, get_config_path};
use churnguard::data::{load_dataset, save_dataset};
use churnguard::features::FeatureTransformer;
use churnguard::model::{PredictionEngine, PredictionSummary, churn_status};
use churnguard::monitor::synth::{DEFAULT_SEED, generate_customers};
use churnguard::monitor::{DivergencePolicy, ReportFormat};
use churnguard::schema::CustomerRecord;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "churnguard", version, about = "Customer churn scoring and data drift monitoring")]
pub struct Cli {
    /// Configuration file. Defaults to the platform config directory.
    #[arg(long, global = true, env = "CHURNGUARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase console verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Do not write log files
    #[arg(long, global = true)]
    pub no_log_file: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args)]
pub struct ModelArgs {
    /// Classifier artifact, overrides the configured one
    #[arg(short, long)]
    model: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score a dataset file or a single JSON record
    Predict {
        /// CSV or JSON dataset to score
        #[arg(short, long, required_unless_present = "record", conflicts_with = "record")]
        input: Option<PathBuf>,

        /// One customer as JSON, e.g. '{"TotalCharges": 2000, "Contract": "One year", "PhoneService": "Yes", "tenure": 24}'
        #[arg(short, long)]
        record: Option<String>,

        #[command(flatten)]
        model: ModelArgs,
    },
    /// Compare a dataset against the reference and write a drift report
    Drift {
        /// Dataset to check
        #[arg(short, long)]
        current: PathBuf,

        /// Reference dataset, overrides the configured one
        #[arg(long)]
        reference: Option<PathBuf>,

        #[arg(short, long)]
        threshold: Option<f64>,

        #[arg(short, long, value_enum)]
        format: Option<ReportFormat>,

        #[arg(long, value_enum)]
        policy: Option<DivergencePolicy>,

        /// Directory for the report file
        #[arg(long)]
        report_dir: Option<PathBuf>,
    },
    /// Check a JSON record against the field rules
    Validate {
        record: String,
    },
    /// Drift check, scoring and prediction table in one run
    Batch {
        input: PathBuf,

        /// Where to write the prediction table
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        model: ModelArgs,
    },
    /// Generate a synthetic customer dataset
    Generate {
        #[arg(short, long)]
        output: PathBuf,

        #[arg(short = 'n', long, default_value_t = 1000)]
        rows: usize,

        /// Share of rows drawn from the drifted distributions (0-1)
        #[arg(short, long, default_value_t = 0.5)]
        drift_factor: f64,

        #[arg(short, long, default_value_t = DEFAULT_SEED)]
        seed: u64,
    },
    /// Print the effective configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        save: bool,
    },
}

pub fn run_command(command: Commands, config_path: Option<PathBuf>) -> Result<()> {
    let config = PipelineConfig::load(config_path.as_deref()).context("Failed to load configuration")?;

    match command {
        Commands::Predict {
            input,
            record,
            model,
        } => {
            let engine = load_engine(&config, &model)?;
            match (input, record) {
                (Some(input), _) => handle_predict_file(&engine, &input),
                (None, Some(record)) => handle_predict_record(&engine, &record),
                (None, None) => anyhow::bail!("either --input or --record is required"),
            }
        }
        Commands::Drift {
            current,
            reference,
            threshold,
            format,
            policy,
            report_dir,
        } => {
            let config = PipelineConfig {
                reference_path: reference.or(config.reference_path),
                drift_threshold: threshold.unwrap_or(config.drift_threshold),
                report_format: format.unwrap_or(config.report_format),
                divergence_policy: policy.unwrap_or(config.divergence_policy),
                report_dir: report_dir.unwrap_or(config.report_dir),
                ..config
            };
            config.validate()?;
            handle_drift(&config, &current)
        }
        Commands::Validate { record } => handle_validate(&record),
        Commands::Batch {
            input,
            output,
            model,
        } => {
            let engine = load_engine(&config, &model)?;
            let config = PipelineConfig {
                predictions_path: output.or(config.predictions_path),
                ..config
            };
            handle_batch(&config, &engine, &input)
        }
        Commands::Generate {
            output,
            rows,
            drift_factor,
            seed,
        } => {
            let dataset = generate_customers(rows, drift_factor, seed)?;
            save_dataset(&dataset, &output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Generated {rows} customers: {}", output.display());
            Ok(())
        }
        Commands::Config { save } => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            if save {
                let path = config_path.unwrap_or_else(get_config_path);
                config.save(&path)?;
                println!("Saved to {}", path.display());
            }
            Ok(())
        }
    }
}

fn load_engine(config: &PipelineConfig, args: &ModelArgs) -> Result<PredictionEngine> {
    let engine = PredictionEngine::new(FeatureTransformer::new(config.transformer.clone()));
    let path = args.model.as_ref().unwrap_or(&config.model_path);
    engine
        .load_model(path)
        .with_context(|| format!("Failed to load model {}", path.display()))?;
    Ok(engine)
}

fn handle_predict_file(engine: &PredictionEngine, input: &std::path::Path) -> Result<()> {
    let dataset = load_dataset(input).context("Failed to load dataset")?;
    let labels = engine.predict(&dataset)?;

    println!("Predictions:");
    println!("{}", "-".repeat(50));
    for (i, label) in labels.iter().enumerate() {
        println!("Customer {}: {}", i + 1, churn_status(*label));
    }
    print_summary(&PredictionSummary::from_labels(&labels));
    Ok(())
}

fn handle_predict_record(engine: &PredictionEngine, record: &str) -> Result<()> {
    let request: PredictionRequest =
        serde_json::from_str(record).context("Record is not valid JSON")?;
    let response = handle_prediction(engine, request)?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn handle_drift(config: &PipelineConfig, current: &std::path::Path) -> Result<()> {
    let dataset = load_dataset(current).context("Failed to load current dataset")?;
    let (report, outcome) = check_drift(config, &dataset)?;

    println!("{:<24} {:>10}  Drift", "Column", "Score");
    for (column, metric) in report.metrics() {
        println!(
            "{column:<24} {:>10.4}  {}",
            metric.divergence_score,
            if metric.drift_detected { "yes" } else { "no" }
        );
    }
    println!();
    println!("Drift detected: {}", outcome.summary.drift_detected);
    println!("Drift score:    {:.4}", outcome.summary.drift_score);
    println!("Report:         {}", outcome.report_path.display());
    Ok(())
}

fn handle_validate(record: &str) -> Result<()> {
    let record: CustomerRecord =
        serde_json::from_str(record).context("Record is not a valid customer")?;
    record.validate()?;
    println!("Record is valid.");
    Ok(())
}

fn handle_batch(
    config: &PipelineConfig,
    engine: &PredictionEngine,
    input: &std::path::Path,
) -> Result<()> {
    let outcome = run_batch(config, engine, input)?;

    match &outcome.drift {
        Some(drift) => println!(
            "Drift detected: {} (score {:.4}), report: {}",
            drift.summary.drift_detected,
            drift.summary.drift_score,
            drift.report_path.display()
        ),
        None => println!("Drift check skipped or failed, see log."),
    }
    print_summary(&outcome.summary);
    if let Some(path) = &outcome.predictions_path {
        println!("Predictions written to {}", path.display());
    }
    Ok(())
}

fn print_summary(summary: &PredictionSummary) {
    println!();
    println!("Summary Statistics:");
    println!("{}", "-".repeat(50));
    println!("Total Customers: {}", summary.total_customers);
    println!("Predicted Churns: {}", summary.churn_count);
    println!("Churn Rate: {:.2}%", summary.churn_rate);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory as _;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_predict_requires_input_or_record() {
        assert!(Cli::try_parse_from(["churnguard", "predict"]).is_err());
        assert!(Cli::try_parse_from(["churnguard", "predict", "--input", "a.csv"]).is_ok());
        assert!(
            Cli::try_parse_from(["churnguard", "predict", "-i", "a.csv", "-r", "{}"]).is_err()
        );
    }

    #[test]
    fn test_drift_options() {
        let cli = Cli::try_parse_from([
            "churnguard",
            "drift",
            "--current",
            "now.csv",
            "--format",
            "html",
            "--policy",
            "quantile-distance",
        ]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Drift {
                format: Some(ReportFormat::Html),
                policy: Some(DivergencePolicy::QuantileDistance),
                ..
            })
        ));
    }
}
