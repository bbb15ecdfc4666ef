//! # churnguard command-line entry point
//!
//! ```text
//! main()
//!   │
//!   ├─> Parse CLI arguments (clap)
//!   ├─> Initialize logging (console + rolling files)
//!   ├─> Load configuration (file + CHURNGUARD_* overrides)
//!   └─> Run the subcommand
//! ```
//!
//! ```bash
//! churnguard generate -o data/reference_data.csv -d 0
//! churnguard drift --current data/new_customers.csv --format html
//! churnguard batch data/new_customers.csv -o predictions.csv
//! ```

#![expect(clippy::print_stdout)] // command output goes to stdout

mod cli;

use anyhow::Result;
use churnguard::logging::{self, LogOptions};
use clap::Parser as _;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    logging::init(&LogOptions {
        default_level: default_level.to_owned(),
        log_dir: None,
        file_logging: !cli.no_log_file,
    })?;

    let result = cli::run_command(cli.command, cli.config);
    if let Err(e) = &result {
        tracing::error!(error = format!("{e:#}"), "Command failed");
    }
    result
}
