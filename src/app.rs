//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and sets up logging
//! - parses CLI arguments (prompting in interactive mode)
//! - signs in and reconciles the requested range
//! - prints the success message or the punches that need manual review

use chrono::Utc;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::cli::prompt::LinePrompt;
use crate::cli::{Cli, settings_from_args};
use crate::data::MayoHrClient;
use crate::error::AppError;
use crate::punch::PunchClock;

pub mod pipeline;

/// Entry point for the `apollogize` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    // Calendar dates and the working-hours domain are both in UTC.
    let today = Utc::now().date_naive();
    let settings = settings_from_args(cli, today, &mut LinePrompt::stdio())?;

    let client = MayoHrClient::new(settings.endpoints.clone())?;
    let clock = PunchClock::from_seed(settings.seed);

    let report = pipeline::run_reconciliation(&client, &settings.credentials, &settings.config, clock, today)
        .inspect_err(|err| error!("{err}"))?;

    println!("{}", crate::report::format_run_summary(&report, &settings.config));
    if report.success() {
        info!("Success!");
    } else {
        error!(
            "{} punch(es) and {} month(s) need manual review",
            report.failures.len(),
            report.unfetched_months.len()
        );
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A second init (e.g. from a test harness) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
