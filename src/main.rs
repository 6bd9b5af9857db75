//! Command-line entry point for sleep score prediction
//!
//! Loads the sensor CSV, trains the model via grid search, and prints the
//! results. Optionally writes an HTML page with the charts.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use health_gbm::config::Config;
use health_gbm::data::{load_observations, FeatureVector};
use health_gbm::features::FeatureEngineer;
use health_gbm::pipeline;
use health_gbm::report::render_html;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "health-gbm")]
#[command(about = "Predict a sleep score from temperature, ECG and pulse readings", long_about = None)]
struct Args {
    /// Input CSV (overrides the config file)
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Current observation: temperature,ecg,pulse,temperature_rolling,ecg_diff
    #[arg(long, value_delimiter = ',', num_args = 5, allow_hyphen_values = true)]
    current: Option<Vec<f64>>,

    /// Derive the current observation from the last readings in the input file
    #[arg(long, conflicts_with = "current")]
    from_history: bool,

    /// Write an HTML report to this path
    #[arg(long)]
    html: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(data) = &args.data {
        config.data.path = data.clone();
    }

    init_logging(&config, args.verbose)?;

    let loaded = load_observations(&config.data.path)
        .with_context(|| format!("Failed to load {}", config.data.path.display()))?;

    let current = match &args.current {
        Some(values) => match FeatureVector::from_slice(values) {
            Some(current) => current,
            None => bail!(
                "--current needs exactly 5 finite values, got {:?}",
                values
            ),
        },
        None if args.from_history => FeatureEngineer::new()
            .current_from_history(&loaded.observations)
            .context("Not enough readings to derive the current observation")?,
        None => config.current,
    };

    let result = pipeline::run_on_observations(&loaded, &config, &current)
        .context("Training pipeline failed")?;

    match args.format {
        OutputFormat::Text => println!("{}", result.report),
        OutputFormat::Json => println!("{}", result.report.to_json()?),
    }

    if let Some(path) = &args.html {
        std::fs::write(path, render_html(&result.report))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote HTML report to {}", path.display());
    }

    Ok(())
}

fn init_logging(config: &Config, verbose: bool) -> Result<()> {
    let fallback = if verbose { "debug" } else { config.logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .context("Invalid log level")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}
