//! Example: Training the sleep score model
//!
//! Run with: cargo run --example train_model -- [path/to/data.csv]

use anyhow::Result;
use health_gbm::{
    config::Config,
    data::FeatureVector,
    models::ParamGrid,
    pipeline,
};

fn main() -> Result<()> {
    println!("Sleep Score Training Example");
    println!("{}", "=".repeat(40));

    let mut config = Config::default();
    if let Some(path) = std::env::args().nth(1) {
        config.data.path = path.into();
    }

    // Smaller grid than the default so the example finishes quickly
    config.grid = ParamGrid {
        n_estimators: vec![50, 100],
        learning_rate: vec![0.1, 0.2],
        max_depth: vec![3, 5],
    };

    println!("\nTraining on {} ...", config.data.path.display());
    let current = FeatureVector::default();
    let result = pipeline::run(&config, &current)?;

    let summary = &result.report.summary;
    println!("\nData Split:");
    println!("   Train: {} samples", summary.train_rows);
    println!("   Test:  {} samples", summary.test_rows);

    println!("\n{}", result.report);

    let rescored = result.model.predict(&current)?;
    println!("Prediction for {:?}: {:.2}", current, rescored);

    Ok(())
}
