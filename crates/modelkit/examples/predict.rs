//! Load a model and predict a record.
//!
//! Run with:
//! ```bash
//! cargo run --example predict -- [MODEL_PATH]
//! ```
//!
//! Without a path, a bundled heart disease model is written to a temporary
//! directory and loaded from there.

use std::process::ExitCode;

use modelkit::io::{ModelFile, SerializeError};
use modelkit::testing::fixtures;
use modelkit::{Model, PredictOptions, PredictOutput};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "Prediction failed");
            ExitCode::FAILURE
        }
    }
}

fn run() -> modelkit::Result<()> {
    // =========================================================================
    // 1. Load
    // =========================================================================
    let dir = tempfile::tempdir().map_err(SerializeError::from)?;
    let path = match std::env::args_os().nth(1) {
        Some(path) => path.into(),
        None => {
            let path = dir.path().join("heart_disease.mkit");
            ModelFile::new(fixtures::heart_disease_linear()).save(&path)?;
            path
        }
    };
    let model = Model::from_path(&path, None)?;
    let meta = model.meta();
    info!(id = %meta.id, kind = %meta.model_kind, "Model ready");
    println!("Columns: {}", meta.column_names.join(", "));

    // =========================================================================
    // 2. Predict
    // =========================================================================
    let input = fixtures::heart_disease_input(63.0);
    let options = PredictOptions::builder()
        .threshold(0.4)
        .compute_feature_contributions(true)
        .build()?;
    let output = model.predict_one(&input, Some(&options));

    match &output {
        PredictOutput::Regression(output) => println!("Value: {:.4}", output.value),
        PredictOutput::BinaryClassification(output) => {
            println!("Class: {} ({:.4})", output.class_name, output.probability)
        }
        PredictOutput::MulticlassClassification(output) => {
            println!("Class: {} ({:.4})", output.class_name, output.probability)
        }
    }

    // =========================================================================
    // 3. Explain
    // =========================================================================
    if let Some(contributions) = output.feature_contributions() {
        println!("Baseline: {:.4}", contributions.baseline_value);
        let mut entries: Vec<_> = contributions.entries.iter().collect();
        entries.sort_by(|a, b| {
            b.feature_contribution_value()
                .abs()
                .total_cmp(&a.feature_contribution_value().abs())
        });
        for entry in entries.iter().take(5) {
            println!(
                "  {:<12} {:+.4}",
                entry.column_name(),
                entry.feature_contribution_value()
            );
        }
        println!("Output: {:.4}", contributions.output_value);
    }

    let json = serde_json::to_string_pretty(&output).map_err(SerializeError::from)?;
    println!("{json}");
    Ok(())
}
