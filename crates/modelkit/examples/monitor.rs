//! Log predictions and true values to a monitoring service.
//!
//! Run with:
//! ```bash
//! MODELKIT_URL=http://localhost:8080 cargo run --example monitor
//! ```
//!
//! `MODELKIT_URL` defaults to the hosted service.

use std::process::ExitCode;

use modelkit::io::ModelFile;
use modelkit::testing::fixtures;
use modelkit::{LoadModelOptions, LogPredictionArgs, LogTrueValueArgs, Model, PredictOptions};
use tracing::{error, info, warn};
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
            error!(error = %err, "Monitoring failed");
            ExitCode::FAILURE
        }
    }
}

fn run() -> modelkit::Result<()> {
    let bytes = ModelFile::new(fixtures::heart_disease_tree()).to_bytes()?;
    let options = LoadModelOptions::builder()
        .maybe_base_url(std::env::var("MODELKIT_URL").ok())
        .build();
    info!(base_url = options.base_url_or_default(), "Reporting to");
    let model = Model::from_bytes(&bytes, Some(options))?;

    // One event right away.
    let predict_options = PredictOptions::default();
    let input = fixtures::heart_disease_input(63.0);
    let output = model.predict_one(&input, Some(&predict_options));
    model.log_prediction(LogPredictionArgs {
        identifier: "patient-1".into(),
        input,
        options: Some(predict_options),
        output,
    })?;

    // A batch of events, sent together.
    for (i, age) in [35.0, 48.0, 71.0].into_iter().enumerate() {
        let identifier = format!("patient-{}", i + 2);
        let input = fixtures::heart_disease_input(age);
        let output = model.predict_one(&input, None);
        model.enqueue_log_prediction(LogPredictionArgs {
            identifier: identifier.clone().into(),
            input,
            options: None,
            output,
        });
        model.enqueue_log_true_value(LogTrueValueArgs {
            identifier: identifier.into(),
            true_value: if age > 60.0 { "Positive" } else { "Negative" }.into(),
        });
    }

    match model.flush_log_queue() {
        Ok(n) => info!(n_events = n, "Flushed"),
        Err(err) => {
            warn!(queued = model.log_queue_len(), "Events kept for a later flush");
            return Err(err.into());
        }
    }
    Ok(())
}
