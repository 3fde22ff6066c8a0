//! modelkit: load trained models, make predictions, and report them.
//!
//! Models are read from native `.mkit` files (or their JSON form), turned
//! into linear or tree-ensemble predictors, and queried with key-value input
//! records. Predictions and later-observed true values can be logged to a
//! remote monitoring service.
//!
//! # Key Types
//!
//! - [`Model`] - A loaded model with predict and logging methods
//! - [`LoadModelOptions`] / [`PredictOptions`] - Configuration builders
//! - [`PredictInput`] / [`PredictOutput`] - Prediction records
//! - [`Monitor`] / [`EventSink`] - Event reporting
//!
//! # Example
//!
//! ```no_run
//! use modelkit::{LoadModelOptions, LogPredictionArgs, Model, PredictInput, PredictOptions};
//!
//! let options = LoadModelOptions::builder()
//!     .base_url("http://localhost:8080".to_string())
//!     .build();
//! let model = Model::from_path("heart_disease.mkit", Some(options))?;
//!
//! let mut input = PredictInput::new();
//! input.insert("age".into(), 63.0.into());
//! input.insert("gender".into(), "male".into());
//!
//! let predict_options = PredictOptions::builder().threshold(0.25).build()?;
//! let output = model.predict_one(&input, Some(&predict_options));
//!
//! model.log_prediction(LogPredictionArgs {
//!     identifier: "6c955d4f".into(),
//!     input,
//!     options: Some(predict_options),
//!     output,
//! })?;
//! # Ok::<(), modelkit::Error>(())
//! ```

// Re-export approx traits for users who want to compare predictions
pub use approx;

pub mod error;
pub mod explainability;
pub mod features;
pub mod inference;
pub mod io;
pub mod model;
pub mod monitor;
pub mod predict;
pub mod repr;
pub mod testing;
pub mod utils;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use error::{Error, Result};

pub use model::{LoadError, LoadModelOptions, Model, ModelMeta, TaskKind, DEFAULT_BASE_URL};

pub use predict::{
    BinaryClassificationPredictOutput, FeatureContribution, FeatureContributions,
    MulticlassClassificationPredictOutput, OptionsError, PredictInput, PredictInputValue,
    PredictOptions, PredictOutput, RegressionPredictOutput,
};

pub use monitor::{
    EventSink, HttpSink, LogPredictionArgs, LogTrueValueArgs, Monitor, MonitorError,
    MonitorEvent, NumberOrString,
};

pub use utils::{run_with_threads, Parallelism};
