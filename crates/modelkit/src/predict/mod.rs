//! Prediction records: inputs, options, and outputs.
//!
//! - [`PredictInput`]: a key-value record keyed by column name
//! - [`PredictOptions`]: threshold and contribution settings
//! - [`PredictOutput`]: task-specific output, optionally with
//!   [`FeatureContributions`]
//!
//! The [`engine`] submodule turns margins into outputs.

pub mod engine;
mod options;
mod output;

pub use options::{OptionsError, PredictOptions};
pub use output::{
    BinaryClassificationPredictOutput, FeatureContribution, FeatureContributions,
    MulticlassClassificationPredictOutput, PredictOutput, RegressionPredictOutput,
};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A raw input value: a number or a string.
///
/// Serializes untagged, so a record is a plain JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictInputValue {
    Number(f64),
    String(String),
}

impl PredictInputValue {
    /// The string, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PredictInputValue::Number(_) => None,
            PredictInputValue::String(s) => Some(s),
        }
    }
}

impl From<f64> for PredictInputValue {
    fn from(value: f64) -> Self {
        PredictInputValue::Number(value)
    }
}

impl From<f32> for PredictInputValue {
    fn from(value: f32) -> Self {
        PredictInputValue::Number(value as f64)
    }
}

impl From<i64> for PredictInputValue {
    fn from(value: i64) -> Self {
        PredictInputValue::Number(value as f64)
    }
}

impl From<&str> for PredictInputValue {
    fn from(value: &str) -> Self {
        PredictInputValue::String(value.to_string())
    }
}

impl From<String> for PredictInputValue {
    fn from(value: String) -> Self {
        PredictInputValue::String(value)
    }
}

/// An input record: column name → value. Missing keys are missing values;
/// keys that match no column are ignored.
pub type PredictInput = BTreeMap<String, PredictInputValue>;
