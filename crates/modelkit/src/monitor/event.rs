//! Monitoring events and the arguments that produce them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::predict::{PredictInput, PredictOptions, PredictOutput};

/// An identifier or label: a number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberOrString {
    Number(f64),
    String(String),
}

impl fmt::Display for NumberOrString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberOrString::Number(n) => write!(f, "{n}"),
            NumberOrString::String(s) => f.write_str(s),
        }
    }
}

impl From<f64> for NumberOrString {
    fn from(value: f64) -> Self {
        NumberOrString::Number(value)
    }
}

impl From<&str> for NumberOrString {
    fn from(value: &str) -> Self {
        NumberOrString::String(value.to_string())
    }
}

impl From<String> for NumberOrString {
    fn from(value: String) -> Self {
        NumberOrString::String(value)
    }
}

/// A prediction to report.
#[derive(Debug, Clone, PartialEq)]
pub struct LogPredictionArgs {
    /// Correlates this prediction with a later true value.
    pub identifier: NumberOrString,
    pub input: PredictInput,
    /// Options the prediction was made with, if any.
    pub options: Option<PredictOptions>,
    pub output: PredictOutput,
}

/// An observed outcome for an earlier prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct LogTrueValueArgs {
    pub identifier: NumberOrString,
    pub true_value: NumberOrString,
}

/// A record sent to the monitoring service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum MonitorEvent {
    Prediction {
        model_id: String,
        identifier: NumberOrString,
        input: PredictInput,
        options: Option<PredictOptions>,
        output: PredictOutput,
        date: DateTime<Utc>,
    },
    TrueValue {
        model_id: String,
        identifier: NumberOrString,
        true_value: NumberOrString,
        date: DateTime<Utc>,
    },
}

impl MonitorEvent {
    pub fn prediction(model_id: &str, args: LogPredictionArgs, date: DateTime<Utc>) -> Self {
        let LogPredictionArgs {
            identifier,
            input,
            options,
            output,
        } = args;
        MonitorEvent::Prediction {
            model_id: model_id.to_string(),
            identifier,
            input,
            options,
            output,
            date,
        }
    }

    pub fn true_value(model_id: &str, args: LogTrueValueArgs, date: DateTime<Utc>) -> Self {
        MonitorEvent::TrueValue {
            model_id: model_id.to_string(),
            identifier: args.identifier,
            true_value: args.true_value,
            date,
        }
    }

    pub fn identifier(&self) -> &NumberOrString {
        match self {
            MonitorEvent::Prediction { identifier, .. }
            | MonitorEvent::TrueValue { identifier, .. } => identifier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::BinaryClassificationPredictOutput;
    use chrono::TimeZone;
    use serde_json::json;

    fn date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn prediction_json_shape() {
        let mut input = PredictInput::new();
        input.insert("age".into(), 63.0.into());
        let event = MonitorEvent::prediction(
            "model-1",
            LogPredictionArgs {
                identifier: "6c955d4f".into(),
                input,
                options: Some(PredictOptions::default()),
                output: BinaryClassificationPredictOutput {
                    class_name: "Positive".into(),
                    probability: 0.75,
                    feature_contributions: None,
                }
                .into(),
            },
            date(),
        );

        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "type": "prediction",
                "modelId": "model-1",
                "identifier": "6c955d4f",
                "input": {"age": 63.0},
                "options": {"threshold": 0.5, "computeFeatureContributions": false},
                "output": {
                    "className": "Positive",
                    "probability": 0.75,
                    "featureContributions": null,
                },
                "date": "2026-01-01T00:00:00Z",
            })
        );
    }

    #[test]
    fn true_value_json_shape_and_roundtrip() {
        let event = MonitorEvent::true_value(
            "model-1",
            LogTrueValueArgs {
                identifier: 42.0.into(),
                true_value: "Negative".into(),
            },
            date(),
        );
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "true_value",
                "modelId": "model-1",
                "identifier": 42.0,
                "trueValue": "Negative",
                "date": "2026-01-01T00:00:00Z",
            })
        );

        let back: MonitorEvent = serde_json::from_value(value).unwrap();
        assert_eq!(back, event);
        assert_eq!(back.identifier().to_string(), "42");
    }
}
