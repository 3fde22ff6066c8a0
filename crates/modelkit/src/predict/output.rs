//! Prediction outputs and feature contribution records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::features::Token;

// =============================================================================
// Feature contributions
// =============================================================================

/// Contribution of one model feature, labelled by the feature group that
/// produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "featureType",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum FeatureContribution {
    Identity {
        column_name: String,
        feature_value: f32,
        feature_contribution_value: f32,
    },
    Normalized {
        column_name: String,
        feature_value: f32,
        feature_contribution_value: f32,
    },
    /// `option` is `None` for the missing/unknown slot.
    OneHotEncoded {
        column_name: String,
        option: Option<String>,
        feature_value: bool,
        feature_contribution_value: f32,
    },
    BagOfWords {
        column_name: String,
        token: Token,
        feature_value: bool,
        feature_contribution_value: f32,
    },
}

impl FeatureContribution {
    pub fn column_name(&self) -> &str {
        match self {
            FeatureContribution::Identity { column_name, .. }
            | FeatureContribution::Normalized { column_name, .. }
            | FeatureContribution::OneHotEncoded { column_name, .. }
            | FeatureContribution::BagOfWords { column_name, .. } => column_name,
        }
    }

    pub fn feature_contribution_value(&self) -> f32 {
        match self {
            FeatureContribution::Identity {
                feature_contribution_value,
                ..
            }
            | FeatureContribution::Normalized {
                feature_contribution_value,
                ..
            }
            | FeatureContribution::OneHotEncoded {
                feature_contribution_value,
                ..
            }
            | FeatureContribution::BagOfWords {
                feature_contribution_value,
                ..
            } => *feature_contribution_value,
        }
    }
}

/// Feature contributions for one output, in margin space.
///
/// `baseline_value + sum(entries) == output_value` up to float rounding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureContributions {
    pub baseline_value: f32,
    pub output_value: f32,
    #[serde(rename = "featureContributions")]
    pub entries: Vec<FeatureContribution>,
}

// =============================================================================
// Outputs
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegressionPredictOutput {
    pub value: f32,
    pub feature_contributions: Option<FeatureContributions>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryClassificationPredictOutput {
    pub class_name: String,
    /// Probability of `class_name`.
    pub probability: f32,
    /// Contributions towards the positive class.
    pub feature_contributions: Option<FeatureContributions>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MulticlassClassificationPredictOutput {
    pub class_name: String,
    pub probability: f32,
    /// Probability of every class.
    pub probabilities: BTreeMap<String, f32>,
    /// Contributions towards every class.
    pub feature_contributions: Option<BTreeMap<String, FeatureContributions>>,
}

/// The output of a prediction; its shape depends on the model's task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictOutput {
    Regression(RegressionPredictOutput),
    // Tried before binary: a multiclass record also has every binary field.
    MulticlassClassification(MulticlassClassificationPredictOutput),
    BinaryClassification(BinaryClassificationPredictOutput),
}

impl PredictOutput {
    /// Contributions of the predicted output, if they were computed.
    ///
    /// For multiclass outputs this is the entry of the predicted class.
    pub fn feature_contributions(&self) -> Option<&FeatureContributions> {
        match self {
            PredictOutput::Regression(output) => output.feature_contributions.as_ref(),
            PredictOutput::BinaryClassification(output) => output.feature_contributions.as_ref(),
            PredictOutput::MulticlassClassification(output) => output
                .feature_contributions
                .as_ref()
                .and_then(|map| map.get(&output.class_name)),
        }
    }
}

impl From<RegressionPredictOutput> for PredictOutput {
    fn from(output: RegressionPredictOutput) -> Self {
        PredictOutput::Regression(output)
    }
}

impl From<BinaryClassificationPredictOutput> for PredictOutput {
    fn from(output: BinaryClassificationPredictOutput) -> Self {
        PredictOutput::BinaryClassification(output)
    }
}

impl From<MulticlassClassificationPredictOutput> for PredictOutput {
    fn from(output: MulticlassClassificationPredictOutput) -> Self {
        PredictOutput::MulticlassClassification(output)
    }
}
