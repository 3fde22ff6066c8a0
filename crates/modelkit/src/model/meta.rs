//! Model metadata.
//!
//! Shared metadata types for model introspection.

use serde::{Deserialize, Serialize};

/// What a model predicts, with its class labels.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum TaskKind {
    /// Regression (continuous target).
    #[default]
    Regression,
    /// Binary classification.
    BinaryClassification {
        negative_class: String,
        positive_class: String,
    },
    /// Multi-class classification, one output group per class.
    MulticlassClassification { classes: Vec<String> },
}

impl TaskKind {
    /// Returns the number of output groups for this task.
    pub fn n_groups(&self) -> usize {
        match self {
            Self::Regression => 1,
            Self::BinaryClassification { .. } => 1,
            Self::MulticlassClassification { classes } => classes.len(),
        }
    }

    /// Returns true if this is a classification task.
    pub fn is_classification(&self) -> bool {
        matches!(
            self,
            Self::BinaryClassification { .. } | Self::MulticlassClassification { .. }
        )
    }

    /// Class labels in output order; empty for regression.
    pub fn classes(&self) -> Vec<&str> {
        match self {
            Self::Regression => Vec::new(),
            Self::BinaryClassification {
                negative_class,
                positive_class,
            } => vec![negative_class.as_str(), positive_class.as_str()],
            Self::MulticlassClassification { classes } => {
                classes.iter().map(String::as_str).collect()
            }
        }
    }
}

/// Introspection data about a loaded model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMeta {
    /// Identifier reported with monitoring events.
    pub id: String,
    /// Task type.
    pub task: TaskKind,
    /// Input column names, in training order.
    pub column_names: Vec<String>,
    /// Number of model features.
    pub n_features: usize,
    /// Number of output groups.
    pub n_groups: usize,
    /// `"linear"` or `"tree"`.
    pub model_kind: String,
}
