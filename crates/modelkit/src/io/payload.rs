//! Payload structures for the model file format.
//!
//! These structs are designed for serialization with Postcard (native files)
//! and serde_json (JSON files). They mirror the runtime types but stay flat
//! and free of derived data; [`super::convert`] validates them on load.
//!
//! Every enum here is externally tagged and no field is skipped, so the same
//! types round-trip through both encodings.

use serde::{Deserialize, Serialize};

// ============================================================================
// Top-Level Payload
// ============================================================================

/// Version-tagged payload enum for forward compatibility.
///
/// New format versions add new variants rather than modifying existing ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    /// Version 1 payload format.
    V1(PayloadV1),
}

/// Version 1 payload structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadV1 {
    /// Model identifier reported with every monitoring event.
    pub id: String,
    /// Input columns seen during training, in training order.
    pub columns: Vec<ColumnPayload>,
    /// What the model predicts.
    pub task: TaskPayload,
    /// Rules turning columns into model features, in feature order.
    pub feature_groups: Vec<FeatureGroupPayload>,
    /// The fitted predictor.
    pub model: InnerModelPayload,
}

// ============================================================================
// Columns and Task
// ============================================================================

/// A named input column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnPayload {
    pub name: String,
    pub kind: ColumnKindPayload,
}

/// How values of a column are interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKindPayload {
    /// Column carried no usable signal during training; ignored.
    Unknown,
    Number,
    Enum { options: Vec<String> },
    Text,
}

/// Prediction task and class labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPayload {
    Regressor,
    BinaryClassifier {
        negative_class: String,
        positive_class: String,
    },
    MulticlassClassifier { classes: Vec<String> },
}

// ============================================================================
// Feature Groups
// ============================================================================

/// A feature group derives one or more features from a source column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureGroupPayload {
    /// Raw number, or enum index (0 = missing).
    Identity { source_column: String },
    /// Standardized number.
    Normalized {
        source_column: String,
        mean: f32,
        variance: f32,
    },
    /// One slot for "missing" followed by one per option.
    OneHotEncoded {
        source_column: String,
        options: Vec<String>,
    },
    /// TF-IDF weighted token indicators.
    BagOfWords {
        source_column: String,
        tokenizer: TokenizerPayload,
        tokens: Vec<BagOfWordsTokenPayload>,
    },
}

/// Text tokenizer used by bag-of-words groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenizerPayload {
    Alphanumeric,
}

/// Vocabulary entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BagOfWordsTokenPayload {
    pub token: TokenPayload,
    /// Inverse document frequency.
    pub idf: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPayload {
    Unigram(String),
    Bigram(String, String),
}

// ============================================================================
// Model Payloads
// ============================================================================

/// Inner predictor payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InnerModelPayload {
    Linear(LinearPayload),
    Tree(ForestPayload),
}

/// Linear model payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearPayload {
    pub num_features: u32,
    pub num_groups: u32,
    /// Flat weight array: (num_features + 1) * num_groups.
    /// Layout: feature-major, group-minor. Last row is bias.
    pub weights: Vec<f32>,
    /// Training mean of each feature (one per feature), used as the
    /// background for feature contributions.
    pub means: Vec<f32>,
}

/// Forest of decision trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestPayload {
    pub num_groups: u32,
    /// Base score for each output group.
    pub base_scores: Vec<f32>,
    /// Group assignment for each tree.
    pub tree_groups: Vec<u32>,
    pub trees: Vec<TreePayload>,
}

/// Single decision tree in structure-of-arrays layout.
///
/// All vectors are indexed by node; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreePayload {
    /// Split feature indices (0 for leaves).
    pub split_features: Vec<u32>,
    /// Continuous split values (0.0 for discrete splits and leaves).
    pub split_values: Vec<f32>,
    /// Left child indices (0 for leaves).
    pub left_children: Vec<u32>,
    /// Right child indices (0 for leaves).
    pub right_children: Vec<u32>,
    /// Direction for missing values at continuous splits.
    pub default_left: Vec<bool>,
    pub is_leaf: Vec<bool>,
    /// Leaf values (0.0 for internal nodes).
    pub leaf_values: Vec<f32>,
    /// Split types (0 = continuous, 1 = discrete).
    pub split_types: Vec<u8>,
    /// For discrete splits, whether each enum index (0 = missing) goes left.
    /// Empty for other nodes.
    pub discrete_left: Vec<Vec<bool>>,
    /// Fraction of training examples that reached each node.
    pub examples_fractions: Vec<f32>,
}

// ============================================================================
// Tests
// ============================================================================
