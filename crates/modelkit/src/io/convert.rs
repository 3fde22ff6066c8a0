//! Conversion between model files and runtime types.
//!
//! [`ModelFile`] wraps a [`PayloadV1`] and knows how to read and write it in
//! both containers (native and JSON). [`ModelFile::into_parts`] validates the
//! payload and builds the runtime pieces a [`Model`](crate::Model) is made
//! of.
//!
//! ```no_run
//! use modelkit::io::ModelFile;
//!
//! let file = ModelFile::load("heart_disease.mkit")?;
//! let parts = file.into_parts()?;
//! println!("{} reads {} features", parts.id, parts.pipeline.n_features());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::path::Path;

use thiserror::Error;

use crate::features::{
    BagOfWordsFeatureGroup, BagOfWordsToken, Column, ColumnKind, FeatureGroup, FeaturePipeline,
    FeatureValidationError, Token, Tokenizer,
};
use crate::inference::InnerModel;
use crate::io::native::{
    DeserializeError, FormatFlags, FormatHeader, ModelKind, NativeCodec, SerializeError,
};
use crate::io::payload::{
    BagOfWordsTokenPayload, ColumnKindPayload, FeatureGroupPayload, ForestPayload,
    InnerModelPayload, LinearPayload, Payload, PayloadV1, TaskPayload, TokenPayload,
    TokenizerPayload, TreePayload,
};
use crate::model::TaskKind;
use crate::repr::{Forest, ForestValidationError, LinearModel, SplitType, Tree};

// ============================================================================
// ValidationError
// ============================================================================

/// A decoded payload that does not describe a usable model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Columns and feature groups do not fit together.
    #[error("invalid feature groups: {0:?}")]
    Features(FeatureValidationError),

    /// A bag-of-words vocabulary lists a token twice.
    #[error("feature group {group_idx} lists token {token:?} more than once")]
    DuplicateToken { group_idx: usize, token: String },

    /// The tree ensemble is structurally broken.
    #[error("invalid tree ensemble: {0:?}")]
    Forest(ForestValidationError),

    /// A tree node has an unknown split type tag.
    #[error("tree {tree_idx} node {node} has unknown split type {value}")]
    UnknownSplitType { tree_idx: usize, node: usize, value: u8 },

    /// Linear weights or means do not match the declared dimensions.
    #[error(
        "linear model expects {num_features} features x {num_groups} groups, \
         got {weights} weights and {means} means"
    )]
    LinearShape {
        num_features: u32,
        num_groups: u32,
        weights: usize,
        means: usize,
    },

    /// The inner model was fitted on a different number of features.
    #[error("model reads {model} features but the feature groups produce {groups}")]
    FeatureCountMismatch { groups: usize, model: usize },

    /// The inner model's output groups do not fit the task.
    #[error("task needs {expected} output groups, model has {actual}")]
    GroupCountMismatch { expected: usize, actual: usize },

    /// A multiclass task with fewer than two classes.
    #[error("multiclass task needs at least 2 classes, got {0}")]
    TooFewClasses(usize),
}

impl From<FeatureValidationError> for ValidationError {
    fn from(err: FeatureValidationError) -> Self {
        Self::Features(err)
    }
}

impl From<ForestValidationError> for ValidationError {
    fn from(err: ForestValidationError) -> Self {
        Self::Forest(err)
    }
}

// ============================================================================
// ModelParts
// ============================================================================

/// Validated runtime pieces of a model.
#[derive(Debug, Clone)]
pub struct ModelParts {
    pub id: String,
    pub task: TaskKind,
    pub pipeline: FeaturePipeline,
    pub inner: InnerModel,
}

// ============================================================================
// ModelFile
// ============================================================================

/// A model file's contents, in either container.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelFile {
    payload: PayloadV1,
}

impl ModelFile {
    pub fn new(payload: PayloadV1) -> Self {
        Self { payload }
    }

    pub fn payload(&self) -> &PayloadV1 {
        &self.payload
    }

    /// Read a model file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DeserializeError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Decode a native or JSON model file.
    ///
    /// JSON is recognized by a leading `{` (after whitespace). Native files
    /// must carry a header that agrees with the payload on model kind,
    /// content flags, feature count and group count.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DeserializeError> {
        let first = bytes.iter().find(|b| !b.is_ascii_whitespace());
        if first == Some(&b'{') {
            return Self::from_json(bytes);
        }

        let (header, payload): (FormatHeader, Payload) = NativeCodec::new().deserialize(bytes)?;
        let Payload::V1(payload) = payload;
        let file = Self { payload };

        let kind = file.model_kind();
        if header.model_kind != kind {
            return Err(DeserializeError::KindMismatch {
                header: header.model_kind,
                payload: kind,
            });
        }
        let content = header.flags.masked(FormatFlags::CONTENT);
        if content != file.content_flags() {
            return Err(DeserializeError::FlagsMismatch {
                header: content.bits(),
                payload: file.content_flags().bits(),
            });
        }
        let (num_features, num_groups) = (file.num_features(), file.num_groups());
        if header.num_features != num_features || header.num_groups != num_groups {
            return Err(DeserializeError::CorruptPayload(format!(
                "header declares {} features x {} groups, payload has {} x {}",
                header.num_features, header.num_groups, num_features, num_groups
            )));
        }
        Ok(file)
    }

    /// Decode the JSON container.
    pub fn from_json(bytes: &[u8]) -> Result<Self, DeserializeError> {
        let Payload::V1(payload): Payload = serde_json::from_slice(bytes)?;
        Ok(Self { payload })
    }

    /// Encode in the native container.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SerializeError> {
        let mut header =
            FormatHeader::new(self.model_kind(), self.num_features(), self.num_groups());
        header.flags = self.content_flags();
        NativeCodec::new().serialize(header, &Payload::V1(self.payload.clone()))
    }

    /// Encode in the JSON container.
    pub fn to_json(&self) -> Result<String, SerializeError> {
        let payload = Payload::V1(self.payload.clone());
        Ok(serde_json::to_string_pretty(&payload)?)
    }

    /// Write the native container to disk.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SerializeError> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    /// Write the JSON container to disk.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), SerializeError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Model kind implied by the task.
    pub fn model_kind(&self) -> ModelKind {
        match self.payload.task {
            TaskPayload::Regressor => ModelKind::Regressor,
            TaskPayload::BinaryClassifier { .. } => ModelKind::BinaryClassifier,
            TaskPayload::MulticlassClassifier { .. } => ModelKind::MulticlassClassifier,
        }
    }

    /// Header flags describing the payload: tree model, text features.
    pub fn content_flags(&self) -> FormatFlags {
        let mut flags = FormatFlags::empty();
        if matches!(self.payload.model, InnerModelPayload::Tree(_)) {
            flags.set(FormatFlags::TREE_MODEL);
        }
        let has_text = self
            .payload
            .feature_groups
            .iter()
            .any(|group| matches!(group, FeatureGroupPayload::BagOfWords { .. }));
        if has_text {
            flags.set(FormatFlags::HAS_TEXT);
        }
        flags
    }

    /// Number of features the feature groups produce.
    pub fn num_features(&self) -> u32 {
        self.payload
            .feature_groups
            .iter()
            .map(|group| match group {
                FeatureGroupPayload::Identity { .. } | FeatureGroupPayload::Normalized { .. } => 1,
                FeatureGroupPayload::OneHotEncoded { options, .. } => options.len() + 1,
                FeatureGroupPayload::BagOfWords { tokens, .. } => tokens.len(),
            })
            .sum::<usize>() as u32
    }

    /// Number of output groups of the inner model.
    pub fn num_groups(&self) -> u32 {
        match &self.payload.model {
            InnerModelPayload::Linear(linear) => linear.num_groups,
            InnerModelPayload::Tree(forest) => forest.num_groups,
        }
    }

    /// Validate the payload and build the runtime model pieces.
    pub fn into_parts(self) -> Result<ModelParts, ValidationError> {
        let PayloadV1 {
            id,
            columns,
            task,
            feature_groups,
            model,
        } = self.payload;

        let task = convert_task(task)?;

        let columns = columns
            .into_iter()
            .map(|column| Column::new(column.name, convert_column_kind(column.kind)))
            .collect();
        let groups = feature_groups
            .into_iter()
            .enumerate()
            .map(|(group_idx, group)| convert_feature_group(group_idx, group))
            .collect::<Result<Vec<_>, _>>()?;
        let pipeline = FeaturePipeline::new(columns, groups)?;
        let n_features = pipeline.n_features();

        let inner = match model {
            InnerModelPayload::Linear(linear) => {
                InnerModel::Linear(convert_linear(linear, n_features)?)
            }
            InnerModelPayload::Tree(forest) => InnerModel::Tree(convert_forest(forest, n_features)?),
        };

        let expected = task.n_groups();
        if inner.n_groups() != expected {
            return Err(ValidationError::GroupCountMismatch {
                expected,
                actual: inner.n_groups(),
            });
        }

        Ok(ModelParts {
            id,
            task,
            pipeline,
            inner,
        })
    }
}

// ============================================================================
// Payload -> Runtime Conversion
// ============================================================================

fn convert_task(task: TaskPayload) -> Result<TaskKind, ValidationError> {
    Ok(match task {
        TaskPayload::Regressor => TaskKind::Regression,
        TaskPayload::BinaryClassifier {
            negative_class,
            positive_class,
        } => TaskKind::BinaryClassification {
            negative_class,
            positive_class,
        },
        TaskPayload::MulticlassClassifier { classes } => {
            if classes.len() < 2 {
                return Err(ValidationError::TooFewClasses(classes.len()));
            }
            TaskKind::MulticlassClassification { classes }
        }
    })
}

fn convert_column_kind(kind: ColumnKindPayload) -> ColumnKind {
    match kind {
        ColumnKindPayload::Unknown => ColumnKind::Unknown,
        ColumnKindPayload::Number => ColumnKind::Number,
        ColumnKindPayload::Enum { options } => ColumnKind::Enum { options },
        ColumnKindPayload::Text => ColumnKind::Text,
    }
}

fn convert_token(token: TokenPayload) -> Token {
    match token {
        TokenPayload::Unigram(token) => Token::Unigram(token),
        TokenPayload::Bigram(a, b) => Token::Bigram(a, b),
    }
}

fn convert_feature_group(
    group_idx: usize,
    group: FeatureGroupPayload,
) -> Result<FeatureGroup, ValidationError> {
    Ok(match group {
        FeatureGroupPayload::Identity { source_column } => FeatureGroup::Identity { source_column },
        FeatureGroupPayload::Normalized {
            source_column,
            mean,
            variance,
        } => FeatureGroup::Normalized {
            source_column,
            mean,
            variance,
        },
        FeatureGroupPayload::OneHotEncoded {
            source_column,
            options,
        } => FeatureGroup::OneHotEncoded {
            source_column,
            options,
        },
        FeatureGroupPayload::BagOfWords {
            source_column,
            tokenizer,
            tokens,
        } => {
            let tokenizer = match tokenizer {
                TokenizerPayload::Alphanumeric => Tokenizer::Alphanumeric,
            };
            let tokens = tokens
                .into_iter()
                .map(|BagOfWordsTokenPayload { token, idf }| BagOfWordsToken {
                    token: convert_token(token),
                    idf,
                })
                .collect();
            let group = BagOfWordsFeatureGroup::new(source_column, tokenizer, tokens).map_err(
                |token| ValidationError::DuplicateToken {
                    group_idx,
                    token: token.to_string(),
                },
            )?;
            FeatureGroup::BagOfWords(group)
        }
    })
}

fn convert_linear(
    payload: LinearPayload,
    n_features: usize,
) -> Result<LinearModel, ValidationError> {
    let LinearPayload {
        num_features,
        num_groups,
        weights,
        means,
    } = payload;
    let shape_error = ValidationError::LinearShape {
        num_features,
        num_groups,
        weights: weights.len(),
        means: means.len(),
    };

    let model = LinearModel::from_flat(weights, means, num_features as usize, num_groups as usize)
        .ok_or(shape_error)?;
    if model.n_features() != n_features {
        return Err(ValidationError::FeatureCountMismatch {
            groups: n_features,
            model: model.n_features(),
        });
    }
    Ok(model)
}

fn convert_tree(tree_idx: usize, payload: TreePayload) -> Result<Tree, ValidationError> {
    let split_types = payload
        .split_types
        .iter()
        .enumerate()
        .map(|(node, &value)| {
            SplitType::from_u8(value).ok_or(ValidationError::UnknownSplitType {
                tree_idx,
                node,
                value,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Tree::new(
        payload.split_features,
        payload.split_values,
        payload.left_children,
        payload.right_children,
        payload.default_left,
        payload.is_leaf,
        payload.leaf_values,
        split_types,
        payload.discrete_left,
        payload.examples_fractions,
    ))
}

fn convert_forest(payload: ForestPayload, n_features: usize) -> Result<Forest, ValidationError> {
    let ForestPayload {
        num_groups,
        base_scores,
        tree_groups,
        trees,
    } = payload;

    // Checked up front: zipping would drop unmatched trees.
    if tree_groups.len() != trees.len() {
        return Err(ForestValidationError::TreeGroupsLenMismatch {
            n_trees: trees.len(),
            len: tree_groups.len(),
        }
        .into());
    }

    let mut forest = Forest::new(num_groups).with_base_score(base_scores);
    for (tree_idx, (tree, group)) in trees.into_iter().zip(tree_groups).enumerate() {
        forest.push_tree(convert_tree(tree_idx, tree)?, group);
    }
    forest.validate(n_features)?;
    Ok(forest)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn native_roundtrip() {
        let file = ModelFile::new(fixtures::heart_disease_tree());
        let bytes = file.to_bytes().unwrap();
        let decoded = ModelFile::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, file);

        let (header, _): (FormatHeader, Payload) = NativeCodec::new().deserialize(&bytes).unwrap();
        assert_eq!(header.model_kind, ModelKind::BinaryClassifier);
        assert!(header.flags.contains(FormatFlags::TREE_MODEL));
        assert_eq!(header.num_features, file.num_features());
    }

    #[test]
    fn json_roundtrip_with_leading_whitespace() {
        let file = ModelFile::new(fixtures::heart_disease_linear());
        let json = format!("\n  {}", file.to_json().unwrap());
        assert_eq!(ModelFile::from_bytes(json.as_bytes()).unwrap(), file);
    }

    #[test]
    fn header_kind_must_match_task() {
        let file = ModelFile::new(fixtures::heart_disease_tree());
        let header = FormatHeader::new(ModelKind::Regressor, file.num_features(), 1);
        let bytes = NativeCodec::new()
            .serialize(header, &Payload::V1(file.payload().clone()))
            .unwrap();
        assert!(matches!(
            ModelFile::from_bytes(&bytes),
            Err(DeserializeError::KindMismatch {
                header: ModelKind::Regressor,
                payload: ModelKind::BinaryClassifier
            })
        ));
    }

    #[test]
    fn header_dimensions_must_match_payload() {
        let file = ModelFile::new(fixtures::heart_disease_tree());
        let header = FormatHeader::new(ModelKind::BinaryClassifier, 999, 1);
        let bytes = NativeCodec::new()
            .serialize(header, &Payload::V1(file.payload().clone()))
            .unwrap();
        assert!(matches!(
            ModelFile::from_bytes(&bytes),
            Err(DeserializeError::CorruptPayload(_))
        ));
    }

    #[test]
    fn content_flags_describe_the_payload() {
        let tree = ModelFile::new(fixtures::heart_disease_tree()).content_flags();
        assert_eq!(tree.bits(), FormatFlags::TREE_MODEL);

        let linear = ModelFile::new(fixtures::heart_disease_linear()).content_flags();
        assert_eq!(linear.bits(), FormatFlags::HAS_TEXT);
    }

    #[test]
    fn header_flags_must_match_payload() {
        let file = ModelFile::new(fixtures::heart_disease_linear());
        // A linear model claiming to be a tree ensemble without text features.
        let mut header = FormatHeader::new(
            ModelKind::BinaryClassifier,
            file.num_features(),
            file.num_groups(),
        );
        header.flags.set(FormatFlags::TREE_MODEL);
        let bytes = NativeCodec::new()
            .serialize(header, &Payload::V1(file.payload().clone()))
            .unwrap();
        assert!(matches!(
            ModelFile::from_bytes(&bytes),
            Err(DeserializeError::FlagsMismatch {
                header: FormatFlags::TREE_MODEL,
                payload: FormatFlags::HAS_TEXT,
            })
        ));
    }

    #[test]
    fn parts_from_valid_payloads() {
        let parts = ModelFile::new(fixtures::heart_disease_tree())
            .into_parts()
            .unwrap();
        assert_eq!(parts.inner.kind_name(), "tree");
        assert_eq!(parts.inner.n_groups(), 1);

        let parts = ModelFile::new(fixtures::iris_linear()).into_parts().unwrap();
        assert_eq!(parts.inner.n_groups(), 3);
        assert!(matches!(parts.task, TaskKind::MulticlassClassification { .. }));
    }

    #[test]
    fn rejects_wrong_group_count_for_task() {
        let mut payload = fixtures::iris_linear();
        payload.task = TaskPayload::Regressor;
        assert_eq!(
            ModelFile::new(payload).into_parts().unwrap_err(),
            ValidationError::GroupCountMismatch {
                expected: 1,
                actual: 3
            }
        );
    }

    #[test]
    fn rejects_linear_shape_mismatch() {
        let mut payload = fixtures::heart_disease_linear();
        if let InnerModelPayload::Linear(linear) = &mut payload.model {
            linear.weights.pop();
        }
        assert!(matches!(
            ModelFile::new(payload).into_parts(),
            Err(ValidationError::LinearShape { .. })
        ));
    }

    #[test]
    fn rejects_unknown_split_type() {
        let mut payload = fixtures::heart_disease_tree();
        if let InnerModelPayload::Tree(forest) = &mut payload.model {
            forest.trees[0].split_types[0] = 7;
        }
        assert_eq!(
            ModelFile::new(payload).into_parts().unwrap_err(),
            ValidationError::UnknownSplitType {
                tree_idx: 0,
                node: 0,
                value: 7
            }
        );
    }

    #[test]
    fn rejects_tree_groups_len_mismatch() {
        let mut payload = fixtures::heart_disease_tree();
        if let InnerModelPayload::Tree(forest) = &mut payload.model {
            forest.tree_groups.push(0);
        }
        assert!(matches!(
            ModelFile::new(payload).into_parts(),
            Err(ValidationError::Forest(
                ForestValidationError::TreeGroupsLenMismatch { .. }
            ))
        ));
    }

    #[test]
    fn rejects_split_on_missing_feature() {
        let mut payload = fixtures::heart_disease_tree();
        if let InnerModelPayload::Tree(forest) = &mut payload.model {
            forest.trees[0].split_features[0] = 500;
        }
        assert!(matches!(
            ModelFile::new(payload).into_parts(),
            Err(ValidationError::Forest(ForestValidationError::InvalidTree { tree_idx: 0, .. }))
        ));
    }

    #[test]
    fn rejects_duplicate_vocabulary() {
        let mut payload = fixtures::heart_disease_linear();
        for group in &mut payload.feature_groups {
            if let FeatureGroupPayload::BagOfWords { tokens, .. } = group {
                let first = tokens[0].clone();
                tokens.push(first);
            }
        }
        assert!(matches!(
            ModelFile::new(payload).into_parts(),
            Err(ValidationError::DuplicateToken { .. })
        ));
    }

    #[test]
    fn rejects_single_class_multiclass() {
        let mut payload = fixtures::iris_linear();
        payload.task = TaskPayload::MulticlassClassifier {
            classes: vec!["setosa".into()],
        };
        assert_eq!(
            ModelFile::new(payload).into_parts().unwrap_err(),
            ValidationError::TooFewClasses(1)
        );
    }
}
