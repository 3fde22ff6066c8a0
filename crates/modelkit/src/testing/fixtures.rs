//! Small hand-built model payloads and matching inputs.
//!
//! - [`heart_disease_linear`]: binary classifier over normalized, one-hot and
//!   bag-of-words features
//! - [`heart_disease_tree`]: binary classifier, two trees with a discrete split
//! - [`iris_linear`]: three-class classifier
//! - [`housing_tree`]: regressor

use crate::io::payload::{
    BagOfWordsTokenPayload, ColumnKindPayload, ColumnPayload, FeatureGroupPayload, ForestPayload,
    InnerModelPayload, LinearPayload, PayloadV1, TaskPayload, TokenPayload, TokenizerPayload,
    TreePayload,
};
use crate::predict::PredictInput;

const CHEST_PAIN: [&str; 4] = [
    "asymptomatic",
    "atypical angina",
    "non-angina pain",
    "typical angina",
];

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn column(name: &str, kind: ColumnKindPayload) -> ColumnPayload {
    ColumnPayload {
        name: name.to_string(),
        kind,
    }
}

fn heart_disease_columns() -> Vec<ColumnPayload> {
    vec![
        column("id", ColumnKindPayload::Unknown),
        column("age", ColumnKindPayload::Number),
        column(
            "gender",
            ColumnKindPayload::Enum {
                options: strings(&["male", "female"]),
            },
        ),
        column(
            "chest_pain",
            ColumnKindPayload::Enum {
                options: strings(&CHEST_PAIN),
            },
        ),
        column("notes", ColumnKindPayload::Text),
    ]
}

fn heart_disease_task() -> TaskPayload {
    TaskPayload::BinaryClassifier {
        negative_class: "Negative".to_string(),
        positive_class: "Positive".to_string(),
    }
}

/// Appends nodes in index order.
struct NodeBuilder {
    tree: TreePayload,
}

impl NodeBuilder {
    fn new() -> Self {
        Self {
            tree: TreePayload {
                split_features: Vec::new(),
                split_values: Vec::new(),
                left_children: Vec::new(),
                right_children: Vec::new(),
                default_left: Vec::new(),
                is_leaf: Vec::new(),
                leaf_values: Vec::new(),
                split_types: Vec::new(),
                discrete_left: Vec::new(),
                examples_fractions: Vec::new(),
            },
        }
    }

    fn continuous(
        mut self,
        feature: u32,
        value: f32,
        children: (u32, u32),
        default_left: bool,
        fraction: f32,
    ) -> Self {
        self.push(feature, value, children, default_left, false, 0.0, 0, vec![], fraction);
        self
    }

    fn discrete(mut self, feature: u32, left: Vec<bool>, children: (u32, u32), fraction: f32) -> Self {
        self.push(feature, 0.0, children, false, false, 0.0, 1, left, fraction);
        self
    }

    fn leaf(mut self, value: f32, fraction: f32) -> Self {
        self.push(0, 0.0, (0, 0), false, true, value, 0, vec![], fraction);
        self
    }

    #[allow(clippy::too_many_arguments)]
    fn push(
        &mut self,
        feature: u32,
        split_value: f32,
        (left, right): (u32, u32),
        default_left: bool,
        is_leaf: bool,
        leaf_value: f32,
        split_type: u8,
        discrete_left: Vec<bool>,
        fraction: f32,
    ) {
        let tree = &mut self.tree;
        tree.split_features.push(feature);
        tree.split_values.push(split_value);
        tree.left_children.push(left);
        tree.right_children.push(right);
        tree.default_left.push(default_left);
        tree.is_leaf.push(is_leaf);
        tree.leaf_values.push(leaf_value);
        tree.split_types.push(split_type);
        tree.discrete_left.push(discrete_left);
        tree.examples_fractions.push(fraction);
    }

    fn build(self) -> TreePayload {
        self.tree
    }
}

/// Binary classifier with a linear model over 12 features:
/// normalized age, one-hot gender (3), one-hot chest pain (5), and a
/// three-token vocabulary over the notes.
pub fn heart_disease_linear() -> PayloadV1 {
    let token = |token: TokenPayload, idf: f32| BagOfWordsTokenPayload { token, idf };
    let feature_groups = vec![
        FeatureGroupPayload::Normalized {
            source_column: "age".to_string(),
            mean: 54.0,
            variance: 81.0,
        },
        FeatureGroupPayload::OneHotEncoded {
            source_column: "gender".to_string(),
            options: strings(&["male", "female"]),
        },
        FeatureGroupPayload::OneHotEncoded {
            source_column: "chest_pain".to_string(),
            options: strings(&CHEST_PAIN),
        },
        FeatureGroupPayload::BagOfWords {
            source_column: "notes".to_string(),
            tokenizer: TokenizerPayload::Alphanumeric,
            tokens: vec![
                token(TokenPayload::Unigram("pain".to_string()), 1.5),
                token(TokenPayload::Unigram("chest".to_string()), 2.0),
                token(
                    TokenPayload::Bigram("chest".to_string(), "pain".to_string()),
                    2.5,
                ),
            ],
        },
    ];

    let mut weights = vec![
        0.8, // age
        0.0, 0.3, -0.3, // gender
        0.0, 1.1, -0.2, -0.4, -0.5, // chest pain
        0.3, 0.2, 0.4, // notes
    ];
    weights.push(-0.2); // bias
    let means = vec![
        0.0, 0.0, 0.68, 0.32, 0.0, 0.48, 0.16, 0.28, 0.08, 0.1, 0.1, 0.05,
    ];

    PayloadV1 {
        id: "heart-disease-linear".to_string(),
        columns: heart_disease_columns(),
        task: heart_disease_task(),
        feature_groups,
        model: InnerModelPayload::Linear(LinearPayload {
            num_features: 12,
            num_groups: 1,
            weights,
            means,
        }),
    }
}

/// Binary classifier with two trees over identity features
/// `[age, gender index, chest pain index]`.
///
/// - tree 0: `age <= 55` → -0.4, else 0.6 (missing goes left)
/// - tree 1: chest pain is asymptomatic → (`age <= 60` → 0.5, else 1.2),
///   otherwise -0.8
pub fn heart_disease_tree() -> PayloadV1 {
    let identity = |name: &str| FeatureGroupPayload::Identity {
        source_column: name.to_string(),
    };

    let age_tree = NodeBuilder::new()
        .continuous(0, 55.0, (1, 2), true, 1.0)
        .leaf(-0.4, 0.45)
        .leaf(0.6, 0.55)
        .build();
    let chest_pain_tree = NodeBuilder::new()
        .discrete(2, vec![true, false, true, true, true], (1, 2), 1.0)
        .leaf(-0.8, 0.5)
        .continuous(0, 60.0, (3, 4), false, 0.5)
        .leaf(0.5, 0.2)
        .leaf(1.2, 0.3)
        .build();

    PayloadV1 {
        id: "heart-disease-tree".to_string(),
        columns: heart_disease_columns(),
        task: heart_disease_task(),
        feature_groups: vec![identity("age"), identity("gender"), identity("chest_pain")],
        model: InnerModelPayload::Tree(ForestPayload {
            num_groups: 1,
            base_scores: vec![-0.1],
            tree_groups: vec![0, 0],
            trees: vec![age_tree, chest_pain_tree],
        }),
    }
}

/// Three-class linear classifier over four normalized measurements.
pub fn iris_linear() -> PayloadV1 {
    let measurements = [
        ("sepal_length", 5.84, 0.68),
        ("sepal_width", 3.05, 0.19),
        ("petal_length", 3.76, 3.1),
        ("petal_width", 1.2, 0.58),
    ];

    #[rustfmt::skip]
    let weights = vec![
        -0.4,  0.1,  0.3,
         0.9, -0.6, -0.3,
        -1.5,  0.2,  1.3,
        -1.4, -0.3,  1.7,
         0.2,  1.0, -1.2, // bias
    ];

    PayloadV1 {
        id: "iris-linear".to_string(),
        columns: measurements
            .iter()
            .map(|(name, _, _)| column(name, ColumnKindPayload::Number))
            .collect(),
        task: TaskPayload::MulticlassClassifier {
            classes: strings(&["Iris Setosa", "Iris Versicolor", "Iris Virginica"]),
        },
        feature_groups: measurements
            .iter()
            .map(|&(name, mean, variance)| FeatureGroupPayload::Normalized {
                source_column: name.to_string(),
                mean,
                variance,
            })
            .collect(),
        model: InnerModelPayload::Linear(LinearPayload {
            num_features: 4,
            num_groups: 3,
            weights,
            means: vec![0.0; 4],
        }),
    }
}

/// Regressor over `[rooms, crime]`.
///
/// - tree 0: `rooms <= 6.5` → -3.0, else 5.0
/// - tree 1: `crime <= 1.0` → 1.0, else (`rooms <= 7.5` → -2.0, else 0.5)
pub fn housing_tree() -> PayloadV1 {
    let identity = |name: &str| FeatureGroupPayload::Identity {
        source_column: name.to_string(),
    };

    let rooms_tree = NodeBuilder::new()
        .continuous(0, 6.5, (1, 2), true, 1.0)
        .leaf(-3.0, 0.6)
        .leaf(5.0, 0.4)
        .build();
    let crime_tree = NodeBuilder::new()
        .continuous(1, 1.0, (1, 2), false, 1.0)
        .leaf(1.0, 0.7)
        .continuous(0, 7.5, (3, 4), true, 0.3)
        .leaf(-2.0, 0.2)
        .leaf(0.5, 0.1)
        .build();

    PayloadV1 {
        id: "housing-tree".to_string(),
        columns: vec![
            column("rooms", ColumnKindPayload::Number),
            column("crime", ColumnKindPayload::Number),
        ],
        task: TaskPayload::Regressor,
        feature_groups: vec![identity("rooms"), identity("crime")],
        model: InnerModelPayload::Tree(ForestPayload {
            num_groups: 1,
            base_scores: vec![22.5],
            tree_groups: vec![0, 0],
            trees: vec![rooms_tree, crime_tree],
        }),
    }
}

/// Input for the heart disease models.
pub fn heart_disease_input(age: f64) -> PredictInput {
    let mut input = PredictInput::new();
    input.insert("id".into(), "patient-1".into());
    input.insert("age".into(), age.into());
    input.insert("gender".into(), "male".into());
    input.insert("chest_pain".into(), "asymptomatic".into());
    input.insert("notes".into(), "Chest pain at rest".into());
    input
}

/// Input for the iris model.
pub fn iris_input(measurements: [f64; 4]) -> PredictInput {
    ["sepal_length", "sepal_width", "petal_length", "petal_width"]
        .into_iter()
        .zip(measurements)
        .map(|(name, value)| (name.to_string(), value.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ModelFile;

    #[test]
    fn fixtures_are_valid_models() {
        for payload in [
            heart_disease_linear(),
            heart_disease_tree(),
            iris_linear(),
            housing_tree(),
        ] {
            let id = payload.id.clone();
            let result = ModelFile::new(payload).into_parts();
            assert!(result.is_ok(), "{id}: {:?}", result.err());
        }
    }
}
