//! Explainability: per-feature contributions to model margins.
//!
//! - [`LinearExplainer`]: closed-form contributions for linear models
//! - [`TreeExplainer`]: path-dependent TreeSHAP for tree ensembles
//! - [`contributions`]: regrouping raw feature values into
//!   per-column entries for prediction outputs
//!
//! `output` is the margin the model itself predicts for the row, so for every
//! output group `baseline + sum(values) == output` holds only as far as the
//! explainer is exact.

pub mod contributions;
mod linear_explainer;
mod path;
mod tree_explainer;

pub use contributions::regroup;
pub use linear_explainer::LinearExplainer;
pub use tree_explainer::TreeExplainer;

use crate::inference::InnerModel;

/// Contributions of every feature to one output group, in margin space.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupContributions {
    /// Expected margin over the training distribution.
    pub baseline: f32,
    /// Margin for the explained row.
    pub output: f32,
    /// One value per model feature.
    pub values: Vec<f32>,
}

impl GroupContributions {
    pub(crate) fn new(baseline: f32, output: f32, values: Vec<f32>) -> Self {
        Self {
            baseline,
            output,
            values,
        }
    }
}

/// Explain one feature row with the explainer matching the model kind.
pub fn explain(model: &InnerModel, features: &[f32]) -> Vec<GroupContributions> {
    match model {
        InnerModel::Linear(linear) => LinearExplainer::new(linear).contributions(features),
        InnerModel::Tree(forest) => TreeExplainer::new(forest).contributions(features),
    }
}
