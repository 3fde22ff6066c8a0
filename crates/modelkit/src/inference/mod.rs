//! Inference: feature row → margins → task outputs.
//!
//! [`InnerModel`] dispatches to the linear or tree-ensemble representation;
//! [`OutputTransform`] maps margins to probabilities.

pub mod transform;

pub use transform::OutputTransform;

use crate::repr::{Forest, LinearModel};

/// The fitted predictor inside a model.
#[derive(Debug, Clone)]
pub enum InnerModel {
    Linear(LinearModel),
    Tree(Forest),
}

impl InnerModel {
    /// Number of output groups (margins per row).
    pub fn n_groups(&self) -> usize {
        match self {
            InnerModel::Linear(model) => model.n_groups(),
            InnerModel::Tree(forest) => forest.n_groups() as usize,
        }
    }

    /// Raw margins for one feature row.
    pub fn margins(&self, features: &[f32]) -> Vec<f32> {
        match self {
            InnerModel::Linear(model) => model.predict_row(features),
            InnerModel::Tree(forest) => forest.predict_row(features),
        }
    }

    /// Short name for logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            InnerModel::Linear(_) => "linear",
            InnerModel::Tree(_) => "tree",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repr::Tree;
    use ndarray::array;

    #[test]
    fn dispatches_to_representation() {
        let linear = InnerModel::Linear(LinearModel::from_array(array![[2.0], [1.0]], vec![0.0]));
        assert_eq!(linear.n_groups(), 1);
        assert_eq!(linear.margins(&[3.0]), vec![7.0]);
        assert_eq!(linear.kind_name(), "linear");

        let mut forest = Forest::new(1).with_base_score(vec![0.5]);
        forest.push_tree(Tree::leaf(1.0), 0);
        let tree = InnerModel::Tree(forest);
        assert_eq!(tree.margins(&[]), vec![1.5]);
        assert_eq!(tree.kind_name(), "tree");
    }
}
