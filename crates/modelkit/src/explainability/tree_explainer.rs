//! TreeSHAP explainer for tree ensembles.
//!
//! Implements the path-dependent TreeSHAP algorithm (Lundberg et al. 2018):
//! exact SHAP values in polynomial time, using the training example
//! fractions stored on every node as the background distribution.

use super::path::{self, PathItem};
use super::GroupContributions;
use crate::repr::{Forest, NodeId, Tree, TreeView};

/// TreeSHAP explainer over a forest.
pub struct TreeExplainer<'a> {
    forest: &'a Forest,
}

impl<'a> TreeExplainer<'a> {
    pub fn new(forest: &'a Forest) -> Self {
        Self { forest }
    }

    /// Expected margin for a group: base score plus every tree's expected value.
    pub fn base_value(&self, group: usize) -> f32 {
        let base = self.forest.base_score().get(group).copied().unwrap_or(0.0);
        self.forest
            .trees_with_groups()
            .filter(|(_, g)| *g as usize == group)
            .fold(base, |acc, (tree, _)| acc + tree.expected_value())
    }

    /// Contributions of every feature to every output group for one row.
    pub fn contributions(&self, features: &[f32]) -> Vec<GroupContributions> {
        let n_groups = self.forest.n_groups() as usize;
        let mut phis = vec![vec![0.0f32; features.len()]; n_groups];

        for (tree, group) in self.forest.trees_with_groups() {
            if let Some(phi) = phis.get_mut(group as usize) {
                tree_shap(tree, features, phi);
            }
        }

        let margins = self.forest.predict_row(features);
        phis.into_iter()
            .zip(margins)
            .enumerate()
            .map(|(group, (values, margin))| {
                GroupContributions::new(self.base_value(group), margin, values)
            })
            .collect()
    }
}

/// Add one tree's SHAP values for `features` into `phi`.
pub(crate) fn tree_shap(tree: &Tree, features: &[f32], phi: &mut [f32]) {
    let mut buffer = vec![PathItem::default(); path::buffer_len(tree.max_depth())];
    let mut walker = ShapWalker { tree, features, phi };
    walker.recurse(0, &mut buffer, 0, 1.0, 1.0, None);
}

struct ShapWalker<'t, 'p> {
    tree: &'t Tree,
    features: &'t [f32],
    phi: &'p mut [f32],
}

impl ShapWalker<'_, '_> {
    /// Walk the subtree at `node`.
    ///
    /// `path` starts with the parent's unique path, and the tail is scratch
    /// space for descendants.
    fn recurse(
        &mut self,
        node: NodeId,
        path: &mut [PathItem],
        mut unique_depth: usize,
        parent_zero_fraction: f32,
        parent_one_fraction: f32,
        parent_feature: Option<usize>,
    ) {
        path::extend(
            path,
            unique_depth,
            parent_zero_fraction,
            parent_one_fraction,
            parent_feature,
        );

        if self.tree.is_leaf(node) {
            let leaf_value = self.tree.leaf_value(node);
            for i in 1..=unique_depth {
                let item = path[i];
                let weight = path::unwound_sum(path, unique_depth, i);
                if let Some(slot) = item.feature.and_then(|f| self.phi.get_mut(f)) {
                    *slot += weight * (item.one_fraction - item.zero_fraction) * leaf_value;
                }
            }
            return;
        }

        let feature = self.tree.split_index(node) as usize;
        let value = self.features.get(feature).copied().unwrap_or(f32::NAN);
        let (hot, cold) = if self.tree.goes_left(node, value) {
            (self.tree.left_child(node), self.tree.right_child(node))
        } else {
            (self.tree.right_child(node), self.tree.left_child(node))
        };

        let node_fraction = self.tree.examples_fraction(node);
        let hot_zero_fraction = self.tree.examples_fraction(hot) / node_fraction;
        let cold_zero_fraction = self.tree.examples_fraction(cold) / node_fraction;
        let mut incoming_zero_fraction = 1.0;
        let mut incoming_one_fraction = 1.0;

        // A feature already on the path is unwound so it appears once.
        if let Some(previous) = (1..=unique_depth).find(|&i| path[i].feature == Some(feature)) {
            incoming_zero_fraction = path[previous].zero_fraction;
            incoming_one_fraction = path[previous].one_fraction;
            path::unwind(path, unique_depth, previous);
            unique_depth -= 1;
        }

        let (parent_path, child_path) = path.split_at_mut(unique_depth + 1);

        child_path[..parent_path.len()].copy_from_slice(parent_path);
        self.recurse(
            hot,
            child_path,
            unique_depth + 1,
            hot_zero_fraction * incoming_zero_fraction,
            incoming_one_fraction,
            Some(feature),
        );

        child_path[..parent_path.len()].copy_from_slice(parent_path);
        self.recurse(
            cold,
            child_path,
            unique_depth + 1,
            cold_zero_fraction * incoming_zero_fraction,
            0.0,
            Some(feature),
        );
    }
}
