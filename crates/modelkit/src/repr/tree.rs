//! Canonical tree representation (SoA) and read-only tree interface.
//!
//! This module provides:
//! - [`Tree`]: Immutable SoA tree storage for efficient traversal
//! - [`TreeView`]: Read-only trait for tree access and traversal
//! - [`TreeValidationError`]: Structural validation errors

// Allow many constructor arguments for creating trees with all their fields.
#![allow(clippy::too_many_arguments)]

use super::NodeId;

// ============================================================================
// Split Type
// ============================================================================

/// Type of split in a decision tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum SplitType {
    /// Number split: go left if `value <= split_value`.
    #[default]
    Continuous = 0,
    /// Enum split: look up the direction for the enum index.
    Discrete = 1,
}

impl SplitType {
    /// Convert from u8, returning None for unknown values.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Continuous),
            1 => Some(Self::Discrete),
            _ => None,
        }
    }
}

// ============================================================================
// TreeView Trait
// ============================================================================

/// Read-only view of a tree for traversal.
///
/// Provides the minimal interface needed to traverse a tree from root to leaf
/// and to walk both children for explanations.
pub trait TreeView {
    /// Number of nodes in the tree.
    fn n_nodes(&self) -> usize;

    /// Check if a node is a leaf.
    fn is_leaf(&self, node: NodeId) -> bool;

    /// Get the feature index for a split node.
    fn split_index(&self, node: NodeId) -> u32;

    /// Get the split value for a continuous split.
    fn split_value(&self, node: NodeId) -> f32;

    fn left_child(&self, node: NodeId) -> NodeId;

    fn right_child(&self, node: NodeId) -> NodeId;

    /// Direction for missing values at a continuous split.
    fn default_left(&self, node: NodeId) -> bool;

    fn split_type(&self, node: NodeId) -> SplitType;

    /// Whether enum index `index` goes left at a discrete split.
    ///
    /// Indices the split has no entry for go right.
    fn discrete_goes_left(&self, node: NodeId, index: usize) -> bool;

    /// Get the leaf value at a leaf node.
    fn leaf_value(&self, node: NodeId) -> f32;

    /// Fraction of training examples that reached a node.
    fn examples_fraction(&self, node: NodeId) -> f32;

    /// Decide the direction taken at a split node for a feature value.
    ///
    /// Continuous: NaN follows the missing direction, otherwise
    /// `value <= split_value` goes left. Discrete: the value is an enum
    /// index (0 = missing) looked up in the split's direction table.
    #[inline]
    fn goes_left(&self, node: NodeId, value: f32) -> bool {
        match self.split_type(node) {
            SplitType::Continuous => {
                if value.is_nan() {
                    self.default_left(node)
                } else {
                    value <= self.split_value(node)
                }
            }
            // `as` saturates: NaN and negatives map to index 0 (missing).
            SplitType::Discrete => self.discrete_goes_left(node, value as usize),
        }
    }

    /// Traverse the tree to find the leaf node for a feature row.
    ///
    /// Features beyond the end of the row are treated as missing.
    #[inline]
    fn traverse_to_leaf(&self, features: &[f32]) -> NodeId {
        let mut node = 0;

        while !self.is_leaf(node) {
            let feat_idx = self.split_index(node) as usize;
            let fvalue = features.get(feat_idx).copied().unwrap_or(f32::NAN);

            node = if self.goes_left(node, fvalue) {
                self.left_child(node)
            } else {
                self.right_child(node)
            };
        }

        node
    }
}

// ============================================================================
// TreeValidationError
// ============================================================================

/// Deepest node a valid tree may contain (the root is at depth 0).
///
/// Expected values and TreeSHAP recurse once per level and TreeSHAP's path
/// buffer grows with the square of the depth.
pub const MAX_TREE_DEPTH: usize = 128;

/// Structural validation errors for [`Tree`].
#[derive(Debug, Clone, PartialEq)]
pub enum TreeValidationError {
    /// Tree has no nodes.
    EmptyTree,
    /// Node arrays disagree in length.
    ArrayLenMismatch {
        field: &'static str,
        len: usize,
        n_nodes: usize,
    },
    /// A child pointer references an out-of-bounds node.
    ChildOutOfBounds {
        node: NodeId,
        side: &'static str,
        child: NodeId,
        n_nodes: usize,
    },
    /// A node references itself as a child.
    SelfLoop { node: NodeId },
    /// A node was reached by more than one path.
    DuplicateVisit { node: NodeId },
    /// A cycle was detected during traversal.
    CycleDetected { node: NodeId },
    /// A node exists in storage but is unreachable from the root.
    UnreachableNode { node: NodeId },
    /// A split references a feature the model does not produce.
    FeatureOutOfBounds {
        node: NodeId,
        feature: u32,
        n_features: usize,
    },
    /// A node has a non-positive or non-finite examples fraction.
    InvalidExamplesFraction { node: NodeId, fraction: f32 },
    /// A node lies deeper than [`MAX_TREE_DEPTH`].
    TooDeep { node: NodeId, depth: usize, max: usize },
}

// ============================================================================
// Tree
// ============================================================================

/// Structure-of-Arrays tree storage for efficient traversal.
///
/// Stores tree nodes in flat arrays for cache-friendly traversal.
/// Child indices are local to this tree (0 = root).
#[derive(Debug, Clone)]
pub struct Tree {
    split_indices: Box<[u32]>,
    split_values: Box<[f32]>,
    left_children: Box<[u32]>,
    right_children: Box<[u32]>,
    default_left: Box<[bool]>,
    is_leaf: Box<[bool]>,
    leaf_values: Box<[f32]>,
    split_types: Box<[SplitType]>,
    discrete_left: Box<[Box<[bool]>]>,
    examples_fractions: Box<[f32]>,
}

impl Tree {
    /// Create a new tree from parallel arrays.
    ///
    /// Lengths are not checked here; call [`Tree::validate`] before using a
    /// tree built from untrusted data.
    pub fn new(
        split_indices: Vec<u32>,
        split_values: Vec<f32>,
        left_children: Vec<u32>,
        right_children: Vec<u32>,
        default_left: Vec<bool>,
        is_leaf: Vec<bool>,
        leaf_values: Vec<f32>,
        split_types: Vec<SplitType>,
        discrete_left: Vec<Vec<bool>>,
        examples_fractions: Vec<f32>,
    ) -> Self {
        Self {
            split_indices: split_indices.into_boxed_slice(),
            split_values: split_values.into_boxed_slice(),
            left_children: left_children.into_boxed_slice(),
            right_children: right_children.into_boxed_slice(),
            default_left: default_left.into_boxed_slice(),
            is_leaf: is_leaf.into_boxed_slice(),
            leaf_values: leaf_values.into_boxed_slice(),
            split_types: split_types.into_boxed_slice(),
            discrete_left: discrete_left
                .into_iter()
                .map(Vec::into_boxed_slice)
                .collect(),
            examples_fractions: examples_fractions.into_boxed_slice(),
        }
    }

    /// A tree with a single leaf.
    pub fn leaf(value: f32) -> Self {
        Self::new(
            vec![0],
            vec![0.0],
            vec![0],
            vec![0],
            vec![false],
            vec![true],
            vec![value],
            vec![SplitType::Continuous],
            vec![Vec::new()],
            vec![1.0],
        )
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Validate structural invariants for this tree.
    ///
    /// Checks array lengths, child bounds, that the nodes form a tree rooted
    /// at 0 no deeper than [`MAX_TREE_DEPTH`], that split features are below
    /// `n_features`, and that every examples fraction is positive.
    pub fn validate(&self, n_features: usize) -> Result<(), TreeValidationError> {
        let n_nodes = self.is_leaf.len();
        if n_nodes == 0 {
            return Err(TreeValidationError::EmptyTree);
        }

        let lens = [
            ("split_features", self.split_indices.len()),
            ("split_values", self.split_values.len()),
            ("left_children", self.left_children.len()),
            ("right_children", self.right_children.len()),
            ("default_left", self.default_left.len()),
            ("leaf_values", self.leaf_values.len()),
            ("split_types", self.split_types.len()),
            ("discrete_left", self.discrete_left.len()),
            ("examples_fractions", self.examples_fractions.len()),
        ];
        for (field, len) in lens {
            if len != n_nodes {
                return Err(TreeValidationError::ArrayLenMismatch { field, len, n_nodes });
            }
        }

        for (node, &fraction) in self.examples_fractions.iter().enumerate() {
            if !(fraction.is_finite() && fraction > 0.0) {
                return Err(TreeValidationError::InvalidExamplesFraction {
                    node: node as NodeId,
                    fraction,
                });
            }
        }

        // Iterative DFS with color marking.
        // 0 = unvisited, 1 = visiting, 2 = done
        let mut color = vec![0u8; n_nodes];
        let mut stack: Vec<(NodeId, u8, usize)> = vec![(0, 0, 0)];

        while let Some((node, phase, depth)) = stack.pop() {
            let node_usize = node as usize;

            if phase == 1 {
                color[node_usize] = 2;
                continue;
            }

            match color[node_usize] {
                0 => {}
                1 => return Err(TreeValidationError::CycleDetected { node }),
                _ => return Err(TreeValidationError::DuplicateVisit { node }),
            }

            if depth > MAX_TREE_DEPTH {
                return Err(TreeValidationError::TooDeep {
                    node,
                    depth,
                    max: MAX_TREE_DEPTH,
                });
            }

            color[node_usize] = 1;
            stack.push((node, 1, depth));

            if self.is_leaf(node) {
                continue;
            }

            let feature = self.split_index(node);
            if feature as usize >= n_features {
                return Err(TreeValidationError::FeatureOutOfBounds {
                    node,
                    feature,
                    n_features,
                });
            }

            let left = self.left_child(node);
            let right = self.right_child(node);
            if left == node || right == node {
                return Err(TreeValidationError::SelfLoop { node });
            }
            for (side, child) in [("left", left), ("right", right)] {
                if child as usize >= n_nodes {
                    return Err(TreeValidationError::ChildOutOfBounds {
                        node,
                        side,
                        child,
                        n_nodes,
                    });
                }
            }

            stack.push((right, 0, depth + 1));
            stack.push((left, 0, depth + 1));
        }

        if let Some(node) = color.iter().position(|&c| c == 0) {
            return Err(TreeValidationError::UnreachableNode { node: node as NodeId });
        }

        Ok(())
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Maximum depth of the tree (a single leaf has depth 0).
    pub fn max_depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(0 as NodeId, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            if self.is_leaf(node) {
                max = max.max(depth);
            } else {
                stack.push((self.left_child(node), depth + 1));
                stack.push((self.right_child(node), depth + 1));
            }
        }
        max
    }

    /// Expected leaf value over the training distribution.
    ///
    /// Each child is weighted by its share of its parent's examples.
    pub fn expected_value(&self) -> f32 {
        self.expected_value_from(0)
    }

    fn expected_value_from(&self, node: NodeId) -> f32 {
        if self.is_leaf(node) {
            return self.leaf_value(node);
        }
        let parent = self.examples_fraction(node);
        let left = self.left_child(node);
        let right = self.right_child(node);
        (self.examples_fraction(left) / parent) * self.expected_value_from(left)
            + (self.examples_fraction(right) / parent) * self.expected_value_from(right)
    }

    /// Predict the leaf value for a feature row.
    #[inline]
    pub fn predict_row(&self, features: &[f32]) -> f32 {
        self.leaf_value(self.traverse_to_leaf(features))
    }
}

// =============================================================================
// TreeView for Tree
// =============================================================================

impl TreeView for Tree {
    #[inline]
    fn n_nodes(&self) -> usize {
        self.is_leaf.len()
    }

    #[inline]
    fn is_leaf(&self, node: NodeId) -> bool {
        self.is_leaf[node as usize]
    }

    #[inline]
    fn split_index(&self, node: NodeId) -> u32 {
        self.split_indices[node as usize]
    }

    #[inline]
    fn split_value(&self, node: NodeId) -> f32 {
        self.split_values[node as usize]
    }

    #[inline]
    fn left_child(&self, node: NodeId) -> NodeId {
        self.left_children[node as usize]
    }

    #[inline]
    fn right_child(&self, node: NodeId) -> NodeId {
        self.right_children[node as usize]
    }

    #[inline]
    fn default_left(&self, node: NodeId) -> bool {
        self.default_left[node as usize]
    }

    #[inline]
    fn split_type(&self, node: NodeId) -> SplitType {
        self.split_types[node as usize]
    }

    #[inline]
    fn discrete_goes_left(&self, node: NodeId, index: usize) -> bool {
        self.discrete_left[node as usize]
            .get(index)
            .copied()
            .unwrap_or(false)
    }

    #[inline]
    fn leaf_value(&self, node: NodeId) -> f32 {
        self.leaf_values[node as usize]
    }

    #[inline]
    fn examples_fraction(&self, node: NodeId) -> f32 {
        self.examples_fractions[node as usize]
    }
}
