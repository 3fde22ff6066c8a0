//! Canonical model representations.
//!
//! - [`tree`] / [`forest`]: gradient-boosted tree ensembles in SoA layout
//! - [`linear`]: linear models with per-feature training means

/// Canonical node identifier used by the tree representation.
///
/// Internally this is just an index into the tree's SoA arrays.
pub type NodeId = u32;

pub mod forest;
pub mod linear;
pub mod tree;

pub use forest::{Forest, ForestValidationError};
pub use linear::LinearModel;
pub use tree::{SplitType, Tree, TreeValidationError, TreeView, MAX_TREE_DEPTH};
