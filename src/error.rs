//! Error types returned by fallible [`QuadTree`](crate::quadtree::QuadTree) operations.
//!
//! Each failing operation family gets its own small `Copy + Debug + Display
//! + Error` enum rather than one crate-wide error type, so a caller matching
//! on the result of `branch` never has to account for variants that only
//! `prune` or `grow_to_resolution` can produce.

use core::fmt::{self, Display, Formatter};

/// The error type returned by [`QuadTree::branch`](crate::quadtree::QuadTree::branch).
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum BranchError {
    /// The target slot already holds a child node.
    AlreadyBranched,
}
impl Display for BranchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::AlreadyBranched => "slot already holds a child node",
        })
    }
}
impl std::error::Error for BranchError {}

/// The error type returned by [`QuadTree::prune`](crate::quadtree::QuadTree::prune).
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum PruneError {
    /// At least one of the node's four slots is still a child.
    PruneHasChildren,
    /// The root node was passed; it has no parent slot to collapse into.
    PruneRoot,
}
impl Display for PruneError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::PruneHasChildren => "cannot prune a node that still has child slots",
            Self::PruneRoot => "cannot prune the root node",
        })
    }
}
impl std::error::Error for PruneError {}

/// The error type returned by [`QuadTree::grow_to_resolution`](crate::quadtree::QuadTree::grow_to_resolution).
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum GrowError {
    /// A slot below the target depth was already a child, so growth cannot
    /// assume it is descending through a pristine subtree.
    GrowIntoExistingSubtree,
}
impl Display for GrowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::GrowIntoExistingSubtree => {
                "grow_to_resolution encountered a child slot below the target depth"
            }
        })
    }
}
impl std::error::Error for GrowError {}
