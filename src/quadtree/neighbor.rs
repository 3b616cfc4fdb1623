//! Cross-scale neighbor search — the hard algorithm.
//!
//! No neighbor-finding routine exists anywhere in
//! `original_source/Source/BidirQuadTree.hpp`; this is new code, grounded
//! directly in the recursive procedure and sibling table given for it.

use super::node::{NodeKey, RelPos, Slot};
use super::QuadTree;
use crate::field::FieldProvider;

/// One of the four cardinal directions a neighbor can be sought in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Toward decreasing row.
    Up,
    /// Toward increasing row.
    Down,
    /// Toward decreasing column.
    Left,
    /// Toward increasing column.
    Right,
}

impl Direction {
    fn index(self) -> usize {
        match self {
            Self::Up => 0,
            Self::Down => 1,
            Self::Left => 2,
            Self::Right => 3,
        }
    }

    fn reflect(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// The node or data a neighbor query resolved to; `None` only accompanies
/// [`NeighborQualifier::OutOfBounds`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NeighborTarget {
    /// A node at the queried scale.
    Node(NodeKey),
    /// Tile data held directly in `parent`'s quadrant `slot`.
    Data {
        /// The node owning the data slot.
        parent: NodeKey,
        /// Which of the owner's four slots holds the data.
        slot: RelPos,
    },
    /// The query walked past the root.
    None,
}

/// Describes what kind of result [`QuadTree::neighbor`] found.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NeighborQualifier {
    /// The neighbor is a child of the same parent, at the queried scale.
    SameLevelChild,
    /// The neighbor was found one recursive hop up, at the queried scale.
    SameLevelNode,
    /// The neighbor is data at the queried scale (no finer child exists).
    IsData,
    /// Only a coarser ancestor's reduction is available; the caller must
    /// prolongate it before use.
    InterpNeeded,
    /// The query walked past the root; apply the domain boundary condition.
    OutOfBounds,
}

fn sibling(rel_pos: RelPos, dir: Direction) -> Option<RelPos> {
    use Direction::{Down, Left, Right, Up};
    use RelPos::{Dl, Dr, Ul, Ur};
    match (rel_pos, dir) {
        (Ul, Down) => Some(Dl),
        (Ul, Right) => Some(Ur),
        (Ur, Down) => Some(Dr),
        (Ur, Left) => Some(Ul),
        (Dl, Up) => Some(Ul),
        (Dl, Right) => Some(Dr),
        (Dr, Up) => Some(Ur),
        (Dr, Left) => Some(Dl),
        _ => None,
    }
}

impl<P: FieldProvider> QuadTree<P> {
    /// Finds the node or data touching `node`'s face in direction `dir`.
    ///
    /// `node` must not be the root (the root has no face in any cardinal
    /// direction relative to a parent); calling this on the root returns
    /// `(NeighborTarget::None, NeighborQualifier::OutOfBounds)`.
    pub fn neighbor(&self, node: NodeKey, dir: Direction) -> (NeighborTarget, NeighborQualifier) {
        let (rel_pos, parent_key) = {
            let guard = self.nodes.get_raw(node).expect("valid node key");
            (guard.rel_pos, guard.parent)
        };
        let parent_key = match parent_key {
            Some(p) => p,
            None => return (NeighborTarget::None, NeighborQualifier::OutOfBounds),
        };

        let cache_key = (parent_key, rel_pos);
        if let Some(hit) = self.cache[dir.index()].read().get(&cache_key) {
            return *hit;
        }

        let result = self.compute_neighbor(parent_key, rel_pos, dir);
        self.cache[dir.index()].write().insert(cache_key, result);
        result
    }

    fn compute_neighbor(
        &self,
        parent_key: NodeKey,
        rel_pos: RelPos,
        dir: Direction,
    ) -> (NeighborTarget, NeighborQualifier) {
        if let Some(s) = sibling(rel_pos, dir) {
            return self.read_slot(parent_key, s, NeighborQualifier::SameLevelChild, NeighborQualifier::IsData);
        }

        // The neighbor lies outside `parent_key`'s quadrant; look for
        // `parent_key`'s own neighbor in the same direction first.
        let (anc_target, anc_q) = self.neighbor(parent_key, dir);
        if anc_q == NeighborQualifier::OutOfBounds {
            return (NeighborTarget::None, NeighborQualifier::OutOfBounds);
        }

        let parent_scale = self.nodes.get_raw(parent_key).expect("valid key").scale;
        let anc_scale = self.effective_scale(&anc_target);

        if anc_scale == parent_scale {
            match anc_target {
                NeighborTarget::Node(anc_key) => {
                    let refl = dir.reflect();
                    match sibling(rel_pos, refl) {
                        Some(target_slot) => self.read_slot(
                            anc_key,
                            target_slot,
                            NeighborQualifier::SameLevelNode,
                            NeighborQualifier::IsData,
                        ),
                        None => (NeighborTarget::None, NeighborQualifier::OutOfBounds),
                    }
                }
                // `anc` is itself data at `parent_key`'s scale: there is no
                // finer child to descend into, so this is the coarsest
                // available tile relative to the original node, one scale
                // up from it.
                NeighborTarget::Data { .. } => (anc_target, NeighborQualifier::InterpNeeded),
                NeighborTarget::None => unreachable!("OutOfBounds already handled above"),
            }
        } else {
            // `anc` already resolved to something coarser than `parent_key`;
            // it is coarser still relative to the original node.
            (anc_target, NeighborQualifier::InterpNeeded)
        }
    }

    fn read_slot(
        &self,
        owner: NodeKey,
        slot: RelPos,
        if_child: NeighborQualifier,
        if_data: NeighborQualifier,
    ) -> (NeighborTarget, NeighborQualifier) {
        let guard = self.nodes.get_raw(owner).expect("valid key");
        match guard.slots[slot.slot_index()] {
            Slot::Child(ch) => (NeighborTarget::Node(ch), if_child),
            Slot::Data(_) => (NeighborTarget::Data { parent: owner, slot }, if_data),
        }
    }

    fn effective_scale(&self, target: &NeighborTarget) -> u8 {
        match target {
            NeighborTarget::Node(k) => self.nodes.get_raw(*k).expect("valid key").scale,
            NeighborTarget::Data { parent, .. } => {
                self.nodes.get_raw(*parent).expect("valid key").scale + 1
            }
            NeighborTarget::None => unreachable!("OutOfBounds is filtered out before this call"),
        }
    }

    /// Clears every direction's neighbor cache. Called after any structural
    /// mutation in full, rather than tracking which cache entries actually
    /// depend on the mutated lineage — a conservative superset of the
    /// required invalidation.
    pub(super) fn invalidate_neighbor_cache(&self) {
        for dir_cache in &self.cache {
            dir_cache.write().clear();
        }
        log::debug!("neighbor cache invalidated");
    }
}
