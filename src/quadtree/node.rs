//! The quadtree's node type: four tagged data-vs-child slots plus a
//! multigrid reduction, grounded in `original_source/Source/BidirQuadTree.hpp`'s
//! `child_ptr` union and `node_t` struct (`redux`, `parent`, `scale`,
//! `is_node_ptr`).

use crate::bitset::BitSet8;
use crate::field::FieldSet;
use crate::pool::PoolKey;

/// A stable key into the tree's node [`Pool`](crate::pool::Pool).
pub type NodeKey = PoolKey;

/// A node's position inside its parent. `Head` only ever appears on the root,
/// which has no parent slot to occupy.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RelPos {
    /// Upper-left quadrant.
    Ul,
    /// Upper-right quadrant.
    Ur,
    /// Lower-left quadrant.
    Dl,
    /// Lower-right quadrant.
    Dr,
    /// The root node, which has no parent.
    Head,
}

impl RelPos {
    /// Maps a quadrant position to its slot index, `{Ul=0, Ur=1, Dl=2, Dr=3}`.
    ///
    /// # Panics
    /// Panics if called on `Head`, which does not occupy a slot.
    #[must_use]
    pub fn slot_index(self) -> usize {
        match self {
            Self::Ul => 0,
            Self::Ur => 1,
            Self::Dl => 2,
            Self::Dr => 3,
            Self::Head => panic!("Head has no slot index"),
        }
    }
}

/// A quadrant slot: either owned tile data, or a reference to a finer child
/// node occupying that quadrant.
#[derive(Debug)]
pub enum Slot {
    /// Raw tile data at this quadrant's resolution.
    Data(FieldSet),
    /// A child node subdividing this quadrant further.
    Child(NodeKey),
}

impl Slot {
    /// Returns `true` if this slot is a [`Slot::Child`].
    #[must_use]
    pub fn is_child(&self) -> bool {
        matches!(self, Self::Child(_))
    }
}

/// A node of the tree: four quadrant slots, a back-reference to the parent,
/// and the multigrid-coarsened representation of the subtree rooted here.
#[derive(Debug)]
pub struct QuadNode {
    /// Tree depth; `0` at the root.
    pub scale: u8,
    /// This node's position inside its parent (`Head` only at the root).
    pub rel_pos: RelPos,
    /// The parent node, or `None` only at the root.
    pub parent: Option<NodeKey>,
    /// The multigrid-coarsened representation of this subtree.
    pub redux: FieldSet,
    /// The four quadrant slots, indexed by [`RelPos::slot_index`].
    pub slots: [Slot; 4],
    /// Bit `i` set iff `slots[i]` is a [`Slot::Child`]. Redundant with the
    /// slot tags themselves; kept as a fast scan key, per
    /// `original_source/Source/BidirQuadTree.hpp`'s `is_node_ptr`.
    pub is_child: BitSet8,
}

impl QuadNode {
    pub(super) fn set_child_bit(&mut self, pos: RelPos, is_child: bool) {
        let i = pos.slot_index() as u32;
        if is_child {
            self.is_child.set(i);
        } else {
            self.is_child.clear(i);
        }
    }
}
