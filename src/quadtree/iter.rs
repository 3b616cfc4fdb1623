//! Depth-first traversal yielding each data tile with its normalized
//! position and absolute scale.
//!
//! Grounded in `original_source/Source/main.cpp`'s traversal, which prints
//! `"Scale: X, Position: (x,y)"` for each visited tile; the iterator here is
//! that traversal's commented-out replacement, specified directly rather
//! than reverse-engineered from dead code.

use std::fmt::{self, Display, Formatter};

use super::node::{NodeKey, RelPos, Slot};
use super::QuadTree;
use crate::field::FieldProvider;

/// One tile visited by a [`TileIterator`]: which node/slot it came from, its
/// normalized bottom-left corner as a fraction of the root's side, and its
/// absolute scale.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TileVisit {
    /// The node owning the visited tile.
    pub node: NodeKey,
    /// `Some(slot)` for an ordinary data tile, `None` for a node's own
    /// multigrid reduction tile (only emitted when `include_multigrid` is
    /// set).
    pub slot: Option<RelPos>,
    /// Bottom-left corner, as a fraction of the root's side length.
    pub x_norm: f64,
    /// Bottom-left corner, as a fraction of the root's side length.
    pub y_norm: f64,
    /// Tree depth this tile's resolution corresponds to.
    pub absolute_scale: u8,
}

impl Display for TileVisit {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Scale: {}, Position: ({}, {})",
            self.absolute_scale, self.x_norm, self.y_norm
        )
    }
}

/// A depth-first, one-shot traversal of a [`QuadTree`]'s data tiles.
///
/// Not restartable: once consumed, construct a new one via
/// [`QuadTree::iter`].
#[derive(Debug)]
pub struct TileIterator {
    visits: std::vec::IntoIter<TileVisit>,
}

impl Iterator for TileIterator {
    type Item = TileVisit;

    fn next(&mut self) -> Option<Self::Item> {
        self.visits.next()
    }
}

impl<P: FieldProvider> QuadTree<P> {
    /// Builds a fresh depth-first traversal of this tree's data tiles.
    ///
    /// When `include_multigrid` is set, each visited node's own multigrid
    /// reduction tile is emitted immediately before its children are
    /// descended into.
    #[must_use]
    pub fn iter(&self, include_multigrid: bool) -> TileIterator {
        let mut visits = Vec::new();
        self.visit_node(self.root, 0.0, 0.0, include_multigrid, &mut visits);
        TileIterator {
            visits: visits.into_iter(),
        }
    }

    fn visit_node(
        &self,
        node: NodeKey,
        x0: f64,
        y0: f64,
        include_multigrid: bool,
        out: &mut Vec<TileVisit>,
    ) {
        let scale = self.nodes.get_raw(node).expect("valid key").scale;
        if include_multigrid {
            out.push(TileVisit {
                node,
                slot: None,
                x_norm: x0,
                y_norm: y0,
                absolute_scale: scale,
            });
        }

        let half = 1.0 / f64::from(1u32 << (scale + 1));
        for pos in [RelPos::Ul, RelPos::Ur, RelPos::Dl, RelPos::Dr] {
            let (dx, dy) = match pos {
                RelPos::Ul => (0.0, half),
                RelPos::Ur => (half, half),
                RelPos::Dl => (0.0, 0.0),
                RelPos::Dr => (half, 0.0),
                RelPos::Head => unreachable!("Head is not a quadrant"),
            };
            let (cx, cy) = (x0 + dx, y0 + dy);
            let child_slot = {
                let guard = self.nodes.get_raw(node).expect("valid key");
                match guard.slots[pos.slot_index()] {
                    Slot::Child(ch) => Some(ch),
                    Slot::Data(_) => None,
                }
            };
            match child_slot {
                Some(child) => self.visit_node(child, cx, cy, include_multigrid, out),
                None => out.push(TileVisit {
                    node,
                    slot: Some(pos),
                    x_norm: cx,
                    y_norm: cy,
                    absolute_scale: scale + 1,
                }),
            }
        }
    }
}
