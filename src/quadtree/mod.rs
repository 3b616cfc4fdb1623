//! The bidirectional quadtree: parent-linked, 2:1-refined, with branch,
//! prune, grow-to-resolution and cross-scale neighbor search.
//!
//! Grounded in `original_source/Source/BidirQuadTree.hpp`'s `BidirQuadTree<G>`
//! (a `std::vector<node_t>` arena plus a `shared_ptr<G> Generator`) and, for
//! the arena-with-stable-keys idea itself, the teacher crate's
//! `octree`/`quadtree` node modules — adapted here to a fixed branching
//! factor of four, a tagged `Slot` union in place of a raw `child_ptr`
//! union, and `PoolKey`s in place of pointers.

mod iter;
mod neighbor;
mod node;

pub use iter::{TileIterator, TileVisit};
pub use neighbor::{Direction, NeighborQualifier, NeighborTarget};
pub use node::{NodeKey, QuadNode, RelPos, Slot};

use std::collections::HashMap;

use parking_lot::{Mutex, RwLock};

use crate::error::{BranchError, GrowError, PruneError};
use crate::field::FieldProvider;
use crate::pool::Pool;
use crate::tile::TILE_POWER;

type DirectionCache = RwLock<HashMap<(NodeKey, RelPos), (NeighborTarget, NeighborQualifier)>>;

/// Owns every node of a bidirectional quadtree, plus the field provider used
/// to populate fresh slots and a per-direction neighbor cache.
pub struct QuadTree<P: FieldProvider> {
    nodes: Pool<QuadNode>,
    provider: P,
    root: NodeKey,
    physical_length: f64,
    grown_depth: Mutex<u8>,
    /// Serializes branch/prune/grow so that each is atomic with respect to
    /// the others; `Pool`'s own lock only protects a single slot access, not
    /// the multi-step sequences these operations perform.
    lock: Mutex<()>,
    cache: [DirectionCache; 4],
}

impl<P: FieldProvider> QuadTree<P> {
    /// Builds a tree with a single root node, whose four slots and own
    /// multigrid reduction are populated from `provider`.
    #[must_use]
    pub fn new(provider: P, physical_length: f64) -> Self {
        let nodes = Pool::new();
        let root_node = QuadNode {
            scale: 0,
            rel_pos: RelPos::Head,
            parent: None,
            redux: provider.get(),
            slots: [
                Slot::Data(provider.get()),
                Slot::Data(provider.get()),
                Slot::Data(provider.get()),
                Slot::Data(provider.get()),
            ],
            is_child: crate::bitset::BitSet8::new(),
        };
        let root = nodes.insert_raw(root_node);
        Self {
            nodes,
            provider,
            root,
            physical_length,
            grown_depth: Mutex::new(0),
            lock: Mutex::new(()),
            cache: neighbor_cache(),
        }
    }

    /// The root node's key.
    #[must_use]
    pub fn root(&self) -> NodeKey {
        self.root
    }

    /// Borrows the node at `key`, for as long as the returned guard lives.
    #[must_use]
    pub fn node(&self, key: NodeKey) -> Option<parking_lot::MappedMutexGuard<'_, QuadNode>> {
        self.nodes.get_raw(key)
    }

    /// Subdivides `node`'s quadrant `slot`, moving its current data into the
    /// new child's multigrid reduction and populating four fresh data slots
    /// from the field provider.
    pub fn branch(&self, node: NodeKey, slot: RelPos) -> Result<NodeKey, BranchError> {
        let _guard = self.lock.lock();
        let child = self.branch_locked(node, slot)?;
        self.invalidate_neighbor_cache();
        Ok(child)
    }

    fn branch_locked(&self, node: NodeKey, slot: RelPos) -> Result<NodeKey, BranchError> {
        let idx = slot.slot_index();
        let (old_data, parent_scale) = {
            let mut guard = self.nodes.get_raw(node).expect("valid node key");
            if guard.slots[idx].is_child() {
                return Err(BranchError::AlreadyBranched);
            }
            let placeholder = Slot::Child(NodeKey::default());
            let taken = std::mem::replace(&mut guard.slots[idx], placeholder);
            let old_data = match taken {
                Slot::Data(fs) => fs,
                Slot::Child(_) => unreachable!("checked above"),
            };
            (old_data, guard.scale)
        };

        let child = QuadNode {
            scale: parent_scale + 1,
            rel_pos: slot,
            parent: Some(node),
            redux: old_data,
            slots: [
                Slot::Data(self.provider.get()),
                Slot::Data(self.provider.get()),
                Slot::Data(self.provider.get()),
                Slot::Data(self.provider.get()),
            ],
            is_child: crate::bitset::BitSet8::new(),
        };
        let child_key = self.nodes.insert_raw(child);

        {
            let mut guard = self.nodes.get_raw(node).expect("valid node key");
            guard.slots[idx] = Slot::Child(child_key);
            guard.set_child_bit(slot, true);
        }

        log::debug!("branched node at scale {} slot {:?}", parent_scale, slot);
        Ok(child_key)
    }

    /// Collapses `node` back into its parent's slot as data, provided
    /// `node`'s own four slots are already data (the caller is responsible
    /// for having folded them into `node`'s `redux` beforehand).
    pub fn prune(&self, node: NodeKey) -> Result<(), PruneError> {
        let _guard = self.lock.lock();
        let (parent_key, rel_pos) = {
            let guard = self.nodes.get_raw(node).expect("valid node key");
            if guard.is_child.bits() != 0 {
                return Err(PruneError::PruneHasChildren);
            }
            match guard.parent {
                Some(p) => (p, guard.rel_pos),
                None => return Err(PruneError::PruneRoot),
            }
        };

        let removed = self.nodes.remove_raw(node).expect("node exists");
        let redux = removed.redux;

        {
            let mut pguard = self.nodes.get_raw(parent_key).expect("valid parent key");
            let idx = rel_pos.slot_index();
            pguard.slots[idx] = Slot::Data(redux);
            pguard.set_child_bit(rel_pos, false);
        }

        self.invalidate_neighbor_cache();
        log::debug!("pruned node at slot {:?}", rel_pos);
        Ok(())
    }

    /// Grows the tree to a uniform depth such that the cell width at that
    /// depth is no coarser than `h`. Applying the same `h` twice is a no-op;
    /// applying a smaller `h` only adds children.
    pub fn grow_to_resolution(&self, h: f64) -> Result<(), GrowError> {
        let target = target_depth(self.physical_length, h);
        let _guard = self.lock.lock();
        let mut grown = self.grown_depth.lock();
        if target <= *grown {
            return Ok(());
        }
        let from = *grown;
        self.grow_node(self.root, 0, from, target)?;
        *grown = target;
        drop(grown);
        self.invalidate_neighbor_cache();
        log::debug!("grew tree from depth {} to {}", from, target);
        Ok(())
    }

    fn grow_node(&self, node: NodeKey, depth: u8, from: u8, target: u8) -> Result<(), GrowError> {
        if depth == target {
            return Ok(());
        }
        for pos in [RelPos::Ul, RelPos::Ur, RelPos::Dl, RelPos::Dr] {
            let is_child = {
                let guard = self.nodes.get_raw(node).expect("valid key");
                guard.slots[pos.slot_index()].is_child()
            };
            let child = if is_child {
                if depth >= from {
                    return Err(GrowError::GrowIntoExistingSubtree);
                }
                let guard = self.nodes.get_raw(node).expect("valid key");
                match guard.slots[pos.slot_index()] {
                    Slot::Child(ch) => ch,
                    Slot::Data(_) => unreachable!("checked is_child above"),
                }
            } else {
                self.branch_locked(node, pos)
                    .map_err(|_| GrowError::GrowIntoExistingSubtree)?
            };
            self.grow_node(child, depth + 1, from, target)?;
        }
        Ok(())
    }
}

fn target_depth(physical_length: f64, h: f64) -> u8 {
    let ratio = physical_length / h;
    let raw = ratio.log2().ceil() as i64 - i64::from(TILE_POWER) - 1;
    raw.max(0) as u8
}

fn neighbor_cache() -> [DirectionCache; 4] {
    [
        RwLock::new(HashMap::new()),
        RwLock::new(HashMap::new()),
        RwLock::new(HashMap::new()),
        RwLock::new(HashMap::new()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::PoolFieldProvider;

    fn tree() -> QuadTree<PoolFieldProvider> {
        QuadTree::new(PoolFieldProvider::new(), 1.0)
    }

    #[test]
    fn branch_sets_child_and_preserves_redux() {
        let t = tree();
        let root = t.root();
        let before = {
            let guard = t.node(root).unwrap();
            guard.redux.phi.key()
        };
        let child = t.branch(root, RelPos::Ur).unwrap();
        let guard = t.node(root).unwrap();
        assert!(guard.slots[RelPos::Ur.slot_index()].is_child());
        assert_eq!(guard.redux.phi.key(), before);
        drop(guard);
        let child_guard = t.node(child).unwrap();
        assert_eq!(child_guard.scale, 1);
        assert_eq!(child_guard.rel_pos, RelPos::Ur);
    }

    #[test]
    fn branch_twice_on_same_slot_fails() {
        let t = tree();
        let root = t.root();
        t.branch(root, RelPos::Ul).unwrap();
        assert_eq!(t.branch(root, RelPos::Ul), Err(BranchError::AlreadyBranched));
    }

    #[test]
    fn prune_restores_parent_slot_data() {
        let t = tree();
        let root = t.root();
        let child = t.branch(root, RelPos::Dr).unwrap();
        t.prune(child).unwrap();
        let guard = t.node(root).unwrap();
        assert!(!guard.slots[RelPos::Dr.slot_index()].is_child());
    }

    #[test]
    fn prune_root_fails() {
        let t = tree();
        assert_eq!(t.prune(t.root()), Err(PruneError::PruneRoot));
    }

    #[test]
    fn prune_node_with_children_fails() {
        let t = tree();
        let root = t.root();
        let child = t.branch(root, RelPos::Ul).unwrap();
        t.branch(child, RelPos::Ul).unwrap();
        assert_eq!(t.prune(child), Err(PruneError::PruneHasChildren));
    }

    #[test]
    fn grow_to_resolution_full_refinement() {
        let _ = env_logger::try_init();
        let t = tree();
        t.grow_to_resolution(1.0 / 128.0).unwrap();
        let root_guard = t.node(t.root()).unwrap();
        assert_eq!(root_guard.is_child.bits(), 0b1111);
        drop(root_guard);
        for pos in [RelPos::Ul, RelPos::Ur, RelPos::Dl, RelPos::Dr] {
            let child = match t.node(t.root()).unwrap().slots[pos.slot_index()] {
                Slot::Child(k) => k,
                Slot::Data(_) => panic!("expected child after growth"),
            };
            let guard = t.node(child).unwrap();
            assert_eq!(guard.is_child.bits(), 0b1111, "grandchildren missing at {:?}", pos);
        }
    }

    #[test]
    fn grow_to_resolution_is_idempotent() {
        let t = tree();
        t.grow_to_resolution(1.0 / 128.0).unwrap();
        t.grow_to_resolution(1.0 / 128.0).unwrap();
    }

    #[test]
    fn grow_to_finer_resolution_only_adds() {
        let t = tree();
        t.grow_to_resolution(1.0 / 32.0).unwrap();
        t.grow_to_resolution(1.0 / 128.0).unwrap();
        let root_guard = t.node(t.root()).unwrap();
        assert_eq!(root_guard.is_child.bits(), 0b1111);
    }
}
