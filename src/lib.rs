//! A bidirectional quadtree for two-dimensional adaptive-mesh multigrid solvers.
//!
//! # Overview
//! `bidirquad` implements an arena-allocated quadtree whose nodes hold fixed-size
//! tiles of simulation state. Unlike a tree built from `Rc`/`RefCell` or raw
//! pointers, all nodes live in one [`Pool`](pool::Pool) and link to each other
//! through stable keys, which sidesteps the cyclic-ownership hazards that come
//! with parent/child back-references.
//!
//! Three pieces make up the crate:
//! - [`tile`] — a fixed-size square tile with a one-cell ghost perimeter.
//! - [`pool`] — the arena storage shared by tiles and tree nodes.
//! - [`quadtree`] — the tree itself: branch, prune, grow-to-resolution and the
//!   cross-scale neighbor search.
//! - [`transfer`] — downsampling, bilinear prolongation and ghost-ring sync
//!   between tiles at equal or differing scale.
//!
//! The physics discretization, its iteration schedule, and any plotting or
//! process harness are explicitly out of scope: this crate exposes the
//! [`field::FieldProvider`] capability contract but never implements the
//! physics behind it.
//!
//! # Public dependencies
//! - `slotmap` — the arena backing [`Pool`](pool::Pool).
//! - `parking_lot` — the internal locks guarding pools and the tree.
//! - `num-traits` — the numeric bound on tile element types.
//! - `log` — diagnostics for pool leaks and cache invalidation.

#![warn(
    rust_2018_idioms,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unused_qualifications,
    variant_size_differences
)]
#![deny(anonymous_parameters, bare_trait_objects)]

mod util;

pub mod bitset;
pub mod error;
pub mod field;
pub mod pool;
pub mod quadtree;
pub mod tile;
pub mod transfer;

pub use bitset::BitSet8;
pub use error::{BranchError, GrowError, PruneError};
pub use field::{Boundary, BoundaryMask, FieldProvider, FieldSet, PoolFieldProvider};
pub use pool::{Handle, Pool};
pub use quadtree::{NeighborQualifier, QuadNode, QuadTree, RelPos};
pub use tile::Tile;

/// A prelude containing the most commonly used types, for glob-importing.
pub mod prelude {
    pub use crate::field::{Boundary, BoundaryMask, FieldProvider, FieldSet};
    pub use crate::pool::{Handle, Pool};
    pub use crate::quadtree::{Direction, NeighborQualifier, QuadTree, RelPos};
    pub use crate::tile::Tile;
}
