//! Per-node simulation state: a potential tile, a charge-density tile, and a
//! boundary-condition mask, bundled as one movable handle triple.
//!
//! Grounded in `original_source/Source/Physics.hpp`'s `PhysicsNode`, which
//! aggregates `phi`, `rho` and `bounds` `MVar`s behind a `PhysicsData<T>`
//! factory; `FieldSet`/`FieldProvider`/`PoolFieldProvider` carry those three
//! names and the `get()` factory method forward, with `MVar` played by this
//! crate's [`Handle`].

use crate::pool::{Handle, Pool};
use crate::tile::Tile;

/// A boundary-condition code for one cell of a [`BoundaryMask`].
///
/// Numeric values match `original_source/Source/Physics.hpp`'s
/// `boundary_type` enum so a mask tile's raw `u8` cells can be interpreted
/// directly.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Boundary {
    /// Not a boundary; an ordinary interior cell.
    Interior = 0,
    /// First-type (Dirichlet) boundary condition.
    Dirichlet = 1,
    /// Second-type (Neumann) boundary condition.
    Neumann = 2,
}

impl Boundary {
    /// Decodes a raw mask cell value, treating any nonzero value other than
    /// `1` as `Neumann` rather than panicking on malformed input.
    #[must_use]
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Interior,
            1 => Self::Dirichlet,
            _ => Self::Neumann,
        }
    }
}

/// A tile whose interior cells hold [`Boundary`] codes.
pub type BoundaryMask = Tile<u8>;

/// A potential tile, a charge-density tile, and a boundary mask, bundled as
/// one movable aggregate. Not `Copy`: dropping a `FieldSet` releases its
/// three handles back to their pools.
#[derive(Debug)]
pub struct FieldSet {
    /// Potential field (phi).
    pub phi: Handle<Tile<f64>>,
    /// Charge-density field (rho).
    pub rho: Handle<Tile<f64>>,
    /// Boundary-condition mask.
    pub bounds: Handle<BoundaryMask>,
}

/// A source of fresh [`FieldSet`]s, supplied by the physics layer.
///
/// The tree calls this on root construction and on every `branch`; the
/// crate itself never decides what values a fresh field starts with beyond
/// what its `FieldProvider` hands back.
pub trait FieldProvider {
    /// Produces a new, independently-owned `FieldSet`.
    fn get(&self) -> FieldSet;
}

/// An in-tree [`FieldProvider`] backed by three [`Pool`]s, zero-initialized.
///
/// This is not a physics layer: it is the minimal concrete provider needed
/// so the crate's own tests can build a `QuadTree` without an external
/// collaborator, the same role `PhysicsData<T>::get()` plays for the
/// original's own harness.
#[derive(Debug, Default)]
pub struct PoolFieldProvider {
    phi: Pool<Tile<f64>>,
    rho: Pool<Tile<f64>>,
    bounds: Pool<BoundaryMask>,
}

impl PoolFieldProvider {
    /// Creates a provider backed by fresh, empty pools.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl FieldProvider for PoolFieldProvider {
    fn get(&self) -> FieldSet {
        FieldSet {
            phi: self.phi.acquire_with(Tile::zeroed),
            rho: self.rho.acquire_with(Tile::zeroed),
            bounds: self.bounds.acquire_with(Tile::zeroed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_hands_out_independent_field_sets() {
        let provider = PoolFieldProvider::new();
        let mut a = provider.get();
        let b = provider.get();
        a.phi.get().set(0, 0, 9.0);
        assert_eq!(a.phi.get().get(0, 0), 9.0);
        assert_eq!(b.phi.get().get(0, 0), 0.0);
    }

    #[test]
    fn boundary_from_code() {
        assert_eq!(Boundary::from_code(0), Boundary::Interior);
        assert_eq!(Boundary::from_code(1), Boundary::Dirichlet);
        assert_eq!(Boundary::from_code(2), Boundary::Neumann);
        assert_eq!(Boundary::from_code(200), Boundary::Neumann);
    }
}
