//! Fixed-size 2-D tiles with a one-cell ghost perimeter.

use num_traits::Zero;

/// `p` in `L = 2^p`; fixed at build time.
pub const TILE_POWER: u32 = 4;
/// Inner tile side length, `L`.
pub const TILE_LEN: usize = 1 << TILE_POWER;
/// Backing-store side length, `L + 2`.
pub const TILE_STRIDE: usize = TILE_LEN + 2;

/// The edge of a tile's ghost ring.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Edge {
    /// Row 0.
    Top,
    /// Row `L + 1`.
    Bottom,
    /// Column 0.
    Left,
    /// Column `L + 1`.
    Right,
}

/// A fixed-size square tile: an inner `L`x`L` grid surrounded by a one-cell
/// ghost ring, backed by one row-major `(L+2)x(L+2)` buffer.
///
/// `get`/`set` take interior coordinates in `0..L` and map them onto the
/// backing store via `(i & (L-1)) + 1`, so callers never see the ghost
/// offset. The ghost ring itself is only reachable through the dedicated
/// `ghost_*` setters, which keeps interior access a single bounds-free
/// index computation.
#[derive(Clone, Debug)]
pub struct Tile<T> {
    data: Box<[T]>,
}

#[inline]
fn map_index(i: usize) -> usize {
    (i & (TILE_LEN - 1)) + 1
}

#[inline]
fn offset(row: usize, col: usize) -> usize {
    map_index(row) * TILE_STRIDE + map_index(col)
}

impl<T: Clone + Zero> Tile<T> {
    /// Creates a tile with every cell, including the ghost ring, set to zero.
    #[must_use]
    pub fn zeroed() -> Self {
        Self {
            data: vec![T::zero(); TILE_STRIDE * TILE_STRIDE].into_boxed_slice(),
        }
    }
}

impl<T: Copy> Tile<T> {
    /// Reads the interior cell at `(row, col)`, each in `0..L`.
    #[inline]
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[offset(row, col)]
    }

    /// Writes the interior cell at `(row, col)`, each in `0..L`.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: T) {
        let idx = offset(row, col);
        self.data[idx] = value;
    }

    /// Visits every interior cell exactly once, in row-major order.
    pub fn iterate(&mut self) -> impl Iterator<Item = (usize, usize, &mut T)> {
        let stride = TILE_STRIDE;
        self.data
            .iter_mut()
            .enumerate()
            .filter_map(move |(idx, cell)| {
                let r = idx / stride;
                let c = idx % stride;
                if (1..=TILE_LEN).contains(&r) && (1..=TILE_LEN).contains(&c) {
                    Some((r - 1, c - 1, cell))
                } else {
                    None
                }
            })
    }

    /// Copies the matching boundary row/column of `neighbor` into `self`'s
    /// ghost ring at `edge`. `neighbor` is assumed to lie directly adjacent
    /// to `self` in the direction `edge` names.
    pub fn ghost_from_neighbor(&mut self, edge: Edge, neighbor: &Self) {
        match edge {
            Edge::Top => {
                for c in 0..TILE_LEN {
                    let v = neighbor.get(TILE_LEN - 1, c);
                    self.data[map_index(c)] = v;
                }
            }
            Edge::Bottom => {
                for c in 0..TILE_LEN {
                    let v = neighbor.get(0, c);
                    self.data[(TILE_LEN + 1) * TILE_STRIDE + map_index(c)] = v;
                }
            }
            Edge::Left => {
                for r in 0..TILE_LEN {
                    let v = neighbor.get(r, TILE_LEN - 1);
                    self.data[map_index(r) * TILE_STRIDE] = v;
                }
            }
            Edge::Right => {
                for r in 0..TILE_LEN {
                    let v = neighbor.get(r, 0);
                    self.data[map_index(r) * TILE_STRIDE + (TILE_LEN + 1)] = v;
                }
            }
        }
    }

    /// Reads ghost cell `idx` (`0..L`) along `edge`, mainly useful for tests
    /// that need to verify a ghost setter's effect directly.
    #[inline]
    #[must_use]
    pub fn ghost_get(&self, edge: Edge, idx: usize) -> T {
        match edge {
            Edge::Top => self.data[map_index(idx)],
            Edge::Bottom => self.data[(TILE_LEN + 1) * TILE_STRIDE + map_index(idx)],
            Edge::Left => self.data[map_index(idx) * TILE_STRIDE],
            Edge::Right => self.data[map_index(idx) * TILE_STRIDE + (TILE_LEN + 1)],
        }
    }

    /// Writes an explicit length-`L` array into `self`'s ghost ring at `edge`.
    pub fn ghost_from_array(&mut self, edge: Edge, source: &[T; TILE_LEN]) {
        match edge {
            Edge::Top => {
                for (i, v) in source.iter().enumerate() {
                    self.data[map_index(i)] = *v;
                }
            }
            Edge::Bottom => {
                for (i, v) in source.iter().enumerate() {
                    self.data[(TILE_LEN + 1) * TILE_STRIDE + map_index(i)] = *v;
                }
            }
            Edge::Left => {
                for (i, v) in source.iter().enumerate() {
                    self.data[map_index(i) * TILE_STRIDE] = *v;
                }
            }
            Edge::Right => {
                for (i, v) in source.iter().enumerate() {
                    self.data[map_index(i) * TILE_STRIDE + (TILE_LEN + 1)] = *v;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_set_roundtrip() {
        let mut t: Tile<f64> = Tile::zeroed();
        t.set(3, 5, 2.5);
        assert_eq!(t.get(3, 5), 2.5);
        assert_eq!(t.get(0, 0), 0.0);
    }

    #[test]
    fn iterate_visits_each_interior_cell_once() {
        let mut t: Tile<i32> = Tile::zeroed();
        for r in 0..TILE_LEN {
            for c in 0..TILE_LEN {
                t.set(r, c, (r * TILE_LEN + c) as i32);
            }
        }
        let mut seen = vec![false; TILE_LEN * TILE_LEN];
        let mut count = 0;
        for (r, c, v) in t.iterate() {
            assert_eq!(*v, (r * TILE_LEN + c) as i32);
            assert!(!seen[r * TILE_LEN + c]);
            seen[r * TILE_LEN + c] = true;
            count += 1;
        }
        assert_eq!(count, TILE_LEN * TILE_LEN);
        assert!(seen.into_iter().all(|b| b));
    }

    #[test]
    fn ghost_from_neighbor_copies_adjacent_edge_only() {
        let mut top: Tile<i32> = Tile::zeroed();
        let mut bottom: Tile<i32> = Tile::zeroed();
        for c in 0..TILE_LEN {
            bottom.set(0, c, 100 + c as i32);
        }
        top.ghost_from_neighbor(Edge::Bottom, &bottom);
        for c in 0..TILE_LEN {
            assert_eq!(top.ghost_get(Edge::Bottom, c), 100 + c as i32);
        }
        // interior untouched
        assert_eq!(top.get(0, 0), 0);
    }

    #[test]
    fn ghost_from_array_writes_only_targeted_edge() {
        let mut t: Tile<i32> = Tile::zeroed();
        let mut src = [0i32; TILE_LEN];
        for (i, v) in src.iter_mut().enumerate() {
            *v = i as i32;
        }
        t.ghost_from_array(Edge::Left, &src);
        for r in 0..TILE_LEN {
            assert_eq!(t.ghost_get(Edge::Left, r), r as i32);
        }
        assert_eq!(t.get(5, 5), 0);
    }
}
