//! Inter-tile transfer kernels: downsampling, bilinear prolongation, and
//! ghost-ring synchronization between tiles at equal or differing scale.
//!
//! These are pure with respect to their destinations: they read sources,
//! write destinations, and never mutate a source tile or reach past a tile
//! boundary other than through its ghost ring.

use num_traits::Float;

use crate::field::BoundaryMask;
use crate::quadtree::RelPos;
use crate::tile::{Edge, Tile, TILE_LEN};

/// How a 2x2 source block is reduced to one destination cell in [`downsample`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Reduction {
    /// Arithmetic mean of the four source cells.
    Mean,
    /// Sum of the four source cells.
    Sum,
}

/// Which variant of bilinear interpolation [`prolongate_bilinear`] performs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ProlongationVariant {
    /// Evaluates the bilinear surface at four point samples per axis.
    Pointwise,
    /// Evaluates the cell-averaged form, preserving the integral of the
    /// source field across the four destination quadrants.
    Conservative,
}

fn quadrant_for(row_group: usize, col_group: usize) -> RelPos {
    match (row_group, col_group) {
        (0, 0) => RelPos::Ul,
        (0, 1) => RelPos::Ur,
        (1, 0) => RelPos::Dl,
        (1, 1) => RelPos::Dr,
        _ => unreachable!("row_group/col_group are always 0 or 1"),
    }
}

fn quadrant_mut<'a, T>(
    ul: &'a mut Tile<T>,
    ur: &'a mut Tile<T>,
    dl: &'a mut Tile<T>,
    dr: &'a mut Tile<T>,
    pos: RelPos,
) -> &'a mut Tile<T> {
    match pos {
        RelPos::Ul => ul,
        RelPos::Ur => ur,
        RelPos::Dl => dl,
        RelPos::Dr => dr,
        RelPos::Head => unreachable!("Head is not a quadrant"),
    }
}

fn quadrant_ref<'a, T>(
    ul: &'a Tile<T>,
    ur: &'a Tile<T>,
    dl: &'a Tile<T>,
    dr: &'a Tile<T>,
    pos: RelPos,
) -> &'a Tile<T> {
    match pos {
        RelPos::Ul => ul,
        RelPos::Ur => ur,
        RelPos::Dl => dl,
        RelPos::Dr => dr,
        RelPos::Head => unreachable!("Head is not a quadrant"),
    }
}

/// Writes to each interior cell of `dst` the [`Reduction`] of the matching
/// 2x2 block from one of the four quadrant sources `ul`/`ur`/`dl`/`dr`.
/// Destination cells whose `dst_bounds` is non-zero are left untouched.
pub fn downsample<T: Float>(
    dst: &mut Tile<T>,
    dst_bounds: &BoundaryMask,
    ul: &Tile<T>,
    ur: &Tile<T>,
    dl: &Tile<T>,
    dr: &Tile<T>,
    op: Reduction,
) {
    let half = TILE_LEN / 2;
    for i in 0..TILE_LEN {
        for j in 0..TILE_LEN {
            if dst_bounds.get(i, j) != 0 {
                continue;
            }
            let row_group = usize::from(i >= half);
            let col_group = usize::from(j >= half);
            let src = quadrant_ref(ul, ur, dl, dr, quadrant_for(row_group, col_group));
            let li = i % half;
            let lj = j % half;
            let r0 = 2 * li;
            let c0 = 2 * lj;
            let sum = src.get(r0, c0) + src.get(r0, c0 + 1) + src.get(r0 + 1, c0) + src.get(r0 + 1, c0 + 1);
            let value = match op {
                Reduction::Mean => sum / T::from(4.0).expect("4.0 fits T"),
                Reduction::Sum => sum,
            };
            dst.set(i, j, value);
        }
    }
}

fn bilinear_coeffs<T: Float>(q11: T, q12: T, q21: T, q22: T) -> (T, T, T, T) {
    let a = q22 - q12 - q21 + q11;
    let b = q12 - q11;
    let c = q21 - q11;
    let d = q11;
    (a, b, c, d)
}

fn pointwise_value<T: Float>(a: T, b: T, c: T, d: T, x: T, y: T) -> T {
    d + x * c + y * (x * a + b)
}

fn conservative_value<T: Float>(a: T, b: T, c: T, d: T, ll: u32, kk: u32) -> T {
    let two_fifty_six = T::from(256.0).expect("256.0 fits T");
    let eighth = T::from(0.125).expect("0.125 fits T");
    let dx2 = T::from(2 * ll + 1).expect("small integer fits T") / two_fifty_six;
    let dy2 = T::from(2 * kk + 1).expect("small integer fits T") / two_fifty_six;
    dx2 * (a * dy2 + c * eighth) + eighth * (b * dy2 + d * eighth)
}

/// Prolongates each 2x2 block of `src` into the matching 2x2 sub-block of
/// all four destination quadrants `ul`/`ur`/`dl`/`dr`, per `variant`.
/// Destination cells masked non-zero in `bounds` (indexed by quadrant) are
/// left untouched.
pub fn prolongate_bilinear<T: Float>(
    src: &Tile<T>,
    ul: &mut Tile<T>,
    ur: &mut Tile<T>,
    dl: &mut Tile<T>,
    dr: &mut Tile<T>,
    bounds: [&BoundaryMask; 4],
    variant: ProlongationVariant,
) {
    let bounds_for = |pos: RelPos| -> &BoundaryMask {
        match pos {
            RelPos::Ul => bounds[0],
            RelPos::Ur => bounds[1],
            RelPos::Dl => bounds[2],
            RelPos::Dr => bounds[3],
            RelPos::Head => unreachable!("Head is not a quadrant"),
        }
    };
    let thirds = [T::zero(), T::one() / T::from(3.0).expect("3.0 fits T"), T::from(2.0).expect("2.0 fits T") / T::from(3.0).expect("3.0 fits T"), T::one()];
    let half = TILE_LEN / 2;

    // `src` is partitioned into half x half non-overlapping 2x2 blocks (the
    // mirror image of `downsample`'s stride-2 read pattern), each expanding
    // into 16 samples split 4-per-quadrant across `ul`/`ur`/`dl`/`dr`. Every
    // destination cell in every quadrant is touched by exactly one block.
    for bi in 0..half {
        for bj in 0..half {
            let row0 = 2 * bi;
            let row1 = row0 + 1;
            let col0 = 2 * bj;
            let col1 = col0 + 1;
            let q11 = src.get(row0, col0);
            let q21 = src.get(row1, col0);
            let q12 = src.get(row0, col1);
            let q22 = src.get(row1, col1);
            let (a, b, c, d) = bilinear_coeffs(q11, q12, q21, q22);

            for (idx, &x) in thirds.iter().enumerate() {
                for (jdx, &y) in thirds.iter().enumerate() {
                    let pos = quadrant_for(idx / 2, jdx / 2);
                    let local_row = 2 * bi + (idx % 2);
                    let local_col = 2 * bj + (jdx % 2);
                    if bounds_for(pos).get(local_row, local_col) != 0 {
                        continue;
                    }
                    let value = match variant {
                        ProlongationVariant::Pointwise => pointwise_value(a, b, c, d, x, y),
                        ProlongationVariant::Conservative => {
                            conservative_value(a, b, c, d, idx as u32, jdx as u32)
                        }
                    };
                    quadrant_mut(ul, ur, dl, dr, pos).set(local_row, local_col, value);
                }
            }
        }
    }
}

/// Populates one edge of `dst`'s ghost ring from `src`.
///
/// `relative_scale == 0` performs a direct copy of the matching boundary
/// row/column. `relative_scale > 0` means `src` is coarser by that many
/// levels; the destination ghost cells are linearly interpolated from the
/// half of `src`'s edge adjacent to `dst` (`lower_half` selects which half —
/// this crate's tree layer always knows its own `rel_pos` and passes it
/// directly, since a bare pair of tiles cannot otherwise tell which side of
/// the coarser neighbor they fall under). Negative relative scale is
/// disallowed; combine finer sources externally first.
pub fn sync_ghost<T: Float>(src: &Tile<T>, dst: &mut Tile<T>, edge: Edge, relative_scale: u32, lower_half: bool) {
    if relative_scale == 0 {
        dst.ghost_from_neighbor(edge, src);
        return;
    }
    let factor = 1usize << relative_scale;
    let sub_len = (TILE_LEN / factor).max(1);
    let base = if lower_half { 0 } else { TILE_LEN - sub_len };

    let edge_value = |i: usize| -> T {
        match edge {
            Edge::Top => src.get(TILE_LEN - 1, i),
            Edge::Bottom => src.get(0, i),
            Edge::Left => src.get(i, TILE_LEN - 1),
            Edge::Right => src.get(i, 0),
        }
    };

    let mut interpolated = [T::zero(); TILE_LEN];
    for (i, slot) in interpolated.iter_mut().enumerate() {
        let pos = base as f64 + (i as f64 + 0.5) / factor as f64 - 0.5;
        let s0 = (pos.floor() as isize).clamp(0, TILE_LEN as isize - 1) as usize;
        let s1 = (s0 + 1).min(TILE_LEN - 1);
        let frac = T::from(pos - pos.floor()).expect("fractional position fits T");
        *slot = edge_value(s0) * (T::one() - frac) + edge_value(s1) * frac;
    }
    dst.ghost_from_array(edge, &interpolated);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Boundary;

    fn zero_mask() -> BoundaryMask {
        BoundaryMask::zeroed()
    }

    #[test]
    fn downsample_mean_of_constant_tile_is_identity() {
        let mut src: Tile<f64> = Tile::zeroed();
        for r in 0..TILE_LEN {
            for c in 0..TILE_LEN {
                src.set(r, c, 7.0);
            }
        }
        let mut dst: Tile<f64> = Tile::zeroed();
        let bounds = zero_mask();
        downsample(&mut dst, &bounds, &src, &src, &src, &src, Reduction::Mean);
        for r in 0..TILE_LEN {
            for c in 0..TILE_LEN {
                assert_eq!(dst.get(r, c), 7.0);
            }
        }
    }

    #[test]
    fn downsample_matches_explicit_formula() {
        let mut src: Tile<f64> = Tile::zeroed();
        for r in 0..TILE_LEN {
            for c in 0..TILE_LEN {
                src.set(r, c, (r * TILE_LEN + c) as f64);
            }
        }
        let mut dst: Tile<f64> = Tile::zeroed();
        let bounds = zero_mask();
        downsample(&mut dst, &bounds, &src, &src, &src, &src, Reduction::Mean);
        let l = TILE_LEN;
        for i in 0..l / 2 {
            for j in 0..l / 2 {
                let expected = ((2 * i) * l + 2 * j
                    + (2 * i) * l
                    + 2 * j
                    + 1
                    + (2 * i + 1) * l
                    + 2 * j
                    + (2 * i + 1) * l
                    + 2 * j
                    + 1) as f64
                    / 4.0;
                assert_eq!(dst.get(i, j), expected);
            }
        }
    }

    #[test]
    fn downsample_skips_masked_destination_cells() {
        let mut src: Tile<f64> = Tile::zeroed();
        for r in 0..TILE_LEN {
            for c in 0..TILE_LEN {
                src.set(r, c, 1.0);
            }
        }
        let mut dst: Tile<f64> = Tile::zeroed();
        dst.set(0, 0, -1.0);
        let mut bounds = zero_mask();
        bounds.set(0, 0, Boundary::Dirichlet as u8);
        downsample(&mut dst, &bounds, &src, &src, &src, &src, Reduction::Mean);
        assert_eq!(dst.get(0, 0), -1.0);
        assert_eq!(dst.get(1, 1), 1.0);
    }

    #[test]
    fn conservative_prolongation_preserves_sum() {
        let mut src: Tile<f64> = Tile::zeroed();
        let mut expected_sum = 0.0;
        for r in 0..TILE_LEN {
            for c in 0..TILE_LEN {
                let v = (r + c + 1) as f64;
                src.set(r, c, v);
                expected_sum += v;
            }
        }
        let mut ul: Tile<f64> = Tile::zeroed();
        let mut ur: Tile<f64> = Tile::zeroed();
        let mut dl: Tile<f64> = Tile::zeroed();
        let mut dr: Tile<f64> = Tile::zeroed();
        let bounds = zero_mask();
        prolongate_bilinear(
            &src,
            &mut ul,
            &mut ur,
            &mut dl,
            &mut dr,
            [&bounds, &bounds, &bounds, &bounds],
            ProlongationVariant::Conservative,
        );
        let mut total = 0.0;
        for t in [&ul, &ur, &dl, &dr] {
            for r in 0..TILE_LEN {
                for c in 0..TILE_LEN {
                    total += t.get(r, c);
                }
            }
        }
        assert!(
            (total - expected_sum).abs() < 1e-6,
            "expected {expected_sum}, got {total}"
        );
    }

    #[test]
    fn sync_ghost_same_scale_matches_direct_neighbor_copy() {
        let mut src: Tile<f64> = Tile::zeroed();
        for c in 0..TILE_LEN {
            src.set(0, c, c as f64);
        }
        let mut dst: Tile<f64> = Tile::zeroed();
        sync_ghost(&src, &mut dst, Edge::Top, 0, true);
        let mut expected: Tile<f64> = Tile::zeroed();
        expected.ghost_from_neighbor(Edge::Top, &src);
        for c in 0..TILE_LEN {
            assert_eq!(dst.ghost_get(Edge::Top, c), expected.ghost_get(Edge::Top, c));
        }
    }

    #[test]
    fn sync_ghost_coarser_source_interpolates_half_range() {
        let mut src: Tile<f64> = Tile::zeroed();
        for c in 0..TILE_LEN {
            src.set(0, c, c as f64);
        }
        let mut dst: Tile<f64> = Tile::zeroed();
        sync_ghost(&src, &mut dst, Edge::Top, 1, true);
        // dst's ghost values should stay within the range covered by the
        // lower half of src's edge (indices 0..L/2).
        let max_in_half = (TILE_LEN / 2 - 1) as f64;
        for c in 0..TILE_LEN {
            let v = dst.ghost_get(Edge::Top, c);
            assert!(v >= 0.0 && v <= max_in_half + 1.0);
        }
    }
}
