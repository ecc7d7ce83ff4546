//! Per-face boundary enforcement
//!
//! One pass per active axis (x, y, then z in 3D). Each pass reads the
//! committed buffer, rewrites the two faces normal to its axis from the
//! adjacent interior layer, copies every other cell through, and swaps.
//! Later passes read earlier passes' output, so edges and corners pick up
//! values already consistent with the previous faces.

use crate::grid::{Axis, FieldBuffer, FieldValue, Grid};
use rayon::prelude::*;

/// Boundary rule applied to the outer shell of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryKind {
    /// No penetration: the wall-normal component is the negated interior
    /// value, tangential components copy (velocity fields)
    FreeSlip,
    /// Zero gradient: boundary copies the adjacent interior value
    /// (pressure and moist state)
    ZeroGradient,
}

/// Apply `kind` to every face of `field`
pub fn enforce_bounds<T: FieldValue>(field: &mut FieldBuffer<T>, kind: BoundaryKind) {
    let grid = *field.grid();
    for &axis in grid.active_axes() {
        let (src, dst) = field.split();
        enforce_axis(&grid, src, dst, axis, kind);
        field.swap();
    }
}

/// Single-axis pass from `src` into `dst`
pub fn enforce_axis<T: FieldValue>(
    grid: &Grid,
    src: &[T],
    dst: &mut [T],
    axis: Axis,
    kind: BoundaryKind,
) {
    let n = grid.axis_len(axis);
    let stride = grid.stride(axis);
    let a = axis.index();

    let rule = |v: T| match kind {
        BoundaryKind::FreeSlip => v.flip_normal(axis),
        BoundaryKind::ZeroGradient => v,
    };

    dst.par_iter_mut().enumerate().for_each(|(idx, out)| {
        let c = grid.coords(idx)[a];
        *out = if c == 0 {
            rule(src[idx + stride])
        } else if c == n - 1 {
            rule(src[idx - stride])
        } else {
            src[idx]
        };
    });
}
