//! Pressure projection
//!
//! Makes the velocity field approximately divergence-free with a
//! fixed-iteration Jacobi solve of the pressure Poisson equation:
//!
//! ```text
//! ∇²p = ∇·v
//! p_new(c) = (Σ neighbors p − div(c)) / (2·dims)
//! v_new = v − ∇p
//! ```
//!
//! All differences are central, in grid units. Every Jacobi sweep reads one
//! pressure buffer and writes the other; the solve is approximate by
//! construction and its quality is bounded by the iteration count.

use super::boundary::{enforce_bounds, BoundaryKind};
use crate::core_types::Vec3;
use crate::grid::{FieldBuffer, FieldData, Grid};
use rayon::prelude::*;

/// Central-difference divergence of `velocity` on interior cells
///
/// Boundary cells are written as zero.
pub fn compute_divergence(grid: &Grid, velocity: &[Vec3], divergence: &mut [f32]) {
    divergence
        .par_iter_mut()
        .enumerate()
        .for_each(|(idx, div)| {
            *div = if grid.is_interior(grid.coords(idx)) {
                divergence_at(grid, velocity, idx)
            } else {
                0.0
            };
        });
}

#[inline]
fn divergence_at(grid: &Grid, velocity: &[Vec3], idx: usize) -> f32 {
    grid.active_axes()
        .iter()
        .map(|&axis| {
            let s = grid.stride(axis);
            let a = axis.index();
            velocity[idx + s][a] - velocity[idx - s][a]
        })
        .sum::<f32>()
        * 0.5
}

/// One Jacobi relaxation sweep from `p_in` into `p_out`
///
/// Boundary cells are copied through; the caller re-imposes the boundary
/// rule after the sweep.
pub fn jacobi_sweep(grid: &Grid, divergence: &[f32], p_in: &[f32], p_out: &mut [f32]) {
    let inv_denom = 1.0 / (2 * grid.dimensions()) as f32;

    p_out.par_iter_mut().enumerate().for_each(|(idx, p)| {
        if grid.is_boundary(grid.coords(idx)) {
            *p = p_in[idx];
            return;
        }
        let neighbors: f32 = grid
            .active_axes()
            .iter()
            .map(|&axis| {
                let s = grid.stride(axis);
                p_in[idx + s] + p_in[idx - s]
            })
            .sum();
        *p = (neighbors - divergence[idx]) * inv_denom;
    });
}

/// Subtract the central-difference pressure gradient from interior cells
pub fn subtract_gradient(grid: &Grid, pressure: &[f32], v_in: &[Vec3], v_out: &mut [Vec3]) {
    v_out.par_iter_mut().enumerate().for_each(|(idx, v)| {
        let mut corrected = v_in[idx];
        if grid.is_interior(grid.coords(idx)) {
            for &axis in grid.active_axes() {
                let s = grid.stride(axis);
                corrected[axis.index()] -= 0.5 * (pressure[idx + s] - pressure[idx - s]);
            }
        }
        *v = corrected;
    });
}

/// Project `velocity` onto (approximately) divergence-free fields
///
/// `pressure` and `divergence` are solver scratch; their contents on entry
/// are ignored and never carried across frames.
pub fn project(
    grid: &Grid,
    velocity: &mut FieldBuffer<Vec3>,
    pressure: &mut FieldBuffer<f32>,
    divergence: &mut FieldData<f32>,
    iterations: usize,
) {
    // Divergence + zero initial guess
    compute_divergence(grid, velocity.read(), divergence.as_mut_slice());
    pressure.fill(0.0);
    enforce_bounds(velocity, BoundaryKind::FreeSlip);

    // Jacobi relaxation, ping-pong between pressure buffers
    for _ in 0..iterations {
        let (p_in, p_out) = pressure.split();
        jacobi_sweep(grid, divergence.as_slice(), p_in, p_out);
        pressure.swap();
        enforce_bounds(pressure, BoundaryKind::ZeroGradient);
    }

    // Velocity correction
    let (v_in, v_out) = velocity.split();
    subtract_gradient(grid, pressure.read(), v_in, v_out);
    velocity.swap();
    enforce_bounds(velocity, BoundaryKind::FreeSlip);
}

/// Mean and maximum absolute interior divergence of `velocity`
#[must_use]
pub fn divergence_stats(grid: &Grid, velocity: &[Vec3]) -> (f32, f32) {
    let (sum, max, count) = (0..grid.cell_count())
        .into_par_iter()
        .filter(|&idx| grid.is_interior(grid.coords(idx)))
        .map(|idx| {
            let d = divergence_at(grid, velocity, idx).abs();
            (d, d, 1_usize)
        })
        .reduce(
            || (0.0, 0.0, 0),
            |a, b| (a.0 + b.0, a.1.max(b.1), a.2 + b.2),
        );

    if count == 0 {
        (0.0, 0.0)
    } else {
        (sum / count as f32, max)
    }
}
