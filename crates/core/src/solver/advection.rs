//! Semi-Lagrangian advection
//!
//! Each destination cell traces its center back along the velocity field by
//! `dt`, clamps the departure point to `[0.5, N − 0.5]` on every axis and
//! samples the source field there with bilinear (2D) or trilinear (3D)
//! interpolation. The same operator moves velocity and the moist state.

use crate::core_types::Vec3;
use crate::grid::{Axis, FieldValue, Grid};
use rayon::prelude::*;

/// Clamp a continuous position to the sampling domain of `grid`
#[inline]
#[must_use]
pub fn clamp_to_domain(grid: &Grid, p: Vec3) -> Vec3 {
    Vec3::new(
        p.x.clamp(0.5, grid.nx as f32 - 0.5),
        p.y.clamp(0.5, grid.ny as f32 - 0.5),
        p.z.clamp(0.5, grid.nz as f32 - 0.5),
    )
}

/// Lattice index pair and weight along one axis for continuous coordinate `p`
#[inline]
fn lattice(grid: &Grid, axis: Axis, p: f32) -> (usize, usize, f32) {
    let n = grid.axis_len(axis);
    let x = (p - 0.5).clamp(0.0, (n - 1) as f32);
    let i0 = (x.floor() as usize).min(n - 1);
    let i1 = (i0 + 1).min(n - 1);
    (i0, i1, x - i0 as f32)
}

#[inline]
fn lerp<T: FieldValue>(a: T, b: T, f: f32) -> T {
    a * (1.0 - f) + b * f
}

/// Sample `field` at continuous position `pos` (cell centers at `i + 0.5`)
///
/// Interpolation is total: positions outside the grid clamp to the edge
/// cells. With `nz = 1` the z weights vanish and this is bilinear.
#[must_use]
pub fn sample_linear<T: FieldValue>(grid: &Grid, field: &[T], pos: Vec3) -> T {
    let (i0, i1, fx) = lattice(grid, Axis::X, pos.x);
    let (j0, j1, fy) = lattice(grid, Axis::Y, pos.y);
    let at = |i, j, k| field[grid.index(i, j, k)];

    let plane = |k| {
        let bottom = lerp(at(i0, j0, k), at(i1, j0, k), fx);
        let top = lerp(at(i0, j1, k), at(i1, j1, k), fx);
        lerp(bottom, top, fy)
    };

    if grid.is_3d() {
        let (k0, k1, fz) = lattice(grid, Axis::Z, pos.z);
        lerp(plane(k0), plane(k1), fz)
    } else {
        plane(0)
    }
}

/// Advect `source` through `velocity` into `dest`
///
/// `velocity` is in cells per second. `dest` must not alias `source`.
pub fn advect<T: FieldValue>(
    grid: &Grid,
    velocity: &[Vec3],
    source: &[T],
    dest: &mut [T],
    dt: f32,
) {
    dest.par_iter_mut().enumerate().for_each(|(idx, out)| {
        let c = grid.coords(idx);
        let departure = clamp_to_domain(grid, grid.cell_center(c) - velocity[idx] * dt);
        *out = sample_linear(grid, source, departure);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::Thermo;
    use crate::grid::FieldData;
    use approx::assert_relative_eq;

    fn ramp(grid: Grid) -> FieldData<f32> {
        FieldData::from_fn(grid, |[i, j, k]| (i * 7 + j * 3 + k * 11) as f32 * 0.25)
    }

    #[test]
    fn test_zero_velocity_is_identity_2d() {
        let grid = Grid::new_2d(12, 9, 100.0, 100.0);
        let source = FieldData::from_fn(grid, |[i, j, _]| {
            Thermo::new(i as f32 * 0.001, j as f32 * 0.002, (i * j) as f32 - 5.0)
        });
        let velocity = vec![Vec3::zeros(); grid.cell_count()];
        let mut dest = vec![Thermo::ZERO; grid.cell_count()];

        advect(&grid, &velocity, source.as_slice(), &mut dest, 0.5);

        assert_eq!(dest.as_slice(), source.as_slice());
    }

    #[test]
    fn test_zero_velocity_is_identity_3d() {
        let grid = Grid::new(6, 7, 5, Vec3::new(10.0, 10.0, 10.0));
        let source = ramp(grid);
        let velocity = vec![Vec3::zeros(); grid.cell_count()];
        let mut dest = vec![0.0; grid.cell_count()];

        advect(&grid, &velocity, source.as_slice(), &mut dest, 1.0 / 60.0);

        assert_eq!(dest.as_slice(), source.as_slice());
    }

    #[test]
    fn test_readvection_with_zero_velocity_is_idempotent() {
        let grid = Grid::new_2d(16, 16, 100.0, 100.0);
        let source = ramp(grid);
        let velocity: Vec<Vec3> = (0..grid.cell_count())
            .map(|idx| {
                let [i, j, _] = grid.coords(idx);
                Vec3::new((j as f32 * 0.3).sin(), (i as f32 * 0.2).cos(), 0.0)
            })
            .collect();
        let still = vec![Vec3::zeros(); grid.cell_count()];

        let mut once = vec![0.0; grid.cell_count()];
        advect(&grid, &velocity, source.as_slice(), &mut once, 0.7);
        let mut twice = vec![0.0; grid.cell_count()];
        advect(&grid, &still, &once, &mut twice, 0.7);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_uniform_translation_shifts_linear_field() {
        let grid = Grid::new_2d(20, 20, 100.0, 100.0);
        let source = FieldData::from_fn(grid, |[i, _, _]| i as f32);
        let velocity = vec![Vec3::new(2.0, 0.0, 0.0); grid.cell_count()];
        let mut dest = vec![0.0; grid.cell_count()];

        advect(&grid, &velocity, source.as_slice(), &mut dest, 0.5);

        // Interior cells read one cell upstream
        assert_relative_eq!(dest[grid.index(10, 5, 0)], 9.0);
        // Departure points clamp at the inflow edge
        assert_relative_eq!(dest[grid.index(0, 5, 0)], 0.0);
    }

    #[test]
    fn test_sample_clamps_outside_positions() {
        let grid = Grid::new_2d(4, 4, 1.0, 1.0);
        let field = ramp(grid);
        let inside = sample_linear(&grid, field.as_slice(), Vec3::new(0.5, 0.5, 0.5));
        let outside = sample_linear(&grid, field.as_slice(), Vec3::new(-10.0, -3.0, 0.5));
        assert_eq!(inside, outside);
        let far = sample_linear(&grid, field.as_slice(), Vec3::new(50.0, 50.0, 0.5));
        assert_eq!(far, field.get(3, 3, 0));
    }

    #[test]
    fn test_trilinear_midpoint() {
        let grid = Grid::new(2, 2, 2, Vec3::new(1.0, 1.0, 1.0));
        let field = FieldData::from_fn(grid, |[i, j, k]| (i + j + k) as f32);
        let v = sample_linear(&grid, field.as_slice(), Vec3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(v, 1.5);
    }
}
