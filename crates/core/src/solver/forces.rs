//! Body forces on the velocity field
//!
//! Three additive accelerations, all evaluated against the same pre-force
//! velocity snapshot and written to a separate buffer:
//!
//! - **Buoyancy**: `b = s · g · θ′·Π(p) / T_amb(h)` along +y. Velocities are
//!   in cells/s, so `g` is taken in cells/s² and `s` is the configured
//!   buoyancy scale.
//! - **Vorticity confinement** (Fedkiw et al. 2001): `f = ε (N × ω)` with
//!   `N = ∇|ω| / |∇|ω||`. In 2D `ω = (0, 0, ω_z)`, which reduces the cross
//!   product to the usual 90° rotation.
//! - **Wind shear**: power-law profile `u(h) = u_ref · (h / H)^α`.
//!
//! # References
//!
//! - Fedkiw, R., Stam, J., Jensen, H.W. (2001). "Visual simulation of smoke."
//!   SIGGRAPH 2001.
//! - Peterson, E.W., Hennessey, J.P. (1978). "On the use of power laws for
//!   estimates of wind power potential." J. Applied Meteorology, 17, 390-394.

use crate::core_types::{Thermo, Vec3};
use crate::grid::Grid;
use crate::weather::constants::GRAVITY;
use crate::weather::AtmosphereProfile;
use rayon::prelude::*;

/// Guards the normalization of a vanishing vorticity gradient
const GRADIENT_EPSILON: f32 = 1e-6;

/// Per-frame forcing parameters
#[derive(Debug, Clone, Copy)]
pub struct ForceParams {
    /// Timestep in seconds
    pub dt: f32,
    /// Vorticity confinement strength ε
    pub vorticity_strength: f32,
    /// Multiplier on the buoyant acceleration `g · θ′Π / T` (cells/s²)
    pub buoyancy_scale: f32,
    /// Reference wind at the domain top, in cells/s (horizontal only)
    pub wind: Vec3,
    /// Power-law shear exponent α
    pub wind_shear_exponent: f32,
}

/// Central-difference curl of `velocity` on interior cells (zero elsewhere)
pub fn compute_curl(grid: &Grid, velocity: &[Vec3], curl: &mut [Vec3]) {
    let sx = grid.stride(crate::grid::Axis::X);
    let sy = grid.stride(crate::grid::Axis::Y);
    let sz = grid.stride(crate::grid::Axis::Z);
    let is_3d = grid.is_3d();

    curl.par_iter_mut().enumerate().for_each(|(idx, w)| {
        if grid.is_boundary(grid.coords(idx)) {
            *w = Vec3::zeros();
            return;
        }

        let dvx_dy = 0.5 * (velocity[idx + sy].x - velocity[idx - sy].x);
        let dvy_dx = 0.5 * (velocity[idx + sx].y - velocity[idx - sx].y);

        *w = if is_3d {
            let dvx_dz = 0.5 * (velocity[idx + sz].x - velocity[idx - sz].x);
            let dvy_dz = 0.5 * (velocity[idx + sz].y - velocity[idx - sz].y);
            let dvz_dx = 0.5 * (velocity[idx + sx].z - velocity[idx - sx].z);
            let dvz_dy = 0.5 * (velocity[idx + sy].z - velocity[idx - sy].z);
            Vec3::new(dvz_dy - dvy_dz, dvx_dz - dvz_dx, dvy_dx - dvx_dy)
        } else {
            Vec3::new(0.0, 0.0, dvy_dx - dvx_dy)
        };
    });
}

/// Vorticity-confinement acceleration at interior cell `idx`
#[inline]
fn confinement_at(grid: &Grid, curl: &[Vec3], idx: usize) -> Vec3 {
    let mut gradient = Vec3::zeros();
    for &axis in grid.active_axes() {
        let s = grid.stride(axis);
        gradient[axis.index()] = 0.5 * (curl[idx + s].norm() - curl[idx - s].norm());
    }

    let magnitude = gradient.norm();
    if magnitude < GRADIENT_EPSILON {
        return Vec3::zeros();
    }
    (gradient / magnitude).cross(&curl[idx])
}

/// Unscaled buoyant acceleration (cells/s², +y up) for a cell at height `h`
#[inline]
#[must_use]
pub fn buoyancy(profile: &AtmosphereProfile, thermo: Thermo, h: f32) -> f32 {
    let layer = profile.sample(h);
    if layer.temperature <= 0.0 {
        return 0.0;
    }
    let temperature_excess = thermo.theta * profile.exner(layer.pressure);
    GRAVITY * temperature_excess / layer.temperature
}

/// Shear-scaled wind at normalized height `fraction` in `[0, 1]`
#[inline]
#[must_use]
pub fn sheared_wind(wind: Vec3, fraction: f32, exponent: f32) -> Vec3 {
    wind * fraction.clamp(0.0, 1.0).powf(exponent)
}

/// Apply buoyancy, vorticity confinement and wind to interior cells
///
/// `curl` must already hold [`compute_curl`] of `v_in`. Boundary cells are
/// copied through unchanged.
pub fn apply_forces(
    grid: &Grid,
    v_in: &[Vec3],
    thermo: &[Thermo],
    curl: &[Vec3],
    profile: &AtmosphereProfile,
    params: &ForceParams,
    v_out: &mut [Vec3],
) {
    let confine = params.vorticity_strength != 0.0;
    let wind = params.wind != Vec3::zeros();

    v_out.par_iter_mut().enumerate().for_each(|(idx, v)| {
        let c = grid.coords(idx);
        if grid.is_boundary(c) {
            *v = v_in[idx];
            return;
        }

        let mut accel = Vec3::zeros();

        accel.y += params.buoyancy_scale * buoyancy(profile, thermo[idx], grid.height_at(c[1]));

        if confine {
            accel += confinement_at(grid, curl, idx) * params.vorticity_strength;
        }

        if wind {
            accel += sheared_wind(
                params.wind,
                grid.normalized_height(c[1]),
                params.wind_shear_exponent,
            );
        }

        *v = v_in[idx] + accel * params.dt;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::FieldData;
    use approx::assert_relative_eq;

    fn profile(grid: &Grid) -> AtmosphereProfile {
        AtmosphereProfile::generate(295.0, 101_325.0, 0.0065, grid.domain_size.y, 32)
    }

    fn params() -> ForceParams {
        ForceParams {
            dt: 0.1,
            vorticity_strength: 0.0,
            buoyancy_scale: 1.0,
            wind: Vec3::zeros(),
            wind_shear_exponent: 0.14,
        }
    }

    #[test]
    fn test_warm_cell_accelerates_upward_cold_cell_downward() {
        let grid = Grid::new_2d(8, 8, 800.0, 800.0);
        let profile = profile(&grid);
        let mut thermo = vec![Thermo::ZERO; grid.cell_count()];
        let warm = grid.index(3, 3, 0);
        let cold = grid.index(5, 5, 0);
        thermo[warm].theta = 5.0;
        thermo[cold].theta = -5.0;

        let v_in = vec![Vec3::zeros(); grid.cell_count()];
        let curl = vec![Vec3::zeros(); grid.cell_count()];
        let mut v_out = vec![Vec3::zeros(); grid.cell_count()];
        apply_forces(&grid, &v_in, &thermo, &curl, &profile, &params(), &mut v_out);

        assert!(v_out[warm].y > 0.0);
        assert!(v_out[cold].y < 0.0);
        assert_eq!(v_out[warm].x, 0.0);
        assert_eq!(v_out[grid.index(1, 1, 0)], Vec3::zeros());
    }

    #[test]
    fn test_buoyancy_matches_temperature_ratio_and_scale() {
        let grid = Grid::new_2d(8, 8, 800.0, 800.0);
        let profile = profile(&grid);
        let warm = Thermo::new(0.0, 0.0, 2.95);
        // Ground level: Π = 1, T = 295 K
        assert_relative_eq!(buoyancy(&profile, warm, 0.0), GRAVITY * 0.01, epsilon = 1e-6);

        let thermo = vec![warm; grid.cell_count()];
        let v_in = vec![Vec3::zeros(); grid.cell_count()];
        let curl = vec![Vec3::zeros(); grid.cell_count()];
        let mut once = vec![Vec3::zeros(); grid.cell_count()];
        let mut tenfold = vec![Vec3::zeros(); grid.cell_count()];
        let scaled = ForceParams {
            buoyancy_scale: 10.0,
            ..params()
        };
        apply_forces(&grid, &v_in, &thermo, &curl, &profile, &params(), &mut once);
        apply_forces(&grid, &v_in, &thermo, &curl, &profile, &scaled, &mut tenfold);

        let idx = grid.index(4, 4, 0);
        assert!(once[idx].y > 0.0);
        assert_relative_eq!(tenfold[idx].y, 10.0 * once[idx].y, max_relative = 1e-5);
    }

    #[test]
    fn test_curl_of_solid_rotation() {
        let grid = Grid::new_2d(9, 9, 1.0, 1.0);
        let c = grid.center();
        let velocity = FieldData::from_fn(grid, |cell| {
            let d = grid.cell_center(cell) - c;
            Vec3::new(-d.y, d.x, 0.0)
        });
        let mut curl = vec![Vec3::zeros(); grid.cell_count()];
        compute_curl(&grid, velocity.as_slice(), &mut curl);
        assert_relative_eq!(curl[grid.index(4, 4, 0)].z, 2.0, epsilon = 1e-5);
        assert_eq!(curl[grid.index(0, 4, 0)], Vec3::zeros());
    }

    #[test]
    fn test_curl_3d_matches_analytic() {
        let grid = Grid::new(7, 7, 7, Vec3::new(1.0, 1.0, 1.0));
        // v = (0, 0, y) has curl (1, 0, 0)
        let velocity = FieldData::from_fn(grid, |[_, j, _]| Vec3::new(0.0, 0.0, j as f32));
        let mut curl = vec![Vec3::zeros(); grid.cell_count()];
        compute_curl(&grid, velocity.as_slice(), &mut curl);
        let w = curl[grid.index(3, 3, 3)];
        assert_relative_eq!(w.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(w.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(w.z, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_confinement_pushes_perpendicular_to_gradient() {
        let grid = Grid::new_2d(7, 7, 1.0, 1.0);
        // |ω| grows with x, ω points along +z: N = +x, N × ω = -y
        let curl: Vec<Vec3> = (0..grid.cell_count())
            .map(|idx| Vec3::new(0.0, 0.0, grid.coords(idx)[0] as f32))
            .collect();
        let f = confinement_at(&grid, &curl, grid.index(3, 3, 0));
        assert_relative_eq!(f.x, 0.0);
        assert!(f.y < 0.0);
    }

    #[test]
    fn test_zero_strength_disables_confinement() {
        let grid = Grid::new_2d(7, 7, 700.0, 700.0);
        let profile = profile(&grid);
        let thermo = vec![Thermo::ZERO; grid.cell_count()];
        let v_in: Vec<Vec3> = (0..grid.cell_count())
            .map(|idx| Vec3::new(grid.coords(idx)[1] as f32, 0.0, 0.0))
            .collect();
        let mut curl = vec![Vec3::zeros(); grid.cell_count()];
        compute_curl(&grid, &v_in, &mut curl);
        let mut v_out = vec![Vec3::zeros(); grid.cell_count()];
        apply_forces(&grid, &v_in, &thermo, &curl, &profile, &params(), &mut v_out);
        assert_eq!(v_out, v_in);
    }

    #[test]
    fn test_wind_grows_with_height() {
        let wind = Vec3::new(4.0, 0.0, 0.0);
        let low = sheared_wind(wind, 0.1, 0.25);
        let high = sheared_wind(wind, 0.9, 0.25);
        assert!(high.x > low.x);
        assert_relative_eq!(sheared_wind(wind, 1.0, 0.25).x, 4.0);
        assert_relative_eq!(sheared_wind(wind, 0.5, 0.0).x, 4.0);
    }
}
