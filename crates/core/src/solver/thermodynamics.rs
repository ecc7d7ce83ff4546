//! Moisture, condensation and precipitation
//!
//! Purely local saturation adjustment per cell:
//!
//! 1. Look up ambient `T`, `p` at the cell height and the Exner factor `Π`.
//! 2. Pick the saturation reference temperature: the parcel temperature
//!    `T + θ′·Π` inside the boundary layer, the ambient temperature above it.
//! 3. Vapor above `q_sat` condenses into cloud water and warms the cell by
//!    `Δq · L / (c_p · Π)`.
//! 4. Optionally, cloud water in subsaturated air evaporates back at
//!    `evaporation_rate` per second and cools the cell by the same factor.
//! 5. Cloud water above the precipitation threshold falls out of the system.
//!
//! Water species never go negative.

use crate::core_types::Thermo;
use crate::grid::Grid;
use crate::weather::constants::{CP_AIR, LATENT_HEAT};
use crate::weather::{saturation_mixing_ratio, AtmosphereProfile};
use rayon::prelude::*;

/// Floor for the Exner factor when converting latent heat to `θ′`
const MIN_EXNER: f32 = 1e-3;

/// Per-frame moisture parameters
#[derive(Debug, Clone, Copy)]
pub struct MoistureParams {
    /// Timestep in seconds
    pub dt: f32,
    /// Normalized height of the boundary-layer top
    pub boundary_layer_fraction: f32,
    /// Maximum cloud water a cell holds before precipitating (kg/kg)
    pub precipitation_threshold: f32,
    /// Fraction of the saturation deficit evaporated per second (0 = off)
    pub evaporation_rate: f32,
}

/// Saturation adjustment of a single cell at physical height `h`
#[must_use]
pub fn adjust_cell(
    profile: &AtmosphereProfile,
    state: Thermo,
    h: f32,
    normalized_height: f32,
    params: &MoistureParams,
) -> Thermo {
    let layer = profile.sample(h);
    let exner = profile.exner(layer.pressure);

    let reference_temperature = if normalized_height < params.boundary_layer_fraction {
        layer.temperature + state.theta * exner
    } else {
        layer.temperature
    };
    let q_sat = saturation_mixing_ratio(reference_temperature, layer.pressure);
    let heating = LATENT_HEAT / CP_AIR / exner.max(MIN_EXNER);

    let mut vapor = state.vapor.max(0.0);
    let mut cloud = state.cloud.max(0.0);
    let mut theta = state.theta;

    if vapor > q_sat {
        let condensed = vapor - q_sat;
        vapor = q_sat;
        cloud += condensed;
        theta += condensed * heating;
    } else if params.evaporation_rate > 0.0 && cloud > 0.0 {
        let fraction = (params.evaporation_rate * params.dt).min(1.0);
        let evaporated = ((q_sat - vapor) * fraction).min(cloud);
        vapor += evaporated;
        cloud -= evaporated;
        theta -= evaporated * heating;
    }

    // Fallout leaves the domain; nothing accumulates at the surface
    cloud = cloud.min(params.precipitation_threshold.max(0.0));

    Thermo::new(vapor, cloud, theta).clamped()
}

/// Update every cell of `t_in` into `t_out`
pub fn update_thermo(
    grid: &Grid,
    t_in: &[Thermo],
    profile: &AtmosphereProfile,
    params: &MoistureParams,
    t_out: &mut [Thermo],
) {
    t_out.par_iter_mut().enumerate().for_each(|(idx, out)| {
        let j = grid.coords(idx)[1];
        *out = adjust_cell(
            profile,
            t_in[idx],
            grid.height_at(j),
            grid.normalized_height(j),
            params,
        );
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn profile() -> AtmosphereProfile {
        AtmosphereProfile::generate(295.0, 101_325.0, 0.0065, 2000.0, 64)
    }

    fn params() -> MoistureParams {
        MoistureParams {
            dt: 1.0 / 60.0,
            boundary_layer_fraction: 0.3,
            precipitation_threshold: 0.01,
            evaporation_rate: 0.0,
        }
    }

    #[test]
    fn test_subsaturated_cell_unchanged() {
        let profile = profile();
        let state = profile.equilibrium_thermo(1500.0, 0.5);
        let out = adjust_cell(&profile, state, 1500.0, 0.75, &params());
        assert_eq!(out, state);
    }

    #[test]
    fn test_supersaturation_condenses_and_warms() {
        let profile = profile();
        let layer = profile.sample(1500.0);
        let q_sat = saturation_mixing_ratio(layer.temperature, layer.pressure);
        let state = Thermo::vapor(q_sat + 0.002);

        let out = adjust_cell(&profile, state, 1500.0, 0.75, &params());

        assert_relative_eq!(out.vapor, q_sat, max_relative = 1e-5);
        assert_relative_eq!(out.cloud, 0.002, epsilon = 1e-6);
        assert!(out.theta > 0.0);
        // Total water is conserved below the precipitation threshold
        assert_relative_eq!(out.total_water(), state.total_water(), max_relative = 1e-5);
    }

    #[test]
    fn test_warm_boundary_layer_holds_more_vapor() {
        let profile = profile();
        let layer = profile.sample(200.0);
        let q_ambient = saturation_mixing_ratio(layer.temperature, layer.pressure);
        // Slightly supersaturated relative to ambient but heated by 5 K
        let state = Thermo::new(q_ambient * 1.05, 0.0, 5.0);

        let in_boundary_layer = adjust_cell(&profile, state, 200.0, 0.1, &params());
        assert_eq!(in_boundary_layer.cloud, 0.0);

        let free_atmosphere = adjust_cell(&profile, state, 200.0, 0.5, &params());
        assert!(free_atmosphere.cloud > 0.0);
    }

    #[test]
    fn test_precipitation_caps_cloud_water() {
        let profile = profile();
        let state = Thermo::new(0.0, 0.05, 0.0);
        let out = adjust_cell(&profile, state, 1000.0, 0.5, &params());
        assert_eq!(out.cloud, 0.01);
    }

    #[test]
    fn test_negative_species_clamp_to_zero() {
        let profile = profile();
        let out = adjust_cell(&profile, Thermo::new(-0.01, -0.02, -1.0), 100.0, 0.05, &params());
        assert_eq!(out.vapor, 0.0);
        assert_eq!(out.cloud, 0.0);
        assert_eq!(out.theta, -1.0);
    }

    #[test]
    fn test_evaporation_when_enabled() {
        let profile = profile();
        let state = Thermo::new(0.0, 0.001, 0.0);
        let mut p = params();

        let off = adjust_cell(&profile, state, 1000.0, 0.5, &p);
        assert_eq!(off.cloud, 0.001);

        p.evaporation_rate = 60.0;
        let on = adjust_cell(&profile, state, 1000.0, 0.5, &p);
        assert!(on.cloud < 0.001);
        assert!(on.vapor > 0.0);
        assert!(on.theta < 0.0);
    }
}
