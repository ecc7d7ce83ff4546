//! Cloud simulation driver
//!
//! [`Simulation`] owns the grid, the ambient profile, every field buffer pair
//! and the active sources, and runs the per-frame pipeline:
//!
//! 1. Inject sources into the thermo field
//! 2. Advect velocity through itself
//! 3. Buoyancy, vorticity confinement and wind
//! 4. Pressure projection (free-slip bounds before and after the correction)
//! 5. Advect thermo through the projected velocity
//! 6. Condensation and precipitation
//! 7. Zero-gradient bounds on thermo
//!
//! Each stage writes a separate buffer and commits it with a swap before the
//! next stage reads it.

pub mod config;
pub mod stats;

pub use config::{
    AtmosphereConfig, FluidConfig, GridConfig, MoistureConfig, SimulationConfig, SourceConfig,
    WindConfig,
};
pub use stats::{max_speed, SimulationStats};

use crate::core_types::{Thermo, Vec3};
use crate::error::ConfigError;
use crate::grid::{FieldBuffer, FieldData, Grid};
use crate::solver::{
    advect, apply_forces, compute_curl, enforce_bounds, generate_sources, inject, inject_sources,
    project, update_thermo, BoundaryKind, Falloff, ForceParams, FrameTimer, MoistureParams,
    ProfilerScope, SourceSpec,
};
use crate::weather::AtmosphereProfile;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

/// Moist-atmosphere Stable Fluids simulation
pub struct Simulation {
    config: SimulationConfig,
    grid: Grid,
    profile: AtmosphereProfile,

    velocity: FieldBuffer<Vec3>,
    thermo: FieldBuffer<Thermo>,
    pressure: FieldBuffer<f32>,
    divergence: FieldData<f32>,
    curl: FieldData<Vec3>,

    sources: Vec<SourceSpec>,
    time: f32,
    frame: u64,
    timer: FrameTimer,
}

impl Simulation {
    /// Validate `config`, allocate every buffer and reset to equilibrium
    ///
    /// Sources come from `config.explicit_sources` when non-empty, otherwise
    /// they are sampled from `config.sources` with its seed.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let grid = config.grid.grid();

        info!(
            "Creating cloud simulation: {}x{}x{} grid, domain {:.0}x{:.0}x{:.0}m, {} pressure iterations",
            grid.nx,
            grid.ny,
            grid.nz,
            grid.domain_size.x,
            grid.domain_size.y,
            grid.domain_size.z,
            config.fluid.pressure_iterations
        );

        let mut sim = Self {
            profile: build_profile(&config, &grid),
            velocity: FieldBuffer::new(grid),
            thermo: FieldBuffer::new(grid),
            pressure: FieldBuffer::new(grid),
            divergence: FieldData::new(grid),
            curl: FieldData::new(grid),
            sources: Vec::new(),
            time: 0.0,
            frame: 0,
            timer: FrameTimer::new(),
            grid,
            config,
        };
        sim.reset();
        Ok(sim)
    }

    /// Build a simulation that starts with exactly `sources`
    pub fn with_sources(
        config: SimulationConfig,
        sources: Vec<SourceSpec>,
    ) -> Result<Self, ConfigError> {
        let mut sim = Self::new(config)?;
        sim.reset_with_sources(sources);
        Ok(sim)
    }

    /// Return to the resting state with freshly derived sources
    pub fn reset(&mut self) {
        let sources = if self.config.explicit_sources.is_empty() {
            let mut rng = StdRng::seed_from_u64(self.config.sources.seed);
            generate_sources(
                &self.grid,
                self.config.sources.count,
                &self.config.sources.ranges(),
                &mut rng,
            )
        } else {
            self.config.explicit_sources.clone()
        };
        self.reset_with_sources(sources);
    }

    /// Return to the resting state with the given sources
    ///
    /// Velocity and pressure are zeroed, thermo is set to the ambient
    /// equilibrium at the configured relative humidity.
    pub fn reset_with_sources(&mut self, sources: Vec<SourceSpec>) {
        self.profile = build_profile(&self.config, &self.grid);

        let grid = self.grid;
        let profile = &self.profile;
        let rh = self.config.atmosphere.relative_humidity;
        let equilibrium =
            FieldData::from_fn(grid, |c| profile.equilibrium_thermo(grid.height_at(c[1]), rh));

        self.velocity.fill(Vec3::zeros());
        self.thermo = FieldBuffer::from_field(equilibrium);
        self.pressure.fill(0.0);
        self.divergence.fill(0.0);
        self.curl.fill(Vec3::zeros());

        self.sources = sources;
        self.time = 0.0;
        self.frame = 0;

        info!(
            "Simulation reset: {} sources, ground {:.1}K / {:.0}Pa, lapse {:.4}K/m",
            self.sources.len(),
            self.profile.ground_temperature(),
            self.profile.ground_pressure(),
            self.profile.lapse_rate()
        );
    }

    /// Advance the simulation by `dt` seconds
    ///
    /// A non-finite or non-positive `dt` leaves the state untouched.
    pub fn step(&mut self, dt: f32) {
        if !(dt.is_finite() && dt > 0.0) {
            warn!(dt, "Skipping step with invalid timestep");
            return;
        }
        let frame_scope = ProfilerScope::new("frame");

        self.inject_sources();
        self.advect_velocity(dt);
        self.apply_forces(dt);
        self.project();
        self.advect_thermo(dt);
        self.update_thermodynamics(dt);

        self.age_sources(dt);
        self.time += dt;
        self.frame += 1;
        self.timer.record(frame_scope.elapsed_ms());

        debug!(
            "Step {}: t={:.3}s, dt={:.4}s, {} sources, max|u|={:.3} cells/s, {:.2}ms",
            self.frame,
            self.time,
            dt,
            self.sources.len(),
            max_speed(self.velocity.read()),
            self.timer.last_frame_time_ms()
        );
    }

    fn inject_sources(&mut self) {
        let _scope = ProfilerScope::new("inject_sources");
        inject_sources(
            &self.grid,
            self.thermo.read_mut(),
            &self.sources,
            self.time,
            self.config.sources.pulse_frequency,
            self.config.sources.falloff,
        );
    }

    fn advect_velocity(&mut self, dt: f32) {
        let _scope = ProfilerScope::new("advect_velocity");
        let (v, out) = self.velocity.split();
        advect(&self.grid, v, v, out, dt);
        self.velocity.swap();
    }

    fn apply_forces(&mut self, dt: f32) {
        let _scope = ProfilerScope::new("forces");
        let params = self.force_params(dt);
        compute_curl(&self.grid, self.velocity.read(), self.curl.as_mut_slice());

        let (v, out) = self.velocity.split();
        apply_forces(
            &self.grid,
            v,
            self.thermo.read(),
            self.curl.as_slice(),
            &self.profile,
            &params,
            out,
        );
        self.velocity.swap();
    }

    fn project(&mut self) {
        let _scope = ProfilerScope::new("project");
        project(
            &self.grid,
            &mut self.velocity,
            &mut self.pressure,
            &mut self.divergence,
            self.config.fluid.pressure_iterations,
        );
    }

    fn advect_thermo(&mut self, dt: f32) {
        let _scope = ProfilerScope::new("advect_thermo");
        let (t, out) = self.thermo.split();
        advect(&self.grid, self.velocity.read(), t, out, dt);
        self.thermo.swap();
    }

    fn update_thermodynamics(&mut self, dt: f32) {
        let _scope = ProfilerScope::new("thermodynamics");
        let params = self.moisture_params(dt);
        let (t, out) = self.thermo.split();
        update_thermo(&self.grid, t, &self.profile, &params, out);
        self.thermo.swap();
        enforce_bounds(&mut self.thermo, BoundaryKind::ZeroGradient);
    }

    fn age_sources(&mut self, dt: f32) {
        let before = self.sources.len();
        for source in &mut self.sources {
            source.age += dt;
        }
        self.sources.retain(|s| !s.is_expired());
        let expired = before - self.sources.len();
        if expired > 0 {
            debug!("{} sources expired, {} remaining", expired, self.sources.len());
        }
    }

    fn force_params(&self, dt: f32) -> ForceParams {
        ForceParams {
            dt,
            vorticity_strength: self.config.fluid.vorticity_strength,
            buoyancy_scale: self.config.fluid.buoyancy_scale,
            wind: self.config.wind.velocity_cells(&self.grid),
            wind_shear_exponent: self.config.wind.shear_exponent,
        }
    }

    fn moisture_params(&self, dt: f32) -> MoistureParams {
        MoistureParams {
            dt,
            boundary_layer_fraction: self.config.moisture.boundary_layer_fraction,
            precipitation_threshold: self.config.moisture.precipitation_threshold,
            evaporation_rate: self.config.moisture.evaporation_rate,
        }
    }

    /// Add a velocity impulse (cells/s) around `position` (grid units)
    ///
    /// The `z` component is dropped on 2D grids.
    pub fn add_velocity_impulse(&mut self, position: Vec3, radius: f32, mut impulse: Vec3) {
        if !self.grid.is_3d() {
            impulse.z = 0.0;
        }
        inject(
            &self.grid,
            self.velocity.read_mut(),
            position,
            radius,
            impulse,
            Falloff::Gaussian,
        );
    }

    /// Add vapor, cloud water or heat around `position` (grid units)
    ///
    /// Water species are clamped back to non-negative values afterwards.
    pub fn add_thermo(&mut self, position: Vec3, radius: f32, amount: Thermo) {
        inject(
            &self.grid,
            self.thermo.read_mut(),
            position,
            radius,
            amount,
            Falloff::Gaussian,
        );
        for cell in self.thermo.read_mut() {
            *cell = cell.clamped();
        }
    }

    /// Register an additional persistent source
    pub fn add_source(&mut self, source: SourceSpec) {
        debug!(
            "Adding source at ({:.1}, {:.1}, {:.1}) radius {:.1}",
            source.position.x, source.position.y, source.position.z, source.radius
        );
        self.sources.push(source);
    }

    /// Diagnostics for the committed state
    #[must_use]
    pub fn stats(&self) -> SimulationStats {
        SimulationStats::collect(
            &self.grid,
            self.velocity.read(),
            self.thermo.read(),
            self.time,
            self.frame,
            self.sources.len(),
        )
    }

    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[must_use]
    pub fn profile(&self) -> &AtmosphereProfile {
        &self.profile
    }

    /// Committed velocity field (cells/s)
    #[must_use]
    pub fn velocity(&self) -> &FieldData<Vec3> {
        self.velocity.field()
    }

    /// Committed thermo field
    #[must_use]
    pub fn thermo(&self) -> &FieldData<Thermo> {
        self.thermo.field()
    }

    /// Pressure from the last projection
    #[must_use]
    pub fn pressure(&self) -> &FieldData<f32> {
        self.pressure.field()
    }

    /// Divergence before the last projection
    #[must_use]
    pub fn divergence(&self) -> &FieldData<f32> {
        &self.divergence
    }

    #[must_use]
    pub fn sources(&self) -> &[SourceSpec] {
        &self.sources
    }

    /// Elapsed simulated time (s)
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Wall-clock duration of the last step (ms)
    #[must_use]
    pub fn last_frame_time_ms(&self) -> f64 {
        self.timer.last_frame_time_ms()
    }
}

fn build_profile(config: &SimulationConfig, grid: &Grid) -> AtmosphereProfile {
    let a = &config.atmosphere;
    AtmosphereProfile::generate(
        a.ground_temperature,
        a.ground_pressure,
        a.lapse_rate,
        grid.domain_size.y,
        a.layer_count,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_config() -> SimulationConfig {
        let mut config = SimulationConfig::new_2d(16, 16, 1600.0, 1600.0);
        config.sources.count = 0;
        config
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = SimulationConfig::new_2d(2, 16, 100.0, 100.0);
        assert!(Simulation::new(config).is_err());
    }

    #[test]
    fn test_reset_is_quiescent() {
        let sim = Simulation::new(quiet_config()).expect("valid config");
        assert!(sim.velocity().as_slice().iter().all(|v| *v == Vec3::zeros()));
        assert!(sim
            .thermo()
            .as_slice()
            .iter()
            .all(|t| t.cloud == 0.0 && t.theta == 0.0 && t.vapor > 0.0));
        assert_eq!(sim.frame(), 0);
    }

    #[test]
    fn test_invalid_dt_is_ignored() {
        let mut sim = Simulation::new(quiet_config()).expect("valid config");
        sim.add_velocity_impulse(Vec3::new(8.0, 8.0, 0.5), 3.0, Vec3::new(1.0, 0.0, 0.0));
        let before = sim.velocity().clone();

        sim.step(f32::NAN);
        sim.step(0.0);
        sim.step(-1.0);

        assert_eq!(sim.frame(), 0);
        assert_eq!(sim.velocity(), &before);
    }

    #[test]
    fn test_step_advances_time() {
        let mut sim = Simulation::new(quiet_config()).expect("valid config");
        sim.step(0.1);
        sim.step(0.1);
        assert_eq!(sim.frame(), 2);
        assert!((sim.time() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_sources_expire() {
        let mut sim = Simulation::new(quiet_config()).expect("valid config");
        sim.add_source(
            SourceSpec::new(Vec3::new(8.0, 2.0, 0.5), 2.0, 0.0001, 0.1).with_lifetime(0.25),
        );
        sim.add_source(SourceSpec::new(Vec3::new(4.0, 2.0, 0.5), 2.0, 0.0001, 0.1));

        sim.step(0.1);
        sim.step(0.1);
        assert_eq!(sim.sources().len(), 2);
        sim.step(0.1);
        assert_eq!(sim.sources().len(), 1);
    }

    #[test]
    fn test_seeded_sources_are_reproducible() {
        let mut config = quiet_config();
        config.sources.count = 4;
        let a = Simulation::new(config.clone()).expect("valid config");
        let b = Simulation::new(config).expect("valid config");
        assert_eq!(a.sources(), b.sources());
        assert_eq!(a.sources().len(), 4);
    }

    #[test]
    fn test_explicit_sources_replace_random_ones() {
        let mut config = quiet_config();
        config.sources.count = 5;
        config.explicit_sources = vec![SourceSpec::new(Vec3::new(8.0, 1.0, 0.5), 2.0, 0.0, 1.0)];
        let sim = Simulation::new(config).expect("valid config");
        assert_eq!(sim.sources().len(), 1);
    }

    #[test]
    fn test_add_thermo_keeps_water_non_negative() {
        let mut sim = Simulation::new(quiet_config()).expect("valid config");
        sim.add_thermo(Vec3::new(8.0, 8.0, 0.5), 4.0, Thermo::new(-1.0, -1.0, 2.0));
        assert!(sim
            .thermo()
            .as_slice()
            .iter()
            .all(|t| t.vapor >= 0.0 && t.cloud >= 0.0));
        assert!(sim.stats().max_theta > 1.0);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut config = quiet_config();
        config.sources.count = 2;
        let mut sim = Simulation::new(config).expect("valid config");
        let initial = sim.thermo().clone();
        let initial_sources = sim.sources().to_vec();

        for _ in 0..5 {
            sim.step(0.05);
        }
        sim.reset();

        assert_eq!(sim.thermo(), &initial);
        assert_eq!(sim.sources(), initial_sources.as_slice());
        assert_eq!(sim.time(), 0.0);
    }
}
