//! Point sources
//!
//! Additive injection of a value into every cell within a radius of a
//! point, weighted by a falloff that reaches zero at the radius. Batched
//! atmospheric sources pulse with intensity `0.7 + 0.3·sin(t·ω + φ)`.

use crate::core_types::{Thermo, Vec3};
use crate::grid::{FieldValue, Grid};
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Radial weighting of an injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Falloff {
    /// Gaussian with σ = r/3, shifted and rescaled to reach zero at `r`
    #[default]
    Gaussian,
    /// `(1 − (d/r)²)²`
    Smooth,
    /// Full weight everywhere inside the radius
    Constant,
}

impl Falloff {
    /// Weight at `distance` from the center for a source of `radius`
    ///
    /// Always in `[0, 1]`, 1 at the center, 0 at and beyond the radius.
    #[must_use]
    pub fn weight(self, distance: f32, radius: f32) -> f32 {
        if radius <= 0.0 || distance >= radius {
            return 0.0;
        }
        let x = distance / radius;
        match self {
            Falloff::Gaussian => {
                // exp(-d²/(2σ²)) with σ = r/3 → exp(-4.5 x²)
                let edge = (-4.5_f32).exp();
                (((-4.5 * x * x).exp() - edge) / (1.0 - edge)).max(0.0)
            }
            Falloff::Smooth => {
                let s = 1.0 - x * x;
                s * s
            }
            Falloff::Constant => 1.0,
        }
    }
}

/// Distance in grid units, ignoring depth on 2D grids
#[inline]
fn distance(grid: &Grid, a: Vec3, b: Vec3) -> f32 {
    let mut d = a - b;
    if !grid.is_3d() {
        d.z = 0.0;
    }
    d.norm()
}

/// Add `value` to every cell of `field` within `radius` cells of `position`
///
/// `position` is in grid units (cell centers at `i + 0.5`).
pub fn inject<T: FieldValue>(
    grid: &Grid,
    field: &mut [T],
    position: Vec3,
    radius: f32,
    value: T,
    falloff: Falloff,
) {
    if radius <= 0.0 {
        return;
    }
    field.par_iter_mut().enumerate().for_each(|(idx, cell)| {
        let d = distance(grid, grid.cell_center(grid.coords(idx)), position);
        let w = falloff.weight(d, radius);
        if w > 0.0 {
            *cell = *cell + value * w;
        }
    });
}

/// Persistent moisture/heat source owned by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Center in grid units
    pub position: Vec3,
    /// Radius in cells
    pub radius: f32,
    /// Vapor added per frame at full intensity (kg/kg)
    pub moisture: f32,
    /// `θ′` added per frame at full intensity (K)
    pub heat: f32,
    /// Pulse phase; `None` injects at constant strength
    pub phase: Option<f32>,
    /// Seconds the source has been active
    pub age: f32,
    /// Seconds until the source expires
    pub lifetime: f32,
}

impl SourceSpec {
    /// Constant-strength source that never expires
    #[must_use]
    pub fn new(position: Vec3, radius: f32, moisture: f32, heat: f32) -> Self {
        Self {
            position,
            radius,
            moisture,
            heat,
            phase: None,
            age: 0.0,
            lifetime: f32::MAX,
        }
    }

    #[must_use]
    pub fn with_phase(mut self, phase: f32) -> Self {
        self.phase = Some(phase);
        self
    }

    #[must_use]
    pub fn with_lifetime(mut self, lifetime: f32) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Pulse multiplier at simulation time `time` for angular frequency `omega`
    #[must_use]
    pub fn intensity(&self, time: f32, omega: f32) -> f32 {
        self.phase
            .map_or(1.0, |phase| 0.7 + 0.3 * (time * omega + phase).sin())
    }

    /// Per-frame thermo increment at the source center
    #[must_use]
    pub fn injection(&self, time: f32, omega: f32) -> Thermo {
        let i = self.intensity(time, omega);
        Thermo::new(self.moisture * i, 0.0, self.heat * i)
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.age >= self.lifetime
    }
}

/// Inject every source into `thermo` in a single grid pass
pub fn inject_sources(
    grid: &Grid,
    thermo: &mut [Thermo],
    sources: &[SourceSpec],
    time: f32,
    omega: f32,
    falloff: Falloff,
) {
    if sources.is_empty() {
        return;
    }
    let injections: Vec<Thermo> = sources.iter().map(|s| s.injection(time, omega)).collect();

    thermo.par_iter_mut().enumerate().for_each(|(idx, cell)| {
        let center = grid.cell_center(grid.coords(idx));
        for (source, value) in sources.iter().zip(&injections) {
            let w = falloff.weight(distance(grid, center, source.position), source.radius);
            if w > 0.0 {
                *cell = *cell + *value * w;
            }
        }
    });
}

/// Ranges for randomly sampled sources
#[derive(Debug, Clone, Copy)]
pub struct SourceRanges {
    pub radius: (f32, f32),
    pub moisture: (f32, f32),
    pub heat: (f32, f32),
    /// Maximum spawn height as a fraction of the domain height
    pub max_height_fraction: f32,
    pub lifetime: f32,
}

/// Sample `count` ground-level sources from `rng`
///
/// Deterministic for a seeded generator. Ranges must satisfy `min <= max`.
pub fn generate_sources<R: Rng>(
    grid: &Grid,
    count: usize,
    ranges: &SourceRanges,
    rng: &mut R,
) -> Vec<SourceSpec> {
    let max_y = (grid.ny as f32 * ranges.max_height_fraction).max(0.5);

    (0..count)
        .map(|_| {
            let x = rng.random_range(0.5..=grid.nx as f32 - 0.5);
            let y = rng.random_range(0.5..=max_y);
            let z = if grid.is_3d() {
                rng.random_range(0.5..=grid.nz as f32 - 0.5)
            } else {
                0.5
            };
            SourceSpec {
                position: Vec3::new(x, y, z),
                radius: rng.random_range(ranges.radius.0..=ranges.radius.1),
                moisture: rng.random_range(ranges.moisture.0..=ranges.moisture.1),
                heat: rng.random_range(ranges.heat.0..=ranges.heat.1),
                phase: Some(rng.random_range(0.0..TAU)),
                age: 0.0,
                lifetime: ranges.lifetime,
            }
        })
        .collect()
}
