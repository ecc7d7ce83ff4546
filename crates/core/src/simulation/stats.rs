//! Per-frame diagnostics

use crate::core_types::{Thermo, Vec3};
use crate::grid::Grid;
use crate::solver::divergence_stats;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cloud water above which a cell counts as cloudy (kg/kg)
pub const CLOUD_CELL_THRESHOLD: f32 = 1e-5;

/// Snapshot of the simulation state
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationStats {
    /// Elapsed simulated time (s)
    pub time: f32,
    pub frame: u64,
    pub active_sources: usize,
    /// Largest velocity magnitude (cells/s)
    pub max_speed: f32,
    /// Mean |∇·u| over interior cells
    pub mean_divergence: f32,
    /// Max |∇·u| over interior cells
    pub max_divergence: f32,
    /// Sum of vapor mixing ratio over all cells
    pub total_vapor: f64,
    /// Sum of cloud water over all cells
    pub total_cloud: f64,
    /// Cells with cloud water above [`CLOUD_CELL_THRESHOLD`]
    pub cloud_cells: usize,
    pub max_theta: f32,
}

impl SimulationStats {
    /// Gather diagnostics from the committed fields
    #[must_use]
    pub fn collect(
        grid: &Grid,
        velocity: &[Vec3],
        thermo: &[Thermo],
        time: f32,
        frame: u64,
        active_sources: usize,
    ) -> Self {
        let max_speed = max_speed(velocity);

        let (total_vapor, total_cloud, cloud_cells, max_theta) = thermo
            .par_iter()
            .map(|t| {
                (
                    f64::from(t.vapor),
                    f64::from(t.cloud),
                    usize::from(t.cloud > CLOUD_CELL_THRESHOLD),
                    t.theta,
                )
            })
            .reduce(
                || (0.0, 0.0, 0, f32::NEG_INFINITY),
                |a, b| (a.0 + b.0, a.1 + b.1, a.2 + b.2, a.3.max(b.3)),
            );

        let (mean_divergence, max_divergence) = divergence_stats(grid, velocity);

        Self {
            time,
            frame,
            active_sources,
            max_speed,
            mean_divergence,
            max_divergence,
            total_vapor,
            total_cloud,
            cloud_cells,
            max_theta: if thermo.is_empty() { 0.0 } else { max_theta },
        }
    }

    /// True if every reported quantity is finite
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.max_speed.is_finite()
            && self.mean_divergence.is_finite()
            && self.max_divergence.is_finite()
            && self.total_vapor.is_finite()
            && self.total_cloud.is_finite()
            && self.max_theta.is_finite()
    }
}

/// Largest velocity magnitude in `velocity` (0 for an empty field)
#[must_use]
pub fn max_speed(velocity: &[Vec3]) -> f32 {
    velocity
        .par_iter()
        .map(|v| v.norm())
        .reduce(|| 0.0, f32::max)
}

impl fmt::Display for SimulationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:.2}s frame={} sources={} max|u|={:.3} div(mean/max)={:.2e}/{:.2e} \
             vapor={:.4} cloud={:.5} cloudy_cells={} max_theta={:.3}K",
            self.time,
            self.frame,
            self.active_sources,
            self.max_speed,
            self.mean_divergence,
            self.max_divergence,
            self.total_vapor,
            self.total_cloud,
            self.cloud_cells,
            self.max_theta,
        )
    }
}
