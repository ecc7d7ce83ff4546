//! Simulation configuration
//!
//! All host-tunable scalars in one serde-serializable tree. Defaults
//! describe a 128×128 moist-convection demo over a 4 km × 2 km slice.

use crate::core_types::Vec3;
use crate::error::ConfigError;
use crate::grid::{Axis, Grid};
use crate::solver::{Falloff, SourceRanges, SourceSpec};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Grid resolution and physical extent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub nx: usize,
    pub ny: usize,
    /// 1 for a 2D simulation
    pub nz: usize,
    /// Domain extent in meters (x, y = height, z)
    pub domain_size: Vec3,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            nx: 128,
            ny: 128,
            nz: 1,
            domain_size: Vec3::new(4000.0, 2000.0, 0.0),
        }
    }
}

impl GridConfig {
    #[must_use]
    pub fn grid(&self) -> Grid {
        Grid::new(self.nx, self.ny, self.nz, self.domain_size)
    }
}

/// Ground conditions for the ambient profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AtmosphereConfig {
    /// Surface temperature (K)
    pub ground_temperature: f32,
    /// Surface pressure (Pa)
    pub ground_pressure: f32,
    /// Temperature decrease with height (K/m)
    pub lapse_rate: f32,
    /// Relative humidity of the resting state (fraction of saturation)
    pub relative_humidity: f32,
    /// Number of lookup layers in the profile
    pub layer_count: usize,
}

impl Default for AtmosphereConfig {
    fn default() -> Self {
        Self {
            ground_temperature: 295.0,
            ground_pressure: 101_325.0,
            lapse_rate: 0.0065,
            relative_humidity: 0.7,
            layer_count: 256,
        }
    }
}

/// Velocity solver settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FluidConfig {
    /// Jacobi sweeps per projection
    pub pressure_iterations: usize,
    /// Vorticity confinement strength ε
    pub vorticity_strength: f32,
    /// Multiplier on the buoyant acceleration `g · θ′Π / T`, taken in cells/s²
    pub buoyancy_scale: f32,
}

impl Default for FluidConfig {
    fn default() -> Self {
        Self {
            pressure_iterations: 5,
            vorticity_strength: 0.3,
            buoyancy_scale: 10.0,
        }
    }
}

/// Background wind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindConfig {
    /// Wind speed at the domain top (m/s)
    pub speed: f32,
    /// Heading in the horizontal plane, degrees from +x toward +z
    pub direction_degrees: f32,
    /// Power-law shear exponent (≈0.14 over open terrain)
    pub shear_exponent: f32,
}

impl Default for WindConfig {
    fn default() -> Self {
        Self {
            speed: 0.0,
            direction_degrees: 0.0,
            shear_exponent: 0.14,
        }
    }
}

impl WindConfig {
    /// Wind vector in cells/s for `grid`
    #[must_use]
    pub fn velocity_cells(&self, grid: &Grid) -> Vec3 {
        let heading = self.direction_degrees.to_radians();
        let cell_x = grid.domain_size.x / grid.nx as f32;
        let vx = if cell_x > 0.0 {
            self.speed * heading.cos() / cell_x
        } else {
            0.0
        };
        let vz = if grid.is_3d() {
            let cell_z = grid.domain_size.z / grid.nz as f32;
            if cell_z > 0.0 {
                self.speed * heading.sin() / cell_z
            } else {
                0.0
            }
        } else {
            0.0
        };
        Vec3::new(vx, 0.0, vz)
    }
}

/// Condensation and fallout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoistureConfig {
    /// Normalized height of the boundary-layer top
    pub boundary_layer_fraction: f32,
    /// Cloud water a cell holds before precipitating (kg/kg)
    pub precipitation_threshold: f32,
    /// Fraction of the saturation deficit evaporated per second (0 = off)
    pub evaporation_rate: f32,
}

impl Default for MoistureConfig {
    fn default() -> Self {
        Self {
            boundary_layer_fraction: 0.3,
            precipitation_threshold: 0.004,
            evaporation_rate: 0.0,
        }
    }
}

/// Randomly sampled ground sources created at reset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub count: usize,
    pub seed: u64,
    /// Seconds each source stays active
    pub lifetime: f32,
    /// Radius range in cells
    pub radius: (f32, f32),
    /// Per-frame vapor range (kg/kg)
    pub moisture: (f32, f32),
    /// Per-frame `θ′` range (K)
    pub heat: (f32, f32),
    /// Maximum spawn height as a fraction of the domain height
    pub max_height_fraction: f32,
    /// Pulse angular frequency ω (rad/s)
    pub pulse_frequency: f32,
    pub falloff: Falloff,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            count: 3,
            seed: 42,
            lifetime: 120.0,
            radius: (4.0, 8.0),
            moisture: (0.00005, 0.0002),
            heat: (0.05, 0.2),
            max_height_fraction: 0.08,
            pulse_frequency: 0.5,
            falloff: Falloff::Gaussian,
        }
    }
}

impl SourceConfig {
    #[must_use]
    pub fn ranges(&self) -> SourceRanges {
        SourceRanges {
            radius: self.radius,
            moisture: self.moisture,
            heat: self.heat,
            max_height_fraction: self.max_height_fraction,
            lifetime: self.lifetime,
        }
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub grid: GridConfig,
    pub atmosphere: AtmosphereConfig,
    pub fluid: FluidConfig,
    pub wind: WindConfig,
    pub moisture: MoistureConfig,
    pub sources: SourceConfig,
    /// Explicit sources; when non-empty they replace the random ones
    pub explicit_sources: Vec<SourceSpec>,
}

fn finite(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite { name, value })
    }
}

fn non_negative(name: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(name, value)?;
    if value < 0.0 {
        return Err(ConfigError::OutOfRange {
            name,
            value,
            requirement: "non-negative",
        });
    }
    Ok(())
}

fn ordered(name: &'static str, range: (f32, f32)) -> Result<(), ConfigError> {
    finite(name, range.0)?;
    finite(name, range.1)?;
    if range.0 > range.1 {
        return Err(ConfigError::InvertedRange {
            name,
            min: range.0,
            max: range.1,
        });
    }
    Ok(())
}

impl SimulationConfig {
    /// Default configuration on a 2D grid
    #[must_use]
    pub fn new_2d(nx: usize, ny: usize, width: f32, height: f32) -> Self {
        Self {
            grid: GridConfig {
                nx,
                ny,
                nz: 1,
                domain_size: Vec3::new(width, height, 0.0),
            },
            ..Self::default()
        }
    }

    /// Default configuration on a 3D grid
    #[must_use]
    pub fn new_3d(nx: usize, ny: usize, nz: usize, domain_size: Vec3) -> Self {
        Self {
            grid: GridConfig {
                nx,
                ny,
                nz,
                domain_size,
            },
            ..Self::default()
        }
    }

    /// Check every structural and scalar constraint
    ///
    /// Degenerate physics (zero lapse rate, zero ground pressure) is accepted;
    /// the formulas defend against it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.grid;
        if g.nz == 0 || g.nz == 2 {
            return Err(ConfigError::UnsupportedDepth(g.nz));
        }
        let grid = g.grid();
        for &axis in grid.active_axes() {
            let cells = grid.axis_len(axis);
            if cells < 3 {
                return Err(ConfigError::GridTooSmall { axis, cells });
            }
            let value = g.domain_size[axis.index()];
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidDomain { axis, value });
            }
        }
        if !grid.is_3d() && !g.domain_size.z.is_finite() {
            return Err(ConfigError::InvalidDomain {
                axis: Axis::Z,
                value: g.domain_size.z,
            });
        }

        let a = &self.atmosphere;
        if a.layer_count < 2 {
            return Err(ConfigError::TooFewLayers(a.layer_count));
        }
        finite("atmosphere.ground_temperature", a.ground_temperature)?;
        non_negative("atmosphere.ground_pressure", a.ground_pressure)?;
        finite("atmosphere.lapse_rate", a.lapse_rate)?;
        non_negative("atmosphere.relative_humidity", a.relative_humidity)?;
        if a.lapse_rate > 0.0
            && a.ground_temperature > 0.0
            && g.domain_size.y >= a.ground_temperature / a.lapse_rate
        {
            return Err(ConfigError::OutOfRange {
                name: "grid.domain_size.y",
                value: g.domain_size.y,
                requirement: "below the atmosphere top (ground_temperature / lapse_rate)",
            });
        }

        finite("fluid.vorticity_strength", self.fluid.vorticity_strength)?;
        finite("fluid.buoyancy_scale", self.fluid.buoyancy_scale)?;

        finite("wind.speed", self.wind.speed)?;
        finite("wind.direction_degrees", self.wind.direction_degrees)?;
        non_negative("wind.shear_exponent", self.wind.shear_exponent)?;

        let m = &self.moisture;
        non_negative("moisture.boundary_layer_fraction", m.boundary_layer_fraction)?;
        non_negative("moisture.precipitation_threshold", m.precipitation_threshold)?;
        non_negative("moisture.evaporation_rate", m.evaporation_rate)?;

        let s = &self.sources;
        non_negative("sources.lifetime", s.lifetime)?;
        ordered("sources.radius", s.radius)?;
        ordered("sources.moisture", s.moisture)?;
        ordered("sources.heat", s.heat)?;
        non_negative("sources.max_height_fraction", s.max_height_fraction)?;
        finite("sources.pulse_frequency", s.pulse_frequency)?;

        Ok(())
    }

    /// Parse a JSON configuration; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load and validate a JSON configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Save as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}
