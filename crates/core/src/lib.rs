//! Cloud Simulation Core Library
//!
//! A real-time moist-atmosphere fluid solver for qualitative cloud formation.
//! Implements semi-Lagrangian Stable Fluids on a 2D or 3D grid, coupled to a
//! simplified thermodynamics model with condensation, latent heating and
//! precipitation.
//!
//! ## Pipeline
//!
//! Every frame runs source injection, velocity advection, body forces
//! (buoyancy, vorticity confinement, wind shear), Jacobi pressure projection,
//! thermo advection and the moisture update, in that order. All stages are
//! data-parallel over the grid and double-buffered.
//!
//! ```no_run
//! use cloud_sim_core::{Simulation, SimulationConfig};
//!
//! let config = SimulationConfig::new_2d(128, 128, 4000.0, 2000.0);
//! let mut sim = Simulation::new(config)?;
//! for _ in 0..600 {
//!     sim.step(1.0 / 60.0);
//! }
//! println!("{}", sim.stats());
//! # Ok::<(), cloud_sim_core::ConfigError>(())
//! ```

// Core types and utilities
pub mod core_types;
pub mod error;

// Lattice, fields and ambient atmosphere
pub mod grid;
pub mod weather;

// Numerical stages and the frame driver
pub mod simulation;
pub mod solver;

// Re-export core types
pub use core_types::{Thermo, Vec3};
pub use error::ConfigError;
pub use grid::{Axis, FieldBuffer, FieldData, FieldValue, Grid};
pub use weather::{AtmosphereLayer, AtmosphereProfile};

// Re-export solver types
pub use solver::{BoundaryKind, Falloff, SourceSpec};

// Re-export simulation types
pub use simulation::{
    AtmosphereConfig, FluidConfig, GridConfig, MoistureConfig, Simulation, SimulationConfig,
    SimulationStats, SourceConfig, WindConfig,
};
