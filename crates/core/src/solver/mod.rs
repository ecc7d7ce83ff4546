//! Stable Fluids solver stages
//!
//! Each stage is a full-grid rayon pass that reads committed buffers and
//! writes a distinct destination; the per-frame driver in
//! [`crate::simulation`] swaps buffers between stages.
//!
//! Per-frame order:
//!
//! ```text
//! inject sources → advect velocity → forces → project (+ bounds)
//!     → advect thermo → thermodynamics → bounds
//! ```

pub mod advection;
pub mod boundary;
pub mod forces;
pub mod pressure;
pub mod profiler;
pub mod sources;
pub mod thermodynamics;

pub use advection::{advect, sample_linear};
pub use boundary::{enforce_bounds, BoundaryKind};
pub use forces::{apply_forces, compute_curl, ForceParams};
pub use pressure::{divergence_stats, project};
pub use profiler::{FrameTimer, ProfilerScope};
pub use sources::{generate_sources, inject, inject_sources, Falloff, SourceRanges, SourceSpec};
pub use thermodynamics::{update_thermo, MoistureParams};
