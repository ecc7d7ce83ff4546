//! Vector type alias for grid positions and velocities.

use nalgebra::Vector3;

/// 3D vector type for positions, velocities, and vorticity.
///
/// Alias for `nalgebra::Vector3<f32>`. Two-dimensional grids use the same
/// type with the `z` component held at zero, so every kernel works on a
/// single velocity representation.
pub type Vec3 = Vector3<f32>;
