//! Grid dimensions, axis helpers and flat indexing
//!
//! Cells are stored x-fastest: `index = (k * ny + j) * nx + i`. The `y` axis
//! is vertical in both 2D and 3D grids; a 2D grid is a 3D grid with `nz = 1`.

use crate::core_types::Vec3;
use serde::{Deserialize, Serialize};

/// Spatial axis of the simulation grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// All three axes in pass order
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Horizontal and vertical axes of a 2D grid
    pub const PLANAR: [Axis; 2] = [Axis::X, Axis::Y];

    /// Component index of this axis in a `Vec3`
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Fixed simulation lattice plus the physical domain it covers
///
/// Immutable after initialization. Velocities are expressed in cells per
/// second, so the physical `domain_size` only enters through heights
/// (atmosphere lookup, wind shear) and the wind speed conversion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    /// Physical extent of the domain in meters (x, y = height, z)
    pub domain_size: Vec3,
}

impl Grid {
    #[must_use]
    pub fn new(nx: usize, ny: usize, nz: usize, domain_size: Vec3) -> Self {
        Self {
            nx,
            ny,
            nz,
            domain_size,
        }
    }

    /// Create a 2D grid (`nz = 1`)
    #[must_use]
    pub fn new_2d(nx: usize, ny: usize, width: f32, height: f32) -> Self {
        Self::new(nx, ny, 1, Vec3::new(width, height, 0.0))
    }

    #[inline]
    #[must_use]
    pub fn is_3d(&self) -> bool {
        self.nz > 1
    }

    /// Number of spatial dimensions (2 or 3)
    #[inline]
    #[must_use]
    pub fn dimensions(&self) -> usize {
        if self.is_3d() {
            3
        } else {
            2
        }
    }

    /// Axes that carry more than one cell
    #[must_use]
    pub fn active_axes(&self) -> &'static [Axis] {
        if self.is_3d() {
            &Axis::ALL
        } else {
            &Axis::PLANAR
        }
    }

    #[inline]
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    /// Cell count along `axis`
    #[inline]
    #[must_use]
    pub fn axis_len(&self, axis: Axis) -> usize {
        match axis {
            Axis::X => self.nx,
            Axis::Y => self.ny,
            Axis::Z => self.nz,
        }
    }

    /// Flat-index distance between neighbors along `axis`
    #[inline]
    #[must_use]
    pub fn stride(&self, axis: Axis) -> usize {
        match axis {
            Axis::X => 1,
            Axis::Y => self.nx,
            Axis::Z => self.nx * self.ny,
        }
    }

    #[inline]
    #[must_use]
    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        (k * self.ny + j) * self.nx + i
    }

    /// Inverse of [`Grid::index`]
    #[inline]
    #[must_use]
    pub fn coords(&self, idx: usize) -> [usize; 3] {
        let i = idx % self.nx;
        let j = (idx / self.nx) % self.ny;
        let k = idx / (self.nx * self.ny);
        [i, j, k]
    }

    /// True when the cell lies on the outer shell of an active axis
    #[inline]
    #[must_use]
    pub fn is_boundary(&self, c: [usize; 3]) -> bool {
        self.active_axes()
            .iter()
            .any(|&a| c[a.index()] == 0 || c[a.index()] == self.axis_len(a) - 1)
    }

    #[inline]
    #[must_use]
    pub fn is_interior(&self, c: [usize; 3]) -> bool {
        !self.is_boundary(c)
    }

    /// Continuous position of a cell center in grid units
    #[inline]
    #[must_use]
    pub fn cell_center(&self, c: [usize; 3]) -> Vec3 {
        Vec3::new(
            c[0] as f32 + 0.5,
            c[1] as f32 + 0.5,
            if self.is_3d() { c[2] as f32 + 0.5 } else { 0.5 },
        )
    }

    /// Physical height of row `j` (m)
    ///
    /// Rows span the full domain: row 0 sits at the ground and row `ny - 1`
    /// at the domain top, matching the atmosphere layer heights.
    #[inline]
    #[must_use]
    pub fn height_at(&self, j: usize) -> f32 {
        self.normalized_height(j) * self.domain_size.y
    }

    /// Height of row `j` as a fraction of the domain height
    #[inline]
    #[must_use]
    pub fn normalized_height(&self, j: usize) -> f32 {
        if self.ny > 1 {
            j as f32 / (self.ny - 1) as f32
        } else {
            0.0
        }
    }

    /// Center of the grid in grid units
    #[must_use]
    pub fn center(&self) -> Vec3 {
        Vec3::new(
            self.nx as f32 * 0.5,
            self.ny as f32 * 0.5,
            self.nz as f32 * 0.5,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_roundtrip() {
        let grid = Grid::new(4, 5, 6, Vec3::new(1.0, 1.0, 1.0));
        for idx in [0, 1, 17, 63, grid.cell_count() - 1] {
            let c = grid.coords(idx);
            assert_eq!(grid.index(c[0], c[1], c[2]), idx);
        }
        assert_eq!(grid.stride(Axis::Z), 20);
    }

    #[test]
    fn test_2d_ignores_z_for_boundaries() {
        let grid = Grid::new_2d(8, 8, 100.0, 100.0);
        assert_eq!(grid.dimensions(), 2);
        assert_eq!(grid.active_axes(), &[Axis::X, Axis::Y]);
        assert!(grid.is_interior([3, 3, 0]));
        assert!(grid.is_boundary([0, 3, 0]));
        assert!(grid.is_boundary([3, 7, 0]));
    }

    #[test]
    fn test_heights() {
        let grid = Grid::new_2d(10, 10, 1000.0, 2000.0);
        assert_eq!(grid.height_at(0), 0.0);
        // Nine row gaps span the full 2000 m
        assert!((grid.height_at(1) - 2000.0 / 9.0).abs() < 1e-3);
        assert!((grid.height_at(9) - 2000.0).abs() < 1e-3);
        assert!((grid.normalized_height(9) - 1.0).abs() < 1e-6);
    }
}
