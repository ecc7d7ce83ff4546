//! Field data structures and ping-pong buffers
//!
//! Every stage that reads and writes the same quantity does so through a
//! [`FieldBuffer`]: it reads the front buffer, writes the back buffer and
//! swaps once the whole grid is written. No stage ever sees its own output.

use super::dims::{Axis, Grid};
use crate::core_types::{Thermo, Vec3};
use std::ops::{Add, Mul, Sub};

/// Value stored in a grid cell
///
/// Everything the solver needs to interpolate, inject and reflect a cell
/// value. Implemented for scalars (`f32`), velocities (`Vec3`) and the
/// moist thermodynamic state ([`Thermo`]).
pub trait FieldValue:
    Copy + Send + Sync + Add<Output = Self> + Sub<Output = Self> + Mul<f32, Output = Self>
{
    /// Additive identity
    fn zero() -> Self;

    /// Negate the component normal to a wall perpendicular to `axis`.
    ///
    /// Quantities without a direction return themselves.
    fn flip_normal(self, axis: Axis) -> Self;
}

impl FieldValue for f32 {
    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn flip_normal(self, _axis: Axis) -> Self {
        self
    }
}

impl FieldValue for Vec3 {
    #[inline]
    fn zero() -> Self {
        Vec3::zeros()
    }

    #[inline]
    fn flip_normal(mut self, axis: Axis) -> Self {
        self[axis.index()] = -self[axis.index()];
        self
    }
}

impl FieldValue for Thermo {
    #[inline]
    fn zero() -> Self {
        Thermo::ZERO
    }

    #[inline]
    fn flip_normal(self, _axis: Axis) -> Self {
        self
    }
}

/// Field data container
///
/// Stores one value per cell as a flat `Vec<T>` in x-fastest order.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldData<T> {
    /// Field values, indexed by [`Grid::index`]
    pub data: Vec<T>,
    grid: Grid,
}

impl<T: FieldValue> FieldData<T> {
    /// Create a new field initialized to zero
    #[must_use]
    pub fn new(grid: Grid) -> Self {
        Self::with_value(grid, T::zero())
    }

    /// Create a new field with every cell set to `value`
    #[must_use]
    pub fn with_value(grid: Grid, value: T) -> Self {
        Self {
            data: vec![value; grid.cell_count()],
            grid,
        }
    }

    /// Create a field from a per-cell function of `[i, j, k]`
    pub fn from_fn(grid: Grid, mut f: impl FnMut([usize; 3]) -> T) -> Self {
        let data = (0..grid.cell_count()).map(|idx| f(grid.coords(idx))).collect();
        Self { data, grid }
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Get value at grid position
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    #[must_use]
    pub fn get(&self, i: usize, j: usize, k: usize) -> T {
        assert!(
            i < self.grid.nx && j < self.grid.ny && k < self.grid.nz,
            "Coordinates out of bounds"
        );
        self.data[self.grid.index(i, j, k)]
    }

    /// Set value at grid position
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    pub fn set(&mut self, i: usize, j: usize, k: usize, value: T) {
        assert!(
            i < self.grid.nx && j < self.grid.ny && k < self.grid.nz,
            "Coordinates out of bounds"
        );
        let idx = self.grid.index(i, j, k);
        self.data[idx] = value;
    }

    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }
}

/// Read/write buffer pair for one field
///
/// `read()` is the committed state; `write()` is scratch for the stage in
/// flight. [`FieldBuffer::swap`] commits the written buffer.
#[derive(Debug, Clone)]
pub struct FieldBuffer<T> {
    front: FieldData<T>,
    back: FieldData<T>,
}

impl<T: FieldValue> FieldBuffer<T> {
    /// Create a zero-initialized buffer pair
    #[must_use]
    pub fn new(grid: Grid) -> Self {
        Self::from_field(FieldData::new(grid))
    }

    /// Create a buffer pair whose committed state is `field`
    #[must_use]
    pub fn from_field(field: FieldData<T>) -> Self {
        Self {
            back: field.clone(),
            front: field,
        }
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        self.front.grid()
    }

    /// Committed field
    #[must_use]
    pub fn read(&self) -> &[T] {
        self.front.as_slice()
    }

    /// Committed field as [`FieldData`]
    #[must_use]
    pub fn field(&self) -> &FieldData<T> {
        &self.front
    }

    /// Destination buffer for the stage in flight
    pub fn write(&mut self) -> &mut [T] {
        self.back.as_mut_slice()
    }

    /// Borrow the committed field and the destination buffer together
    pub fn split(&mut self) -> (&[T], &mut [T]) {
        (self.front.as_slice(), self.back.as_mut_slice())
    }

    /// Mutable access to the committed field.
    ///
    /// Only for purely local per-cell edits (injection, clamping) that never
    /// read a neighbor.
    pub fn read_mut(&mut self) -> &mut [T] {
        self.front.as_mut_slice()
    }

    /// Commit the destination buffer
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.front, &mut self.back);
    }

    /// Reset both buffers to `value`
    pub fn fill(&mut self, value: T) {
        self.front.fill(value);
        self.back.fill(value);
    }
}
