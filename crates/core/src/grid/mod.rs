//! Simulation lattice and field storage

pub mod dims;
pub mod fields;

pub use dims::{Axis, Grid};
pub use fields::{FieldBuffer, FieldData, FieldValue};
