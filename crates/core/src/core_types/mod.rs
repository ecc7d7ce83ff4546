//! Core types and utilities

pub mod thermo;
pub mod vec3;

pub use thermo::Thermo;
pub use vec3::Vec3;
