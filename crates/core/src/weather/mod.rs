//! Ambient atmosphere for the moist model

pub mod atmosphere;

pub use atmosphere::{constants, saturation_mixing_ratio, AtmosphereLayer, AtmosphereProfile};
