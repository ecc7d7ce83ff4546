//! Ambient Atmosphere Profile
//!
//! Precomputes the hydrostatic background state the moist model is measured
//! against: temperature and pressure per height layer under a constant lapse
//! rate, plus the Exner function and saturation mixing ratio used by the
//! buoyancy and condensation stages.
//!
//! # Formulas
//!
//! ```text
//! T(h) = T₀ − Γ·h
//! p(h) = p₀ · (1 − Γ·h / T₀)^(g / (Γ·R_d))
//! Π(p) = (p / p₀)^(R_d / c_p)
//! q_sat(T, p) = (380.16 / p) · exp(17.67·(T − 273.15) / ((T − 273.15) + 243.5))
//! ```
//!
//! # References
//!
//! - ICAO Standard Atmosphere (1993)
//! - Bolton, D. (1980). "The computation of equivalent potential temperature."
//!   Monthly Weather Review, 108, 1046-1053.

use crate::core_types::Thermo;
use serde::{Deserialize, Serialize};

/// Physical constants for the moist atmosphere
pub mod constants {
    /// Gravitational acceleration (m/s²)
    pub const GRAVITY: f32 = 9.81;

    /// Gas constant of dry air (J/(kg·K))
    pub const R_DRY: f32 = 287.0;

    /// Specific heat of dry air at constant pressure (J/(kg·K))
    pub const CP_AIR: f32 = 1003.5;

    /// Latent heat of vaporization (J/kg)
    pub const LATENT_HEAT: f32 = 2_501_000.0;

    /// 0 °C in Kelvin
    pub const KELVIN_OFFSET: f32 = 273.15;

    /// Lapse rates below this magnitude are treated as isothermal (K/m)
    pub const MIN_LAPSE_RATE: f32 = 1e-7;

    /// Pressure floor for the saturation formula (Pa)
    pub const MIN_PRESSURE: f32 = 1.0;
}

use constants::{CP_AIR, GRAVITY, KELVIN_OFFSET, MIN_LAPSE_RATE, MIN_PRESSURE, R_DRY};

/// Ambient state of one height layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AtmosphereLayer {
    /// Height above ground (m)
    pub height: f32,
    /// Ambient temperature (K)
    pub temperature: f32,
    /// Ambient pressure (Pa)
    pub pressure: f32,
}

/// Height-indexed ambient temperature/pressure lookup
///
/// Derived once at reset from ground conditions and read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtmosphereProfile {
    layers: Vec<AtmosphereLayer>,
    ground_temperature: f32,
    ground_pressure: f32,
    lapse_rate: f32,
    domain_height: f32,
}

impl AtmosphereProfile {
    /// Build the profile for `layer_count` evenly spaced heights spanning
    /// `[0, domain_height]`.
    ///
    /// # Arguments
    ///
    /// * `ground_temperature` - Surface temperature (K)
    /// * `ground_pressure` - Surface pressure (Pa)
    /// * `lapse_rate` - Temperature decrease with height (K/m), 0.0065 standard
    /// * `domain_height` - Physical height of the domain (m)
    /// * `layer_count` - Number of lookup layers
    #[must_use]
    pub fn generate(
        ground_temperature: f32,
        ground_pressure: f32,
        lapse_rate: f32,
        domain_height: f32,
        layer_count: usize,
    ) -> Self {
        let mut profile = Self {
            layers: Vec::with_capacity(layer_count),
            ground_temperature,
            ground_pressure,
            lapse_rate,
            domain_height,
        };

        for i in 0..layer_count {
            let height = if layer_count > 1 {
                i as f32 / (layer_count - 1) as f32 * domain_height
            } else {
                0.0
            };
            profile.layers.push(AtmosphereLayer {
                height,
                temperature: profile.ambient_temperature(height),
                pressure: profile.ambient_pressure(height),
            });
        }

        profile
    }

    /// Ambient temperature at height `h` from the lapse-rate formula (K)
    #[must_use]
    pub fn ambient_temperature(&self, h: f32) -> f32 {
        self.ground_temperature - self.lapse_rate * h
    }

    /// Ambient pressure at height `h` from the barometric formula (Pa)
    ///
    /// Near-zero lapse rates (or a non-positive ground temperature) fall back
    /// to an isothermal column at ground pressure. Heights above the top of
    /// the polytropic atmosphere yield zero pressure.
    #[must_use]
    pub fn ambient_pressure(&self, h: f32) -> f32 {
        if self.lapse_rate.abs() < MIN_LAPSE_RATE || self.ground_temperature <= 0.0 {
            return self.ground_pressure;
        }

        let base = (1.0 - h * self.lapse_rate / self.ground_temperature).max(0.0);
        let exponent = GRAVITY / (self.lapse_rate * R_DRY);
        self.ground_pressure * base.powf(exponent)
    }

    /// Exner function `Π = (p/p₀)^(R_d/c_p)`
    ///
    /// Returns 1 when the ground pressure is degenerate.
    #[must_use]
    pub fn exner(&self, pressure: f32) -> f32 {
        if self.ground_pressure <= 0.0 {
            return 1.0;
        }
        (pressure.max(0.0) / self.ground_pressure).powf(R_DRY / CP_AIR)
    }

    /// Interpolated ambient layer at physical height `h`
    ///
    /// Heights outside the domain clamp to the first/last layer.
    #[must_use]
    pub fn sample(&self, h: f32) -> AtmosphereLayer {
        let n = self.layers.len();
        if n == 0 {
            return AtmosphereLayer {
                height: h,
                temperature: self.ground_temperature,
                pressure: self.ground_pressure,
            };
        }
        if n == 1 || self.domain_height <= 0.0 {
            return self.layers[0];
        }

        let t = (h / self.domain_height * (n - 1) as f32).clamp(0.0, (n - 1) as f32);
        let i0 = (t.floor() as usize).min(n - 2);
        let f = t - i0 as f32;
        let a = self.layers[i0];
        let b = self.layers[i0 + 1];

        AtmosphereLayer {
            height: h,
            temperature: a.temperature + (b.temperature - a.temperature) * f,
            pressure: a.pressure + (b.pressure - a.pressure) * f,
        }
    }

    /// Resting thermodynamic state at height `h`
    ///
    /// Vapor sits at `relative_humidity` of saturation, no cloud water and no
    /// potential-temperature perturbation.
    #[must_use]
    pub fn equilibrium_thermo(&self, h: f32, relative_humidity: f32) -> Thermo {
        let layer = self.sample(h);
        let q_sat = saturation_mixing_ratio(layer.temperature, layer.pressure);
        Thermo::vapor(relative_humidity.max(0.0) * q_sat)
    }

    #[must_use]
    pub fn layers(&self) -> &[AtmosphereLayer] {
        &self.layers
    }

    #[must_use]
    pub fn ground_temperature(&self) -> f32 {
        self.ground_temperature
    }

    #[must_use]
    pub fn ground_pressure(&self) -> f32 {
        self.ground_pressure
    }

    #[must_use]
    pub fn lapse_rate(&self) -> f32 {
        self.lapse_rate
    }

    #[must_use]
    pub fn domain_height(&self) -> f32 {
        self.domain_height
    }
}

/// Saturation mixing ratio of water vapor (kg/kg)
///
/// Magnus-type approximation with temperature in Kelvin and pressure in Pa.
/// Pressure is floored at [`constants::MIN_PRESSURE`] so the result stays
/// finite for degenerate columns.
#[must_use]
pub fn saturation_mixing_ratio(temperature: f32, pressure: f32) -> f32 {
    let celsius = temperature - KELVIN_OFFSET;
    let denom = celsius + 243.5;
    // Magnus is undefined at -243.5 °C; nothing is saturated that cold
    if denom <= 1e-3 {
        return 0.0;
    }
    (380.16 / pressure.max(MIN_PRESSURE)) * (17.67 * celsius / denom).exp()
}
