//! Per-cell moist thermodynamic state.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// Advected moisture and heat carried by every grid cell.
///
/// - `vapor`: water-vapor mixing ratio `q_v` (kg/kg)
/// - `cloud`: cloud-water mixing ratio `q_c` (kg/kg)
/// - `theta`: potential-temperature perturbation `θ′` (K), any sign
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Thermo {
    pub vapor: f32,
    pub cloud: f32,
    pub theta: f32,
}

impl Thermo {
    /// Zero moisture, zero perturbation
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(vapor: f32, cloud: f32, theta: f32) -> Self {
        Self {
            vapor,
            cloud,
            theta,
        }
    }

    /// Moisture-only state (no cloud, no heating)
    #[must_use]
    pub const fn vapor(vapor: f32) -> Self {
        Self::new(vapor, 0.0, 0.0)
    }

    /// Total water content `q_v + q_c`
    #[must_use]
    pub fn total_water(&self) -> f32 {
        self.vapor + self.cloud
    }

    /// Clamp the water species at zero from below; `θ′` is left untouched.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            vapor: self.vapor.max(0.0),
            cloud: self.cloud.max(0.0),
            theta: self.theta,
        }
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.vapor.is_finite() && self.cloud.is_finite() && self.theta.is_finite()
    }
}

impl Add for Thermo {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.vapor + rhs.vapor,
            self.cloud + rhs.cloud,
            self.theta + rhs.theta,
        )
    }
}

impl Sub for Thermo {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(
            self.vapor - rhs.vapor,
            self.cloud - rhs.cloud,
            self.theta - rhs.theta,
        )
    }
}

impl Mul<f32> for Thermo {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.vapor * rhs, self.cloud * rhs, self.theta * rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_keeps_theta_sign() {
        let t = Thermo::new(-0.1, -0.2, -3.0).clamped();
        assert_eq!(t, Thermo::new(0.0, 0.0, -3.0));
    }

    #[test]
    fn test_arithmetic() {
        let a = Thermo::new(1.0, 2.0, 3.0);
        let b = Thermo::new(0.5, 0.5, 0.5);
        assert_eq!(a + b, Thermo::new(1.5, 2.5, 3.5));
        assert_eq!(a - b, Thermo::new(0.5, 1.5, 2.5));
        assert_eq!(a * 2.0, Thermo::new(2.0, 4.0, 6.0));
        assert_eq!(a.total_water(), 3.0);
    }
}
