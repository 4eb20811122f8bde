//! Orbit state representations shared across the workspace.

use hop_core::vector::{self, Vector3};

use crate::conversion::ConversionError;

/// Classical Keplerian elements with the eccentric anomaly as the fast variable.
///
/// Angles are radians; the semi-major axis is kilometres. Only closed orbits
/// (`0 <= e < 1`) are representable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitalElements {
    pub semi_major_axis_km: f64,
    pub eccentricity: f64,
    pub inclination_rad: f64,
    pub raan_rad: f64,
    pub argument_of_perigee_rad: f64,
    pub eccentric_anomaly_rad: f64,
}

impl OrbitalElements {
    /// Radius at perigee, `a (1 - e)`.
    pub fn perigee_radius_km(&self) -> f64 {
        self.semi_major_axis_km * (1.0 - self.eccentricity)
    }

    /// Radius at apogee, `a (1 + e)`.
    pub fn apogee_radius_km(&self) -> f64 {
        self.semi_major_axis_km * (1.0 + self.eccentricity)
    }

    /// Orbital period for the given gravitational parameter.
    pub fn period_s(&self, mu_km3_s2: f64) -> f64 {
        hop_core::constants::TWO_PI * (self.semi_major_axis_km.powi(3) / mu_km3_s2).sqrt()
    }

    /// Check that the set describes a closed orbit with finite angles.
    pub fn validate(&self) -> Result<(), ConversionError> {
        let fields = [
            ("semi_major_axis_km", self.semi_major_axis_km),
            ("eccentricity", self.eccentricity),
            ("inclination_rad", self.inclination_rad),
            ("raan_rad", self.raan_rad),
            ("argument_of_perigee_rad", self.argument_of_perigee_rad),
            ("eccentric_anomaly_rad", self.eccentric_anomaly_rad),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(ConversionError::NonFinite { field });
            }
        }
        if self.semi_major_axis_km <= 0.0 {
            return Err(ConversionError::InvalidSemiMajorAxis(self.semi_major_axis_km));
        }
        if !(0.0..1.0).contains(&self.eccentricity) {
            return Err(ConversionError::InvalidEccentricity(self.eccentricity));
        }
        Ok(())
    }
}

/// Inertial position (km) and velocity (km/s).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateVector {
    pub position_km: Vector3,
    pub velocity_km_s: Vector3,
}

impl StateVector {
    pub fn new(position_km: Vector3, velocity_km_s: Vector3) -> Self {
        Self {
            position_km,
            velocity_km_s,
        }
    }

    pub fn range_km(&self) -> f64 {
        vector::norm(&self.position_km)
    }

    pub fn speed_km_s(&self) -> f64 {
        vector::norm(&self.velocity_km_s)
    }

    /// Specific angular momentum `r x v` (km²/s).
    pub fn angular_momentum(&self) -> Vector3 {
        vector::cross(&self.position_km, &self.velocity_km_s)
    }

    /// Specific orbital energy (km²/s²).
    pub fn specific_energy(&self, mu_km3_s2: f64) -> f64 {
        let v = self.speed_km_s();
        0.5 * v * v - mu_km3_s2 / self.range_km()
    }

    pub fn is_finite(&self) -> bool {
        vector::is_finite(&self.position_km) && vector::is_finite(&self.velocity_km_s)
    }
}
