//! Conversions between true, eccentric, and mean anomaly for elliptic orbits.

use hop_core::units::wrap_two_pi;

use crate::conversion::ConversionError;

const KEPLER_TOLERANCE: f64 = 1e-14;
const KEPLER_MAX_ITERATIONS: usize = 50;

/// True anomaly from eccentric anomaly, in `[0, 2π)`.
pub fn eccentric_to_true(eccentric_anomaly_rad: f64, eccentricity: f64) -> f64 {
    let half = 0.5 * eccentric_anomaly_rad;
    let nu = 2.0
        * f64::atan2(
            (1.0 + eccentricity).sqrt() * half.sin(),
            (1.0 - eccentricity).sqrt() * half.cos(),
        );
    wrap_two_pi(nu)
}

/// Eccentric anomaly from true anomaly, in `[0, 2π)`.
pub fn true_to_eccentric(true_anomaly_rad: f64, eccentricity: f64) -> f64 {
    let half = 0.5 * true_anomaly_rad;
    let ea = 2.0
        * f64::atan2(
            (1.0 - eccentricity).sqrt() * half.sin(),
            (1.0 + eccentricity).sqrt() * half.cos(),
        );
    wrap_two_pi(ea)
}

/// Kepler's equation, `M = E - e sin E`.
pub fn eccentric_to_mean(eccentric_anomaly_rad: f64, eccentricity: f64) -> f64 {
    eccentric_anomaly_rad - eccentricity * eccentric_anomaly_rad.sin()
}

/// Solve Kepler's equation for the eccentric anomaly with Newton iterations.
pub fn mean_to_eccentric(mean_anomaly_rad: f64, eccentricity: f64) -> Result<f64, ConversionError> {
    if !mean_anomaly_rad.is_finite() {
        return Err(ConversionError::NonFinite {
            field: "mean_anomaly_rad",
        });
    }
    if !(0.0..1.0).contains(&eccentricity) {
        return Err(ConversionError::InvalidEccentricity(eccentricity));
    }

    let mean = wrap_two_pi(mean_anomaly_rad);
    let mut ea = if eccentricity < 0.8 {
        mean
    } else {
        std::f64::consts::PI
    };
    for _ in 0..KEPLER_MAX_ITERATIONS {
        let residual = ea - eccentricity * ea.sin() - mean;
        let step = residual / (1.0 - eccentricity * ea.cos());
        ea -= step;
        if step.abs() < KEPLER_TOLERANCE {
            return Ok(wrap_two_pi(ea));
        }
    }
    Err(ConversionError::KeplerDidNotConverge {
        mean_anomaly_rad,
        eccentricity,
    })
}
