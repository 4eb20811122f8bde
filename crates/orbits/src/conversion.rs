//! Closed-form Keplerian ⇄ Cartesian conversion.

use hop_core::units::wrap_two_pi;
use hop_core::vector::{self, Vector3};
use thiserror::Error;

use crate::anomaly::{eccentric_to_true, true_to_eccentric};
use crate::elements::{OrbitalElements, StateVector};

const CIRCULAR_EPS: f64 = 1e-10;
const EQUATORIAL_EPS: f64 = 1e-10;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConversionError {
    #[error("{field} is not finite")]
    NonFinite { field: &'static str },
    #[error("semi-major axis must be positive (got {0} km)")]
    InvalidSemiMajorAxis(f64),
    #[error("eccentricity must lie in [0, 1) (got {0})")]
    InvalidEccentricity(f64),
    #[error("gravitational parameter must be positive (got {0} km^3/s^2)")]
    InvalidGravitationalParameter(f64),
    #[error("state has zero radius or zero angular momentum")]
    DegenerateState,
    #[error("state is not bound (specific energy {energy_km2_s2} km^2/s^2)")]
    Unbound { energy_km2_s2: f64 },
    #[error("Kepler's equation did not converge (M={mean_anomaly_rad}, e={eccentricity})")]
    KeplerDidNotConverge {
        mean_anomaly_rad: f64,
        eccentricity: f64,
    },
}

fn check_mu(mu_km3_s2: f64) -> Result<(), ConversionError> {
    if !mu_km3_s2.is_finite() {
        return Err(ConversionError::NonFinite { field: "mu_km3_s2" });
    }
    if mu_km3_s2 <= 0.0 {
        return Err(ConversionError::InvalidGravitationalParameter(mu_km3_s2));
    }
    Ok(())
}

/// Convert elements to an inertial state vector.
///
/// Position is the perifocal radius rotated by ω, i, Ω (3-1-3); the velocity
/// splits into a radial part proportional to `sin ν` and a transverse part of
/// magnitude `h / r`.
pub fn to_cartesian(elements: &OrbitalElements, mu_km3_s2: f64) -> Result<StateVector, ConversionError> {
    elements.validate()?;
    check_mu(mu_km3_s2)?;

    let a = elements.semi_major_axis_km;
    let e = elements.eccentricity;
    let ea = elements.eccentric_anomaly_rad;

    let nu = eccentric_to_true(ea, e);
    let radius = a * (1.0 - e * ea.cos());
    let semi_latus = a * (1.0 - e * e);
    let h = (mu_km3_s2 * semi_latus).sqrt();

    let (sin_raan, cos_raan) = elements.raan_rad.sin_cos();
    let (sin_i, cos_i) = elements.inclination_rad.sin_cos();
    let (sin_u, cos_u) = (elements.argument_of_perigee_rad + nu).sin_cos();

    let position = [
        radius * (cos_raan * cos_u - sin_raan * sin_u * cos_i),
        radius * (sin_raan * cos_u + cos_raan * sin_u * cos_i),
        radius * (sin_i * sin_u),
    ];

    let radial = h * e * nu.sin() / (radius * semi_latus);
    let transverse = h / radius;
    let velocity = [
        position[0] * radial - transverse * (cos_raan * sin_u + sin_raan * cos_u * cos_i),
        position[1] * radial - transverse * (sin_raan * sin_u - cos_raan * cos_u * cos_i),
        position[2] * radial + transverse * (sin_i * cos_u),
    ];

    Ok(StateVector::new(position, velocity))
}

/// Recover elements from a bound inertial state.
///
/// Circular orbits report ω = 0 and measure the anomaly from the node;
/// equatorial orbits report Ω = 0 and use the inertial x-axis as the node line.
pub fn to_elements(state: &StateVector, mu_km3_s2: f64) -> Result<OrbitalElements, ConversionError> {
    check_mu(mu_km3_s2)?;
    if !state.is_finite() {
        return Err(ConversionError::NonFinite { field: "state" });
    }

    let r = state.position_km;
    let v = state.velocity_km_s;
    let r_mag = vector::norm(&r);
    let h_vec = vector::cross(&r, &v);
    let h_mag = vector::norm(&h_vec);
    let Some(h_hat) = vector::unit(&h_vec) else {
        return Err(ConversionError::DegenerateState);
    };
    if r_mag <= f64::EPSILON {
        return Err(ConversionError::DegenerateState);
    }

    let energy = state.specific_energy(mu_km3_s2);
    if energy >= 0.0 {
        return Err(ConversionError::Unbound {
            energy_km2_s2: energy,
        });
    }
    let a = -mu_km3_s2 / (2.0 * energy);

    let v_sq = vector::dot(&v, &v);
    let e_vec = vector::scale(
        &vector::sub(
            &vector::scale(&r, v_sq - mu_km3_s2 / r_mag),
            &vector::scale(&v, vector::dot(&r, &v)),
        ),
        1.0 / mu_km3_s2,
    );
    let e = vector::norm(&e_vec);
    if e >= 1.0 {
        return Err(ConversionError::InvalidEccentricity(e));
    }

    let inclination = f64::atan2(h_vec[0].hypot(h_vec[1]), h_vec[2]);
    let node_vec = [-h_vec[1], h_vec[0], 0.0];
    let equatorial = vector::norm(&node_vec) <= EQUATORIAL_EPS * h_mag;
    let circular = e <= CIRCULAR_EPS;

    let (raan, node) = if equatorial {
        (0.0, [1.0, 0.0, 0.0])
    } else {
        let node = vector::unit(&node_vec).ok_or(ConversionError::DegenerateState)?;
        (wrap_two_pi(f64::atan2(node_vec[1], node_vec[0])), node)
    };

    let in_plane_angle = |from: &Vector3, to: &Vector3| {
        wrap_two_pi(f64::atan2(
            vector::dot(&vector::cross(from, to), &h_hat),
            vector::dot(from, to),
        ))
    };

    let (argp, true_anomaly) = if circular {
        (0.0, in_plane_angle(&node, &r))
    } else {
        (in_plane_angle(&node, &e_vec), in_plane_angle(&e_vec, &r))
    };

    Ok(OrbitalElements {
        semi_major_axis_km: a,
        eccentricity: e,
        inclination_rad: inclination,
        raan_rad: raan,
        argument_of_perigee_rad: argp,
        eccentric_anomaly_rad: true_to_eccentric(true_anomaly, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hop_core::constants::MU_EARTH_KM3_S2;

    #[test]
    fn perigee_of_equatorial_orbit_lies_on_x_axis() {
        let elements = OrbitalElements {
            semi_major_axis_km: 8_000.0,
            eccentricity: 0.1,
            inclination_rad: 0.0,
            raan_rad: 0.0,
            argument_of_perigee_rad: 0.0,
            eccentric_anomaly_rad: 0.0,
        };
        let state = to_cartesian(&elements, MU_EARTH_KM3_S2).expect("valid elements");
        assert!((state.position_km[0] - 7_200.0).abs() < 1e-9);
        assert!(state.position_km[1].abs() < 1e-9);
        assert!(state.velocity_km_s[0].abs() < 1e-12);
        assert!(state.velocity_km_s[1] > 0.0);
    }

    #[test]
    fn hyperbolic_state_is_rejected() {
        let state = StateVector::new([7_000.0, 0.0, 0.0], [0.0, 12.0, 0.0]);
        assert!(matches!(
            to_elements(&state, MU_EARTH_KM3_S2),
            Err(ConversionError::Unbound { .. })
        ));
    }
}
