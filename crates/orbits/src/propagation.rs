//! Two-body propagation with universal variables.
//!
//! Handles elliptic, parabolic, and hyperbolic arcs with the same Lagrange
//! coefficient formulation, so the shooting corrector can probe trial
//! velocities that leave the bound regime.

use hop_core::constants::TWO_PI;
use hop_core::vector::{self, Vector3};
use thiserror::Error;

use crate::anomaly::{eccentric_to_mean, mean_to_eccentric};
use crate::conversion::ConversionError;
use crate::elements::{OrbitalElements, StateVector};

const UNIVERSAL_TOLERANCE: f64 = 1e-12;
const UNIVERSAL_MAX_ITERATIONS: usize = 100;
const STUMPFF_SERIES_LIMIT: f64 = 1e-3;
const ALPHA_EPS: f64 = 1e-12;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PropagationError {
    #[error("invalid propagation input: {0}")]
    InvalidInput(&'static str),
    #[error("universal Kepler equation did not converge after {iterations} iterations")]
    NotConverged { iterations: usize },
    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

/// Stumpff function C(z).
pub(crate) fn stumpff_c(z: f64) -> f64 {
    if z > STUMPFF_SERIES_LIMIT {
        (1.0 - z.sqrt().cos()) / z
    } else if z < -STUMPFF_SERIES_LIMIT {
        ((-z).sqrt().cosh() - 1.0) / (-z)
    } else {
        0.5 - z / 24.0 + z * z / 720.0 - z * z * z / 40_320.0
    }
}

/// Stumpff function S(z).
pub(crate) fn stumpff_s(z: f64) -> f64 {
    if z > STUMPFF_SERIES_LIMIT {
        let s = z.sqrt();
        (s - s.sin()) / (s * s * s)
    } else if z < -STUMPFF_SERIES_LIMIT {
        let s = (-z).sqrt();
        (s.sinh() - s) / (s * s * s)
    } else {
        1.0 / 6.0 - z / 120.0 + z * z / 5_040.0 - z * z * z / 362_880.0
    }
}

fn initial_universal_guess(
    sqrt_mu: f64,
    alpha: f64,
    r0: f64,
    rdotv: f64,
    dt: f64,
) -> f64 {
    if alpha > ALPHA_EPS {
        return sqrt_mu * alpha * dt;
    }
    if alpha < -ALPHA_EPS {
        let a = 1.0 / alpha;
        let sign = dt.signum();
        let denom = rdotv + sign * (-a * sqrt_mu * sqrt_mu).sqrt() * (1.0 - r0 * alpha);
        let guess = sign * (-a).sqrt() * ((-2.0 * sqrt_mu * sqrt_mu * alpha * dt) / denom).ln();
        if guess.is_finite() {
            return guess;
        }
    }
    sqrt_mu * dt / r0
}

/// Propagate a Cartesian state by `dt_s` seconds (negative values go backwards).
pub fn propagate_state(state: &StateVector, dt_s: f64, mu_km3_s2: f64) -> Result<StateVector, PropagationError> {
    if !(mu_km3_s2.is_finite() && mu_km3_s2 > 0.0) {
        return Err(PropagationError::InvalidInput("gravitational parameter must be positive"));
    }
    if !dt_s.is_finite() || !state.is_finite() {
        return Err(PropagationError::InvalidInput("non-finite state or time step"));
    }
    if dt_s == 0.0 {
        return Ok(*state);
    }

    let r0_vec = state.position_km;
    let v0_vec = state.velocity_km_s;
    let r0 = vector::norm(&r0_vec);
    if r0 <= f64::EPSILON {
        return Err(PropagationError::InvalidInput("zero position radius"));
    }
    let v0 = vector::norm(&v0_vec);
    let sqrt_mu = mu_km3_s2.sqrt();
    let rdotv = vector::dot(&r0_vec, &v0_vec);
    let vr0 = rdotv / r0;
    let alpha = 2.0 / r0 - v0 * v0 / mu_km3_s2;

    let mut dt = dt_s;
    if alpha > ALPHA_EPS {
        let period = TWO_PI / (sqrt_mu * alpha.powf(1.5));
        if dt.abs() > period {
            dt %= period;
        }
    }

    let mut chi = initial_universal_guess(sqrt_mu, alpha, r0, rdotv, dt);
    let mut converged = false;
    for _ in 0..UNIVERSAL_MAX_ITERATIONS {
        let chi2 = chi * chi;
        let z = alpha * chi2;
        let c = stumpff_c(z);
        let s = stumpff_s(z);
        let f = r0 * vr0 / sqrt_mu * chi2 * c + (1.0 - alpha * r0) * chi2 * chi * s + r0 * chi
            - sqrt_mu * dt;
        let df = r0 * vr0 / sqrt_mu * chi * (1.0 - alpha * chi2 * s) + (1.0 - alpha * r0) * chi2 * c + r0;
        let step = f / df;
        if !step.is_finite() {
            break;
        }
        chi -= step;
        if step.abs() <= UNIVERSAL_TOLERANCE * chi.abs().max(1.0) {
            converged = true;
            break;
        }
    }
    if !converged {
        return Err(PropagationError::NotConverged {
            iterations: UNIVERSAL_MAX_ITERATIONS,
        });
    }

    let chi2 = chi * chi;
    let z = alpha * chi2;
    let c = stumpff_c(z);
    let s = stumpff_s(z);

    let f = 1.0 - chi2 / r0 * c;
    let g = dt - chi2 * chi / sqrt_mu * s;
    let r_vec: Vector3 = vector::add(&vector::scale(&r0_vec, f), &vector::scale(&v0_vec, g));
    let r = vector::norm(&r_vec);
    if r <= f64::EPSILON || !r.is_finite() {
        return Err(PropagationError::InvalidInput("propagated radius collapsed"));
    }
    let fdot = sqrt_mu / (r * r0) * (alpha * chi2 * chi * s - chi);
    let gdot = 1.0 - chi2 / r * c;
    let v_vec = vector::add(&vector::scale(&r0_vec, fdot), &vector::scale(&v0_vec, gdot));

    let out = StateVector::new(r_vec, v_vec);
    if !out.is_finite() {
        return Err(PropagationError::InvalidInput("propagation produced non-finite state"));
    }
    Ok(out)
}

/// Advance an element set by `dt_s` seconds along its mean motion.
pub fn propagate_elements(
    elements: &OrbitalElements,
    dt_s: f64,
    mu_km3_s2: f64,
) -> Result<OrbitalElements, PropagationError> {
    elements.validate()?;
    if !(mu_km3_s2.is_finite() && mu_km3_s2 > 0.0) {
        return Err(PropagationError::InvalidInput("gravitational parameter must be positive"));
    }
    if !dt_s.is_finite() {
        return Err(PropagationError::InvalidInput("non-finite time step"));
    }
    let mean_motion = (mu_km3_s2 / elements.semi_major_axis_km.powi(3)).sqrt();
    let mean = eccentric_to_mean(elements.eccentric_anomaly_rad, elements.eccentricity)
        + mean_motion * (dt_s % elements.period_s(mu_km3_s2));
    let eccentric_anomaly_rad = mean_to_eccentric(mean, elements.eccentricity)?;
    Ok(OrbitalElements {
        eccentric_anomaly_rad,
        ..*elements
    })
}
