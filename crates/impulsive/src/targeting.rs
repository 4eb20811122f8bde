//! Differential correction of two-impulse transfers.
//!
//! The shooting corrector adjusts the departure velocity until a two-body
//! propagation over the flight time lands on the target position.

use hop_core::vector::{self, Vector3};
use hop_orbits::{PropagationError, StateVector, propagate_state};
use nalgebra::{Matrix3, Vector3 as NVector3};
use thiserror::Error;
use tracing::trace;

const MAX_BACKTRACKS: usize = 8;
const FD_RELATIVE_STEP: f64 = 1e-6;
const FD_MIN_STEP_KM_S: f64 = 1e-9;

/// Numerical settings shared by every correction in a scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrectionSettings {
    pub mu_km3_s2: f64,
    pub body_radius_km: f64,
    pub abs_tol_km: f64,
    pub rel_tol: f64,
    pub max_iterations: usize,
}

impl CorrectionSettings {
    pub fn validate(&self) -> Result<(), CorrectionError> {
        if !(self.mu_km3_s2.is_finite() && self.mu_km3_s2 > 0.0) {
            return Err(CorrectionError::InvalidSettings("gravitational parameter must be positive"));
        }
        if !(self.body_radius_km.is_finite() && self.body_radius_km >= 0.0) {
            return Err(CorrectionError::InvalidSettings("body radius must be finite and non-negative"));
        }
        if !(self.abs_tol_km.is_finite() && self.abs_tol_km >= 0.0) {
            return Err(CorrectionError::InvalidSettings("absolute tolerance must be finite and non-negative"));
        }
        if !(self.rel_tol.is_finite() && self.rel_tol >= 0.0) {
            return Err(CorrectionError::InvalidSettings("relative tolerance must be finite and non-negative"));
        }
        if self.abs_tol_km == 0.0 && self.rel_tol == 0.0 {
            return Err(CorrectionError::InvalidSettings("at least one tolerance must be positive"));
        }
        if self.max_iterations == 0 {
            return Err(CorrectionError::InvalidSettings("max iterations must be at least one"));
        }
        Ok(())
    }

    /// Miss distance accepted for a target at `target_km`.
    pub fn tolerance_km(&self, target_km: &Vector3) -> f64 {
        self.abs_tol_km + self.rel_tol * vector::norm(target_km)
    }
}

/// Boundary conditions for one correction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrectionRequest {
    pub departure_position_km: Vector3,
    pub initial_velocity_km_s: Vector3,
    pub target_position_km: Vector3,
    pub time_of_flight_s: f64,
    pub settings: CorrectionSettings,
}

/// How a correction run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionStatus {
    Converged,
    MaxIterations,
    /// No step along the Newton direction reduced the miss distance.
    Diverged,
    SingularJacobian,
}

impl CorrectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CorrectionStatus::Converged => "converged",
            CorrectionStatus::MaxIterations => "max_iterations",
            CorrectionStatus::Diverged => "diverged",
            CorrectionStatus::SingularJacobian => "singular_jacobian",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrectionOutcome {
    pub converged: bool,
    pub iterations: usize,
    pub departure_velocity_km_s: Vector3,
    pub arrival_velocity_km_s: Vector3,
    pub miss_distance_km: f64,
    pub status: CorrectionStatus,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CorrectionError {
    #[error("invalid correction settings: {0}")]
    InvalidSettings(&'static str),
    #[error("invalid correction request: {0}")]
    InvalidRequest(&'static str),
    #[error("departure radius {radius_km:.3} km is inside the central body ({body_radius_km:.3} km)")]
    InsideBody { radius_km: f64, body_radius_km: f64 },
    #[error(transparent)]
    Propagation(#[from] PropagationError),
}

pub trait DifferentialCorrector {
    fn correct(&self, request: &CorrectionRequest) -> Result<CorrectionOutcome, CorrectionError>;
}

/// Newton shooting on the departure velocity with a central-difference
/// sensitivity matrix and step halving.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShootingCorrector;

struct Shot {
    arrival: StateVector,
    miss: Vector3,
    miss_km: f64,
}

fn shoot(request: &CorrectionRequest, velocity: &Vector3) -> Result<Shot, PropagationError> {
    let start = StateVector::new(request.departure_position_km, *velocity);
    let arrival = propagate_state(&start, request.time_of_flight_s, request.settings.mu_km3_s2)?;
    let miss = vector::sub(&arrival.position_km, &request.target_position_km);
    Ok(Shot {
        arrival,
        miss,
        miss_km: vector::norm(&miss),
    })
}

fn sensitivity(request: &CorrectionRequest, velocity: &Vector3) -> Result<Matrix3<f64>, PropagationError> {
    let h = (FD_RELATIVE_STEP * vector::norm(velocity)).max(FD_MIN_STEP_KM_S);
    let mut jacobian = Matrix3::zeros();
    for k in 0..3 {
        let mut plus = *velocity;
        let mut minus = *velocity;
        plus[k] += h;
        minus[k] -= h;
        let r_plus = shoot(request, &plus)?.arrival.position_km;
        let r_minus = shoot(request, &minus)?.arrival.position_km;
        for row in 0..3 {
            jacobian[(row, k)] = (r_plus[row] - r_minus[row]) / (2.0 * h);
        }
    }
    Ok(jacobian)
}

impl DifferentialCorrector for ShootingCorrector {
    fn correct(&self, request: &CorrectionRequest) -> Result<CorrectionOutcome, CorrectionError> {
        let settings = &request.settings;
        settings.validate()?;
        if !(vector::is_finite(&request.departure_position_km)
            && vector::is_finite(&request.initial_velocity_km_s)
            && vector::is_finite(&request.target_position_km))
        {
            return Err(CorrectionError::InvalidRequest("non-finite boundary conditions"));
        }
        if !(request.time_of_flight_s.is_finite() && request.time_of_flight_s > 0.0) {
            return Err(CorrectionError::InvalidRequest("time of flight must be positive"));
        }
        let radius_km = vector::norm(&request.departure_position_km);
        if radius_km <= settings.body_radius_km {
            return Err(CorrectionError::InsideBody {
                radius_km,
                body_radius_km: settings.body_radius_km,
            });
        }

        let tolerance = settings.tolerance_km(&request.target_position_km);
        let mut velocity = request.initial_velocity_km_s;
        let mut shot = shoot(request, &velocity)?;
        let mut iterations = 0;

        let status = loop {
            if shot.miss_km <= tolerance {
                break CorrectionStatus::Converged;
            }
            if iterations >= settings.max_iterations {
                break CorrectionStatus::MaxIterations;
            }
            iterations += 1;

            let jacobian = match sensitivity(request, &velocity) {
                Ok(jacobian) => jacobian,
                Err(_) => break CorrectionStatus::SingularJacobian,
            };
            let rhs = -NVector3::new(shot.miss[0], shot.miss[1], shot.miss[2]);
            let Some(step) = jacobian.lu().solve(&rhs) else {
                break CorrectionStatus::SingularJacobian;
            };
            if !step.iter().all(|c| c.is_finite()) {
                break CorrectionStatus::SingularJacobian;
            }

            let mut scale = 1.0;
            let mut accepted = None;
            for _ in 0..=MAX_BACKTRACKS {
                let trial = [
                    velocity[0] + scale * step[0],
                    velocity[1] + scale * step[1],
                    velocity[2] + scale * step[2],
                ];
                if let Ok(candidate) = shoot(request, &trial) {
                    if candidate.miss_km.is_finite() && candidate.miss_km < shot.miss_km {
                        accepted = Some((trial, candidate));
                        break;
                    }
                }
                scale *= 0.5;
            }
            let Some((trial, candidate)) = accepted else {
                break CorrectionStatus::Diverged;
            };
            velocity = trial;
            shot = candidate;
            trace!(iteration = iterations, miss_km = shot.miss_km, step_scale = scale, "shooting step");
        };

        Ok(CorrectionOutcome {
            converged: status == CorrectionStatus::Converged,
            iterations,
            departure_velocity_km_s: velocity,
            arrival_velocity_km_s: shot.arrival.velocity_km_s,
            miss_distance_km: shot.miss_km,
            status,
        })
    }
}
