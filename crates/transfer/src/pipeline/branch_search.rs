//! Enumerate Lambert branches for one departure/arrival pair and price them.

use hop_core::vector::{self, Vector3};
use hop_impulsive::{LambertBranch, LambertProblem, LambertSolver, LambertSolverError};
use hop_orbits::StateVector;
use tracing::debug;

/// A priced Lambert branch between two catalog objects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferCandidate {
    pub departure_velocity_km_s: Vector3,
    pub arrival_velocity_km_s: Vector3,
    pub revolutions: u32,
    pub branch: LambertBranch,
    /// Sum of both impulse magnitudes.
    pub cost_km_s: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchSearchRequest {
    /// Departure object at the departure epoch.
    pub departure: StateVector,
    /// Arrival object at the arrival epoch.
    pub arrival: StateVector,
    pub time_of_flight_s: f64,
    pub mu_km3_s2: f64,
    pub min_revolutions: u32,
    pub max_revolutions: u32,
}

/// Two-impulse cost of flying `v1 -> v2` between the two body states.
pub fn impulse_cost(departure: &StateVector, arrival: &StateVector, v1: &Vector3, v2: &Vector3) -> f64 {
    vector::distance(v1, &departure.velocity_km_s) + vector::distance(v2, &arrival.velocity_km_s)
}

/// Ask the solver for every branch in the revolution window and price each one.
///
/// Arcs travel prograde with respect to the departure object's angular momentum.
/// An empty result is a valid answer for infeasible geometry.
pub fn search(
    request: &BranchSearchRequest,
    solver: &dyn LambertSolver,
) -> Result<Vec<TransferCandidate>, LambertSolverError> {
    let problem = LambertProblem {
        r1_km: request.departure.position_km,
        r2_km: request.arrival.position_km,
        time_of_flight_s: request.time_of_flight_s,
        mu_km3_s2: request.mu_km3_s2,
        min_revolutions: request.min_revolutions,
        max_revolutions: request.max_revolutions,
        orbit_normal: request.departure.angular_momentum(),
    };
    let solutions = solver.solve(&problem)?;

    let candidates: Vec<TransferCandidate> = solutions
        .into_iter()
        .filter(|s| (request.min_revolutions..=request.max_revolutions).contains(&s.revolutions))
        .filter_map(|s| {
            let cost = impulse_cost(&request.departure, &request.arrival, &s.v1_km_s, &s.v2_km_s);
            let finite = cost.is_finite() && vector::is_finite(&s.v1_km_s) && vector::is_finite(&s.v2_km_s);
            finite.then_some(TransferCandidate {
                departure_velocity_km_s: s.v1_km_s,
                arrival_velocity_km_s: s.v2_km_s,
                revolutions: s.revolutions,
                branch: s.branch,
                cost_km_s: cost,
            })
        })
        .collect();

    debug!(candidates = candidates.len(), "branch search complete");
    Ok(candidates)
}
