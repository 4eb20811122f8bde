//! Polish a selected Lambert branch with a differential corrector.

use hop_core::vector::{self, Vector3};
use hop_impulsive::{
    CorrectionError, CorrectionRequest, CorrectionSettings, CorrectionStatus, DifferentialCorrector,
};
use hop_orbits::StateVector;
use tracing::debug;

/// Velocities and impulses of a converged transfer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefinedTransfer {
    pub departure_velocity_km_s: Vector3,
    pub arrival_velocity_km_s: Vector3,
    pub departure_delta_v_km_s: f64,
    pub arrival_delta_v_km_s: f64,
    pub total_delta_v_km_s: f64,
}

/// Outcome of refining one pair. Only a converged run carries a solution.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferResult {
    pub departure_id: String,
    pub arrival_id: String,
    pub iteration_count: usize,
    pub status: CorrectionStatus,
    pub solution: Option<RefinedTransfer>,
}

impl TransferResult {
    pub fn converged(&self) -> bool {
        self.solution.is_some()
    }

    pub fn total_delta_v_km_s(&self) -> Option<f64> {
        self.solution.map(|s| s.total_delta_v_km_s)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RefineRequest<'a> {
    pub departure_id: &'a str,
    pub arrival_id: &'a str,
    /// Departure object at the departure epoch.
    pub departure: StateVector,
    /// Arrival object at the arrival epoch; its position is the target.
    pub arrival: StateVector,
    pub time_of_flight_s: f64,
    pub initial_velocity_km_s: Vector3,
    pub settings: CorrectionSettings,
}

pub fn refine(
    request: &RefineRequest<'_>,
    corrector: &dyn DifferentialCorrector,
) -> Result<TransferResult, CorrectionError> {
    let outcome = corrector.correct(&CorrectionRequest {
        departure_position_km: request.departure.position_km,
        initial_velocity_km_s: request.initial_velocity_km_s,
        target_position_km: request.arrival.position_km,
        time_of_flight_s: request.time_of_flight_s,
        settings: request.settings,
    })?;

    debug!(
        departure = request.departure_id,
        arrival = request.arrival_id,
        iterations = outcome.iterations,
        status = outcome.status.as_str(),
        miss_km = outcome.miss_distance_km,
        "refinement finished"
    );

    let solution = outcome.converged.then(|| {
        let departure_delta_v_km_s =
            vector::distance(&outcome.departure_velocity_km_s, &request.departure.velocity_km_s);
        let arrival_delta_v_km_s =
            vector::distance(&request.arrival.velocity_km_s, &outcome.arrival_velocity_km_s);
        RefinedTransfer {
            departure_velocity_km_s: outcome.departure_velocity_km_s,
            arrival_velocity_km_s: outcome.arrival_velocity_km_s,
            departure_delta_v_km_s,
            arrival_delta_v_km_s,
            total_delta_v_km_s: departure_delta_v_km_s + arrival_delta_v_km_s,
        }
    });
    let solution = solution.filter(|s| s.total_delta_v_km_s.is_finite());

    Ok(TransferResult {
        departure_id: request.departure_id.to_string(),
        arrival_id: request.arrival_id.to_string(),
        iteration_count: outcome.iterations,
        status: outcome.status,
        solution,
    })
}
