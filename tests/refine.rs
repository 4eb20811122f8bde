use orbit_hop::core::constants::{EARTH_RADIUS_KM, MU_EARTH_KM3_S2};
use orbit_hop::core::vector;
use orbit_hop::impulsive::{CorrectionError, CorrectionRequest};
use orbit_hop::orbits::{StateVector, circular_speed, propagate_state};
use orbit_hop::transfer::{
    CorrectionSettings, CorrectionStatus, DifferentialCorrector, RefineRequest, ShootingCorrector,
    refine,
};

const ROUGH_GUESS: [f64; 3] = [0.0, 7.6, 0.0];

fn correction(max_iterations: usize) -> CorrectionSettings {
    CorrectionSettings {
        mu_km3_s2: MU_EARTH_KM3_S2,
        body_radius_km: EARTH_RADIUS_KM,
        abs_tol_km: 1e-6,
        rel_tol: 1e-9,
        max_iterations,
    }
}

/// Quarter-ish hop from 7000 km on +x to 7200 km on +y in 1000 s.
fn quarter_hop(max_iterations: usize) -> CorrectionRequest {
    CorrectionRequest {
        departure_position_km: [7_000.0, 0.0, 0.0],
        initial_velocity_km_s: ROUGH_GUESS,
        target_position_km: [0.0, 7_200.0, 0.0],
        time_of_flight_s: 1_000.0,
        settings: correction(max_iterations),
    }
}

fn refine_request(max_iterations: usize) -> RefineRequest<'static> {
    let arrival_speed = circular_speed(MU_EARTH_KM3_S2, 7_200.0);
    RefineRequest {
        departure_id: "DEP",
        arrival_id: "ARR",
        departure: StateVector::new([7_000.0, 0.0, 0.0], [0.0, 7.5, 0.0]),
        arrival: StateVector::new([0.0, 7_200.0, 0.0], [-arrival_speed, 0.0, 0.0]),
        time_of_flight_s: 1_000.0,
        initial_velocity_km_s: ROUGH_GUESS,
        settings: correction(max_iterations),
    }
}

#[test]
fn shooting_converges_from_a_rough_guess() {
    let request = quarter_hop(50);
    let outcome = ShootingCorrector.correct(&request).expect("correction runs");
    assert!(outcome.converged);
    assert_eq!(outcome.status, CorrectionStatus::Converged);
    assert!(outcome.iterations > 1 && outcome.iterations <= 50, "{} iterations", outcome.iterations);

    let tolerance = request.settings.tolerance_km(&request.target_position_km);
    assert!(outcome.miss_distance_km <= tolerance, "miss {} km", outcome.miss_distance_km);

    let start = StateVector::new(request.departure_position_km, outcome.departure_velocity_km_s);
    let flown = propagate_state(&start, request.time_of_flight_s, MU_EARTH_KM3_S2).expect("flight");
    assert!(vector::distance(&flown.position_km, &request.target_position_km) <= tolerance);
    assert!(vector::distance(&flown.velocity_km_s, &outcome.arrival_velocity_km_s) < 1e-9);
}

#[test]
fn iteration_cap_stops_short_without_an_error() {
    let request = quarter_hop(1);
    let outcome = ShootingCorrector.correct(&request).expect("running out of iterations is not an error");
    assert!(!outcome.converged);
    assert_eq!(outcome.iterations, 1);
    assert_eq!(outcome.status, CorrectionStatus::MaxIterations);

    let tolerance = request.settings.tolerance_km(&request.target_position_km);
    assert!(outcome.miss_distance_km.is_finite());
    assert!(outcome.miss_distance_km > tolerance, "miss {} km", outcome.miss_distance_km);
}

#[test]
fn departure_inside_the_body_is_rejected() {
    let mut request = quarter_hop(50);
    request.departure_position_km = [6_000.0, 0.0, 0.0];
    assert_eq!(
        ShootingCorrector.correct(&request),
        Err(CorrectionError::InsideBody {
            radius_km: 6_000.0,
            body_radius_km: EARTH_RADIUS_KM,
        })
    );

    request.departure_position_km = [EARTH_RADIUS_KM, 0.0, 0.0];
    assert!(matches!(
        ShootingCorrector.correct(&request),
        Err(CorrectionError::InsideBody { .. })
    ));
}

#[test]
fn invalid_settings_are_rejected_before_shooting() {
    let mut no_iterations = quarter_hop(0);
    assert!(matches!(
        ShootingCorrector.correct(&no_iterations),
        Err(CorrectionError::InvalidSettings(_))
    ));
    no_iterations.settings.max_iterations = 1;
    assert!(ShootingCorrector.correct(&no_iterations).is_ok());

    let mut no_tolerance = quarter_hop(50);
    no_tolerance.settings.abs_tol_km = 0.0;
    no_tolerance.settings.rel_tol = 0.0;
    assert!(matches!(
        ShootingCorrector.correct(&no_tolerance),
        Err(CorrectionError::InvalidSettings(_))
    ));

    let mut no_gravity = quarter_hop(50);
    no_gravity.settings.mu_km3_s2 = 0.0;
    assert!(matches!(
        ShootingCorrector.correct(&no_gravity),
        Err(CorrectionError::InvalidSettings(_))
    ));

    // Settings are checked ahead of the geometry.
    let mut both = quarter_hop(0);
    both.departure_position_km = [6_000.0, 0.0, 0.0];
    assert!(matches!(
        ShootingCorrector.correct(&both),
        Err(CorrectionError::InvalidSettings(_))
    ));
}

#[test]
fn degenerate_requests_are_rejected() {
    let mut backwards = quarter_hop(50);
    backwards.time_of_flight_s = -1_000.0;
    assert!(matches!(
        ShootingCorrector.correct(&backwards),
        Err(CorrectionError::InvalidRequest(_))
    ));

    let mut nan_guess = quarter_hop(50);
    nan_guess.initial_velocity_km_s = [f64::NAN, 7.6, 0.0];
    assert!(matches!(
        ShootingCorrector.correct(&nan_guess),
        Err(CorrectionError::InvalidRequest(_))
    ));
}

#[test]
fn refine_without_convergence_has_no_solution() {
    let result = refine(&refine_request(1), &ShootingCorrector).expect("refinement runs");
    assert_eq!(result.departure_id, "DEP");
    assert_eq!(result.arrival_id, "ARR");
    assert_eq!(result.status, CorrectionStatus::MaxIterations);
    assert_eq!(result.iteration_count, 1);
    assert_eq!(result.solution, None);
    assert!(!result.converged());
    assert_eq!(result.total_delta_v_km_s(), None);
}

#[test]
fn refine_reports_impulses_of_a_converged_run() {
    let request = refine_request(50);
    let result = refine(&request, &ShootingCorrector).expect("refinement runs");
    assert_eq!(result.status, CorrectionStatus::Converged);
    let solution = result.solution.expect("converged solution");

    let departure_dv = vector::distance(&solution.departure_velocity_km_s, &request.departure.velocity_km_s);
    let arrival_dv = vector::distance(&request.arrival.velocity_km_s, &solution.arrival_velocity_km_s);
    assert_eq!(solution.departure_delta_v_km_s, departure_dv);
    assert_eq!(solution.arrival_delta_v_km_s, arrival_dv);
    assert_eq!(solution.total_delta_v_km_s, departure_dv + arrival_dv);
    assert_eq!(result.total_delta_v_km_s(), Some(departure_dv + arrival_dv));
}

#[test]
fn refine_passes_corrector_errors_through() {
    let mut request = refine_request(50);
    request.departure = StateVector::new([6_000.0, 0.0, 0.0], [0.0, 7.5, 0.0]);
    assert!(matches!(
        refine(&request, &ShootingCorrector),
        Err(CorrectionError::InsideBody { .. })
    ));
}
