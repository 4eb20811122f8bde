use std::f64::consts::PI;

use approx::assert_relative_eq;
use orbit_hop::core::constants::{EARTH_RADIUS_KM, MU_EARTH_KM3_S2, TWO_PI};
use orbit_hop::core::units::deg_to_rad;
use orbit_hop::core::vector;
use orbit_hop::orbits::{
    ConversionError, OrbitalElements, StateVector, circular_speed, propagate_state, to_cartesian,
    to_elements,
};

fn angle_gap(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(TWO_PI);
    d.min(TWO_PI - d)
}

fn elements(a: f64, e: f64, i_deg: f64, raan_deg: f64, aop_deg: f64, ea_deg: f64) -> OrbitalElements {
    OrbitalElements {
        semi_major_axis_km: a,
        eccentricity: e,
        inclination_rad: deg_to_rad(i_deg),
        raan_rad: deg_to_rad(raan_deg),
        argument_of_perigee_rad: deg_to_rad(aop_deg),
        eccentric_anomaly_rad: deg_to_rad(ea_deg),
    }
}

#[test]
fn elements_survive_a_cartesian_round_trip() {
    let mut checked = 0;
    for &e in &[0.05, 0.2, 0.45, 0.7, 0.9] {
        for &(i, raan, aop, ea) in &[
            (28.5, 40.0, 75.0, 10.0),
            (51.6, 300.0, 200.0, 135.0),
            (97.8, 120.0, 330.0, 250.0),
            (150.0, 10.0, 15.0, 355.0),
        ] {
            let a = 2.0 * EARTH_RADIUS_KM + 500.0;
            let original = elements(a, e, i, raan, aop, ea);
            let state = to_cartesian(&original, MU_EARTH_KM3_S2).expect("closed orbit converts");
            let back = to_elements(&state, MU_EARTH_KM3_S2).expect("state converts back");

            assert_relative_eq!(back.semi_major_axis_km, a, max_relative = 1e-6);
            assert_relative_eq!(back.eccentricity, e, max_relative = 1e-6);
            for (label, got, want) in [
                ("inclination", back.inclination_rad, original.inclination_rad),
                ("raan", back.raan_rad, original.raan_rad),
                ("aop", back.argument_of_perigee_rad, original.argument_of_perigee_rad),
                ("ea", back.eccentric_anomaly_rad, original.eccentric_anomaly_rad),
            ] {
                assert!(
                    angle_gap(got, want) < 1e-6,
                    "{label} drifted for e={e}, i={i}: got {got}, want {want}"
                );
            }
            checked += 1;
        }
    }
    assert_eq!(checked, 20);
}

#[test]
fn circular_orbit_moves_at_circular_speed() {
    let a = 7_000.0;
    let state = to_cartesian(&elements(a, 0.0, 45.0, 30.0, 0.0, 60.0), MU_EARTH_KM3_S2)
        .expect("circular orbit converts");
    assert_relative_eq!(state.range_km(), a, max_relative = 1e-12);
    assert_relative_eq!(state.speed_km_s(), (MU_EARTH_KM3_S2 / a).sqrt(), max_relative = 1e-12);
    assert_relative_eq!(state.speed_km_s(), circular_speed(MU_EARTH_KM3_S2, a), max_relative = 1e-12);
    assert!(
        vector::dot(&state.position_km, &state.velocity_km_s).abs() < 1e-6,
        "velocity should be perpendicular to the radius on a circle"
    );
}

#[test]
fn perigee_and_apogee_match_the_state_extremes() {
    let set = elements(8_000.0, 0.3, 10.0, 0.0, 0.0, 0.0);
    let perigee = to_cartesian(&set, MU_EARTH_KM3_S2).expect("perigee state");
    assert_relative_eq!(perigee.range_km(), set.perigee_radius_km(), max_relative = 1e-12);

    let apogee = to_cartesian(
        &OrbitalElements {
            eccentric_anomaly_rad: PI,
            ..set
        },
        MU_EARTH_KM3_S2,
    )
    .expect("apogee state");
    assert_relative_eq!(apogee.range_km(), set.apogee_radius_km(), max_relative = 1e-12);
}

#[test]
fn open_or_degenerate_orbits_are_rejected() {
    let hyperbolic = elements(7_000.0, 1.2, 10.0, 0.0, 0.0, 0.0);
    assert!(matches!(
        to_cartesian(&hyperbolic, MU_EARTH_KM3_S2),
        Err(ConversionError::InvalidEccentricity(_))
    ));

    let negative_axis = elements(-7_000.0, 0.1, 10.0, 0.0, 0.0, 0.0);
    assert!(matches!(
        to_cartesian(&negative_axis, MU_EARTH_KM3_S2),
        Err(ConversionError::InvalidSemiMajorAxis(_))
    ));

    let escaping = StateVector::new([7_000.0, 0.0, 0.0], [0.0, 12.0, 0.0]);
    assert!(matches!(
        to_elements(&escaping, MU_EARTH_KM3_S2),
        Err(ConversionError::Unbound { .. })
    ));

    let radial = StateVector::new([7_000.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
    assert!(matches!(
        to_elements(&radial, MU_EARTH_KM3_S2),
        Err(ConversionError::DegenerateState)
    ));
}

#[test]
fn full_period_propagation_returns_to_start() {
    let set = elements(7_500.0, 0.15, 63.4, 80.0, 270.0, 45.0);
    let start = to_cartesian(&set, MU_EARTH_KM3_S2).expect("start state");
    let end = propagate_state(&start, set.period_s(MU_EARTH_KM3_S2), MU_EARTH_KM3_S2)
        .expect("propagation succeeds");
    assert!(
        vector::distance(&start.position_km, &end.position_km) < 1e-4,
        "position after one period drifted by {} km",
        vector::distance(&start.position_km, &end.position_km)
    );
}
