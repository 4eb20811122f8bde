use orbit_hop::core::constants::{EARTH_RADIUS_KM, MU_EARTH_KM3_S2};
use orbit_hop::orbits::{OrbitalElements, to_cartesian};
use orbit_hop::sampling::{
    self, CandidateSampler, DEFAULT_COUNT, DEFAULT_MAX_PERIGEE_ALTITUDE_KM, DEFAULT_SEED,
    ElementRanges, SampleRange, SamplingError, filter_physical,
};

fn defaults() -> ElementRanges {
    ElementRanges::low_earth_defaults(EARTH_RADIUS_KM)
}

#[test]
fn same_seed_reproduces_the_draw() {
    let first = sampling::sample(&defaults(), DEFAULT_COUNT, DEFAULT_SEED).expect("first draw");
    let second = sampling::sample(&defaults(), DEFAULT_COUNT, DEFAULT_SEED).expect("second draw");
    assert_eq!(first.len(), DEFAULT_COUNT);
    assert_eq!(first, second, "seeded draws must be bit-identical");
}

#[test]
fn different_seed_changes_the_draw() {
    let a = sampling::sample(&defaults(), 10, DEFAULT_SEED).expect("seed 100");
    let b = sampling::sample(&defaults(), 10, DEFAULT_SEED + 1).expect("seed 101");
    assert_ne!(a, b);
}

#[test]
fn sampler_continues_its_stream_between_calls() {
    let mut sampler = CandidateSampler::from_seed(7);
    let mut split = sampler.sample(&defaults(), 3).expect("first batch");
    split.extend(sampler.sample(&defaults(), 4).expect("second batch"));

    let whole = sampling::sample(&defaults(), 7, 7).expect("single batch");
    assert_eq!(split, whole);
}

#[test]
fn draws_stay_inside_their_ranges() {
    let ranges = defaults();
    let sets = sampling::sample(&ranges, 500, 42).expect("draw");
    for set in &sets {
        for (label, value, range) in [
            ("a", set.semi_major_axis_km, ranges.semi_major_axis_km),
            ("e", set.eccentricity, ranges.eccentricity),
            ("i", set.inclination_rad, ranges.inclination_rad),
            ("raan", set.raan_rad, ranges.raan_rad),
            ("aop", set.argument_of_perigee_rad, ranges.argument_of_perigee_rad),
            ("ea", set.eccentric_anomaly_rad, ranges.eccentric_anomaly_rad),
        ] {
            assert!(
                value >= range.min && value < range.max,
                "{label}={value} outside [{}, {})",
                range.min,
                range.max
            );
        }
    }
}

#[test]
fn filter_keeps_only_perigees_between_surface_and_ceiling() {
    let sets = sampling::sample(&defaults(), DEFAULT_COUNT, DEFAULT_SEED).expect("draw");
    let filtered = filter_physical(&sets, EARTH_RADIUS_KM, DEFAULT_MAX_PERIGEE_ALTITUDE_KM);

    assert_eq!(filtered.total(), sets.len());
    assert!(filtered.below_surface > 0, "high eccentricities should dip below the surface");
    assert!(!filtered.retained.is_empty(), "some element sets should survive");

    let ceiling = EARTH_RADIUS_KM + DEFAULT_MAX_PERIGEE_ALTITUDE_KM;
    for set in &filtered.retained {
        let perigee = set.perigee_radius_km();
        assert!(perigee > EARTH_RADIUS_KM && perigee < ceiling, "perigee {perigee} km kept");
        let state = to_cartesian(set, MU_EARTH_KM3_S2).expect("retained sets convert");
        assert!(state.is_finite());
    }
}

#[test]
fn filter_preserves_draw_order() {
    let sets = sampling::sample(&defaults(), 200, 3).expect("draw");
    let filtered = filter_physical(&sets, EARTH_RADIUS_KM, DEFAULT_MAX_PERIGEE_ALTITUDE_KM);
    let expected: Vec<_> = sets
        .iter()
        .copied()
        .filter(|s| {
            let rp = s.perigee_radius_km();
            rp > EARTH_RADIUS_KM && rp < EARTH_RADIUS_KM + DEFAULT_MAX_PERIGEE_ALTITUDE_KM
        })
        .collect();
    assert_eq!(filtered.retained, expected);
}

#[test]
fn filter_rejects_non_finite_perigees() {
    let good = OrbitalElements {
        semi_major_axis_km: 7_000.0,
        eccentricity: 0.01,
        inclination_rad: 0.5,
        raan_rad: 0.0,
        argument_of_perigee_rad: 0.0,
        eccentric_anomaly_rad: 0.0,
    };
    let nan_e = OrbitalElements { eccentricity: f64::NAN, ..good };
    let nan_a = OrbitalElements { semi_major_axis_km: f64::NAN, ..good };
    let infinite_a = OrbitalElements { semi_major_axis_km: f64::INFINITY, ..good };

    let filtered = filter_physical(
        &[nan_e, good, nan_a, infinite_a],
        EARTH_RADIUS_KM,
        DEFAULT_MAX_PERIGEE_ALTITUDE_KM,
    );
    assert_eq!(filtered.retained, vec![good]);
    assert_eq!(filtered.non_finite, 3);
    assert_eq!(filtered.below_surface, 0);
    assert_eq!(filtered.above_ceiling, 0);
    assert_eq!(filtered.total(), 4);
}

#[test]
fn zero_count_yields_nothing() {
    let sets = sampling::sample(&defaults(), 0, DEFAULT_SEED).expect("empty draw");
    assert!(sets.is_empty());
    assert_eq!(filter_physical(&sets, EARTH_RADIUS_KM, 2_000.0).total(), 0);
}

#[test]
fn invalid_ranges_are_rejected() {
    let mut inverted = defaults();
    inverted.semi_major_axis_km = SampleRange::new(9_000.0, 8_000.0);
    assert!(matches!(
        sampling::sample(&inverted, 5, DEFAULT_SEED),
        Err(SamplingError::InvalidRange { element: "semi-major axis", .. })
    ));

    let mut open = defaults();
    open.eccentricity = SampleRange::new(0.0, 1.5);
    assert!(matches!(
        sampling::sample(&open, 5, DEFAULT_SEED),
        Err(SamplingError::InvalidRange { element: "eccentricity", .. })
    ));

    let mut empty = defaults();
    empty.inclination_rad = SampleRange::new(0.3, 0.3);
    assert!(sampling::sample(&empty, 5, DEFAULT_SEED).is_err());
}
