use std::fs;
use std::path::Path;

use csv::Reader;
use orbit_hop::config::load_scan_config;
use orbit_hop::core::constants::{EARTH_RADIUS_KM, MU_EARTH_KM3_S2};
use orbit_hop::core::time::parse_epoch;
use orbit_hop::core::vector;
use orbit_hop::export::summary::write_summary;
use orbit_hop::orbits::{StateVector, circular_speed, propagate_state};
use orbit_hop::transfer::{
    CatalogObject, CatalogScanner, CorrectionSettings, IzzoSolver, OrbitModel, PairingMode,
    ScanSettings, ShootingCorrector, TwoBodyEphemeris, catalog, report, settings,
};
use serde_json::Value;
use tempfile::tempdir;

#[test]
fn state_catalog_transfer_hits_the_arrival_object() {
    let epoch = parse_epoch("2024-01-01T00:00:00Z").expect("epoch");
    let arrival_speed = circular_speed(MU_EARTH_KM3_S2, 7_200.0);
    let objects = vec![
        CatalogObject::new(
            "DEP",
            OrbitModel::State(StateVector::new([7_000.0, 0.0, 0.0], [0.0, 7.5, 0.0])),
            epoch,
        ),
        CatalogObject::new(
            "ARR",
            OrbitModel::State(StateVector::new([0.0, 7_200.0, 0.0], [-arrival_speed, 0.0, 0.0])),
            epoch,
        ),
    ];
    let scan_settings = ScanSettings {
        departure_epoch: epoch,
        time_of_flight_s: 1_000.0,
        min_revolutions: 0,
        max_revolutions: 0,
        pairing: PairingMode::ConsecutiveOnly,
        correction: CorrectionSettings {
            mu_km3_s2: MU_EARTH_KM3_S2,
            body_radius_km: EARTH_RADIUS_KM,
            abs_tol_km: 1e-6,
            rel_tol: 1e-9,
            max_iterations: 50,
        },
    };

    let ephemeris = TwoBodyEphemeris::new(MU_EARTH_KM3_S2);
    let scanner = CatalogScanner::new(&ephemeris, &IzzoSolver, &ShootingCorrector);
    let scan = scanner.scan(&objects, &scan_settings).expect("scan runs");
    assert_eq!(scan.succeeded, 1);

    let record = &scan.records[0];
    let selected = record.selected.expect("branch selected");
    let transfer = record.transfer().expect("transfer converged");
    let solution = transfer.solution.expect("converged solution");
    let gap = (solution.total_delta_v_km_s - selected.cost_km_s).abs() / selected.cost_km_s;
    assert!(gap < 0.01, "refined Δv {} vs branch {}", solution.total_delta_v_km_s, selected.cost_km_s);
    assert!(
        (solution.departure_delta_v_km_s + solution.arrival_delta_v_km_s - solution.total_delta_v_km_s).abs()
            < 1e-12
    );

    let start = StateVector::new([7_000.0, 0.0, 0.0], solution.departure_velocity_km_s);
    let flown = propagate_state(&start, 1_000.0, MU_EARTH_KM3_S2).expect("flight propagates");
    let target = ephemeris_position(&objects[1], 1_000.0);
    let miss = vector::distance(&flown.position_km, &target);
    assert!(miss <= 1e-6 + 1e-9 * vector::norm(&target) + 1e-9, "miss distance {miss} km");
}

fn ephemeris_position(object: &CatalogObject, dt: f64) -> [f64; 3] {
    match object.model {
        OrbitModel::State(state) => propagate_state(&state, dt, MU_EARTH_KM3_S2)
            .expect("arrival propagates")
            .position_km,
        OrbitModel::Elements(_) => panic!("state model expected"),
    }
}

#[test]
fn sample_manifest_scan_exports_csv_and_summary() {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR")).join("configs/scan.toml");
    let config = load_scan_config(&manifest).expect("manifest");
    let scan_settings = settings::scan_settings(&config).expect("settings");
    let objects = catalog::load(config.catalog_path(&manifest).expect("catalog path")).expect("catalog");

    let ephemeris = TwoBodyEphemeris::new(config.central_body.mu_km3_s2);
    let solver = settings::solver(config.solver);
    let scanner = CatalogScanner::new(&ephemeris, solver.as_ref(), &ShootingCorrector);
    let scan = scanner.scan(&objects, &scan_settings).expect("scan runs");
    assert_eq!(scan.attempted(), objects.len() - 1);
    assert_eq!(scan.succeeded + scan.failed, scan.attempted());

    let dir = tempdir().expect("tempdir");
    let mut buffer = Vec::new();
    report::write_transfers(&mut buffer, &scan).expect("csv written");
    let mut reader = Reader::from_reader(buffer.as_slice());
    let headers = reader.headers().expect("header row").clone();
    assert_eq!(&headers[0], "pair");
    assert_eq!(&headers[3], "status");
    assert_eq!(headers.len(), 13);

    let rows: Vec<_> = reader.records().collect::<Result<_, _>>().expect("rows parse");
    assert_eq!(rows.len(), scan.attempted());
    for (row, record) in rows.iter().zip(&scan.records) {
        assert_eq!(&row[1], record.departure_id);
        assert_eq!(&row[2], record.arrival_id);
        match record.transfer() {
            Some(transfer) => {
                assert_eq!(&row[3], "success");
                assert!(row[4].is_empty());
                let total: f64 = row[12].parse().expect("total Δv column");
                let expected = transfer.total_delta_v_km_s().expect("converged");
                assert!((total - expected).abs() < 1e-8);
            }
            None => {
                assert_eq!(&row[3], "failed");
                assert!(!row[4].is_empty(), "failed rows name their stage");
                assert!(row[12].is_empty());
            }
        }
    }

    let summary_path = dir.path().join("out/summary.json");
    let summary = report::summary(
        &scan,
        objects.len(),
        &scan_settings,
        &config.departure_epoch,
        settings::solver_name(config.solver),
    );
    write_summary(&summary_path, &summary).expect("summary written");
    let json: Value = serde_json::from_str(&fs::read_to_string(&summary_path).expect("summary file"))
        .expect("summary is JSON");
    assert_eq!(json["objects"], 6);
    assert_eq!(json["pairs_attempted"], 5);
    assert_eq!(json["succeeded"].as_u64(), Some(scan.succeeded as u64));
    assert_eq!(json["settings"]["solver"], "izzo");
    assert_eq!(json["settings"]["pairing"], "consecutive");
    assert_eq!(json["settings"]["departure_epoch"], "2024-01-01T00:00:00Z");
    if scan.succeeded > 0 {
        assert!(json["best_total_dv_km_s"].as_f64().is_some());
    }
}
