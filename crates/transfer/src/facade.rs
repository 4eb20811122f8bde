//! Re-exported APIs for consumers of the transfer crate.

pub use crate::pipeline::{
    BranchSearchRequest, CatalogScanner, PairError, PairFailure, PairOutcome, PairRecord,
    PairStage, PairingMode, RefineRequest, RefinedTransfer, ScanError, ScanReport, ScanSettings,
    SelectionError, TransferCandidate, TransferResult, impulse_cost, refine, search, select_best,
};
pub use hop_ephem::{CatalogObject, EphemerisError, OrbitModel, PropagationModel, TwoBodyEphemeris};
pub use hop_impulsive::{
    BateSolver, CorrectionSettings, CorrectionStatus, DifferentialCorrector, IzzoSolver,
    LambertBranch, LambertSolver, ShootingCorrector,
};

/// Conversion of catalog configuration into runtime objects.
pub mod catalog {
    use std::path::Path;

    use hop_config::{CatalogEntryConfig, ConfigError, OrbitConfig};
    use hop_core::time::{DateTime, Utc};
    use hop_core::units::deg_to_rad;
    use hop_ephem::{CatalogObject, OrbitModel};
    use hop_orbits::{OrbitalElements, StateVector};

    /// Convert a catalog entry. Model validity is checked by the scanner, not here.
    pub fn from_config(entry: &CatalogEntryConfig) -> Result<CatalogObject, ConfigError> {
        let model = match entry.orbit {
            OrbitConfig::Elements {
                a_km,
                e,
                i_deg,
                raan_deg,
                aop_deg,
                ea_deg,
            } => OrbitModel::Elements(OrbitalElements {
                semi_major_axis_km: a_km,
                eccentricity: e,
                inclination_rad: deg_to_rad(i_deg),
                raan_rad: deg_to_rad(raan_deg),
                argument_of_perigee_rad: deg_to_rad(aop_deg),
                eccentric_anomaly_rad: deg_to_rad(ea_deg),
            }),
            OrbitConfig::State {
                position_km,
                velocity_km_s,
            } => OrbitModel::State(StateVector::new(position_km, velocity_km_s)),
        };
        Ok(CatalogObject::new(entry.id.clone(), model, entry.epoch()?))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<CatalogObject>, ConfigError> {
        hop_config::load_catalog(path)?
            .iter()
            .map(from_config)
            .collect()
    }

    /// Wrap sampled element sets as catalog objects named `SYN-0000`, `SYN-0001`, ...
    pub fn synthetic(elements: &[OrbitalElements], epoch: DateTime<Utc>) -> Vec<CatalogObject> {
        elements
            .iter()
            .enumerate()
            .map(|(index, set)| CatalogObject::new(format!("SYN-{index:04}"), OrbitModel::Elements(*set), epoch))
            .collect()
    }
}

/// Runtime settings derived from a scan manifest.
pub mod settings {
    use hop_config::{ConfigError, PairingConfig, RangeConfig, SamplingConfig, ScanConfig, SolverConfig};
    use hop_core::units::deg_to_rad;
    use hop_impulsive::{BateSolver, CorrectionSettings, IzzoSolver, LambertSolver};
    use hop_sampling::{ElementRanges, SampleRange};

    use crate::pipeline::{PairingMode, ScanSettings};

    pub fn pairing(config: PairingConfig) -> PairingMode {
        match config {
            PairingConfig::Consecutive => PairingMode::ConsecutiveOnly,
            PairingConfig::All => PairingMode::AllPairs,
        }
    }

    pub fn solver(config: SolverConfig) -> Box<dyn LambertSolver> {
        match config {
            SolverConfig::Izzo => Box::new(IzzoSolver),
            SolverConfig::Bate => Box::new(BateSolver::default()),
        }
    }

    pub fn solver_name(config: SolverConfig) -> &'static str {
        match config {
            SolverConfig::Izzo => "izzo",
            SolverConfig::Bate => "bate",
        }
    }

    pub fn scan_settings(config: &ScanConfig) -> Result<ScanSettings, ConfigError> {
        Ok(ScanSettings {
            departure_epoch: config.departure_epoch()?,
            time_of_flight_s: config.time_of_flight_s,
            min_revolutions: config.min_revolutions,
            max_revolutions: config.max_revolutions,
            pairing: pairing(config.pairing),
            correction: CorrectionSettings {
                mu_km3_s2: config.central_body.mu_km3_s2,
                body_radius_km: config.central_body.radius_km,
                abs_tol_km: config.refinement.abs_tol_km,
                rel_tol: config.refinement.rel_tol,
                max_iterations: config.refinement.max_iterations,
            },
        })
    }

    fn range(config: Option<RangeConfig>, fallback: SampleRange, to_internal: fn(f64) -> f64) -> SampleRange {
        config
            .map(|r| SampleRange::new(to_internal(r.min), to_internal(r.max)))
            .unwrap_or(fallback)
    }

    /// Sampling ranges in km/radians; missing entries fall back to the low-Earth defaults.
    pub fn element_ranges(config: &SamplingConfig, body_radius_km: f64) -> ElementRanges {
        let defaults = ElementRanges::low_earth_defaults(body_radius_km);
        let ranges = &config.ranges;
        let identity: fn(f64) -> f64 = |v| v;
        ElementRanges {
            semi_major_axis_km: range(ranges.semi_major_axis_km, defaults.semi_major_axis_km, identity),
            eccentricity: range(ranges.eccentricity, defaults.eccentricity, identity),
            inclination_rad: range(ranges.inclination_deg, defaults.inclination_rad, deg_to_rad),
            raan_rad: range(ranges.raan_deg, defaults.raan_rad, deg_to_rad),
            argument_of_perigee_rad: range(ranges.aop_deg, defaults.argument_of_perigee_rad, deg_to_rad),
            eccentric_anomaly_rad: range(ranges.ea_deg, defaults.eccentric_anomaly_rad, deg_to_rad),
        }
    }
}

/// Scan and sample reports in export formats.
pub mod report {
    use std::collections::BTreeMap;
    use std::io::{self, Write};

    use hop_core::units::rad_to_deg;
    use hop_export::samples::{CartesianRow, ElementsRow};
    use hop_export::summary::{ScanSummary, Settings};
    use hop_export::transfers::{self, Record};
    use hop_orbits::{OrbitalElements, StateVector};

    use crate::pipeline::{PairOutcome, ScanReport, ScanSettings};

    /// Write one CSV row per attempted pair, header first.
    pub fn write_transfers(writer: &mut dyn Write, report: &ScanReport) -> io::Result<()> {
        transfers::write_header(writer)?;
        for record in &report.records {
            let (success, stage, cause, iterations, solution) = match &record.outcome {
                PairOutcome::Transfer(result) => (true, None, None, Some(result.iteration_count), result.solution),
                PairOutcome::Failed(failure) => {
                    let iterations = match failure.error {
                        crate::pipeline::PairError::NotConverged { iterations, .. } => Some(iterations),
                        _ => None,
                    };
                    (false, Some(failure.stage.as_str()), Some(failure.error.to_string()), iterations, None)
                }
            };
            Record {
                pair: record.index,
                departure_id: &record.departure_id,
                arrival_id: &record.arrival_id,
                success,
                failed_stage: stage,
                cause: cause.as_deref(),
                iterations,
                revolutions: record.selected.map(|c| c.revolutions),
                branch: record.selected.map(|c| c.branch.as_str()),
                lambert_cost_km_s: record.selected.map(|c| c.cost_km_s),
                dv_departure_km_s: solution.map(|s| s.departure_delta_v_km_s),
                dv_arrival_km_s: solution.map(|s| s.arrival_delta_v_km_s),
                dv_total_km_s: solution.map(|s| s.total_delta_v_km_s),
            }
            .write_to(writer)?;
        }
        writer.flush()
    }

    /// Aggregate counts and settings for the JSON sidecar.
    pub fn summary<'a>(
        report: &ScanReport,
        objects: usize,
        settings: &ScanSettings,
        departure_epoch: &'a str,
        solver: &'a str,
    ) -> ScanSummary<'a> {
        let mut failures_by_stage = BTreeMap::new();
        for failure in report.records.iter().filter_map(|r| r.failure()) {
            *failures_by_stage.entry(failure.stage.as_str()).or_insert(0) += 1;
        }
        let iterations: Vec<usize> = report.transfers().map(|t| t.iteration_count).collect();
        let mean_iterations =
            (!iterations.is_empty()).then(|| iterations.iter().sum::<usize>() as f64 / iterations.len() as f64);

        ScanSummary {
            objects,
            pairs_attempted: report.attempted(),
            succeeded: report.succeeded,
            failed: report.failed,
            failures_by_stage,
            best_total_dv_km_s: report.best().and_then(|t| t.total_delta_v_km_s()),
            mean_iterations,
            settings: Settings {
                departure_epoch,
                time_of_flight_s: settings.time_of_flight_s,
                mu_km3_s2: settings.correction.mu_km3_s2,
                body_radius_km: settings.correction.body_radius_km,
                min_revolutions: settings.min_revolutions,
                max_revolutions: settings.max_revolutions,
                pairing: settings.pairing.as_str(),
                solver,
                abs_tol_km: settings.correction.abs_tol_km,
                rel_tol: settings.correction.rel_tol,
                max_iterations: settings.correction.max_iterations,
            },
        }
    }

    pub fn elements_row(elements: &OrbitalElements) -> ElementsRow {
        ElementsRow {
            semi_major_axis_km: elements.semi_major_axis_km,
            eccentricity: elements.eccentricity,
            inclination_deg: rad_to_deg(elements.inclination_rad),
            raan_deg: rad_to_deg(elements.raan_rad),
            aop_deg: rad_to_deg(elements.argument_of_perigee_rad),
            ea_deg: rad_to_deg(elements.eccentric_anomaly_rad),
        }
    }

    pub fn cartesian_row(state: &StateVector) -> CartesianRow {
        CartesianRow {
            position_km: state.position_km,
            velocity_km_s: state.velocity_km_s,
        }
    }
}
