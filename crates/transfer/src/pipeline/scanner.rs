//! Drive the per-pair pipeline across a catalog.

use std::collections::HashSet;
use std::fmt;

use hop_core::time::{DateTime, Utc, offset_by_seconds};
use hop_ephem::{CatalogObject, EphemerisError, PropagationModel};
use hop_impulsive::{
    CorrectionError, CorrectionSettings, CorrectionStatus, DifferentialCorrector, LambertSolver,
    LambertSolverError,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::branch_search::{self, BranchSearchRequest, TransferCandidate};
use super::refine::{self, RefineRequest, TransferResult};
use super::selection::{self, SelectionError};

/// Which ordered pairs of the catalog get a transfer attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PairingMode {
    /// `objects[i] -> objects[i + 1]`.
    #[default]
    ConsecutiveOnly,
    /// Every ordered `(i, j)` with `i != j`, row-major.
    AllPairs,
}

impl PairingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PairingMode::ConsecutiveOnly => "consecutive",
            PairingMode::AllPairs => "all",
        }
    }

    /// Index pairs in attempt order for a catalog of `count` objects.
    pub fn pairs(&self, count: usize) -> Vec<(usize, usize)> {
        match self {
            PairingMode::ConsecutiveOnly => (1..count).map(|j| (j - 1, j)).collect(),
            PairingMode::AllPairs => (0..count)
                .flat_map(|i| (0..count).filter(move |&j| j != i).map(move |j| (i, j)))
                .collect(),
        }
    }
}

/// Settings fixed for the whole scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanSettings {
    pub departure_epoch: DateTime<Utc>,
    pub time_of_flight_s: f64,
    pub min_revolutions: u32,
    pub max_revolutions: u32,
    pub pairing: PairingMode,
    pub correction: CorrectionSettings,
}

impl ScanSettings {
    pub fn validate(&self) -> Result<(), ScanError> {
        if !(self.time_of_flight_s.is_finite() && self.time_of_flight_s > 0.0) {
            return Err(ScanError::InvalidSettings(
                "time of flight must be positive".to_string(),
            ));
        }
        if self.min_revolutions > self.max_revolutions {
            return Err(ScanError::InvalidSettings(format!(
                "min revolutions {} exceeds max revolutions {}",
                self.min_revolutions, self.max_revolutions
            )));
        }
        self.correction
            .validate()
            .map_err(|err| ScanError::InvalidSettings(err.to_string()))?;
        self.arrival_epoch()?;
        Ok(())
    }

    pub fn arrival_epoch(&self) -> Result<DateTime<Utc>, ScanError> {
        offset_by_seconds(self.departure_epoch, self.time_of_flight_s)
            .map_err(|err| ScanError::InvalidSettings(err.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PairStage {
    Propagating,
    BranchSearching,
    Selecting,
    Refining,
}

impl PairStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PairStage::Propagating => "propagating",
            PairStage::BranchSearching => "branch_searching",
            PairStage::Selecting => "selecting",
            PairStage::Refining => "refining",
        }
    }
}

impl fmt::Display for PairStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a single pair produced no transfer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PairError {
    #[error(transparent)]
    Propagation(#[from] EphemerisError),
    #[error(transparent)]
    Lambert(#[from] LambertSolverError),
    #[error("no lambert branch in the requested revolution window")]
    NoCandidates,
    #[error(transparent)]
    Refinement(#[from] CorrectionError),
    #[error("refinement stopped after {iterations} iterations ({})", .status.as_str())]
    NotConverged {
        iterations: usize,
        status: CorrectionStatus,
    },
}

impl From<SelectionError> for PairError {
    fn from(_: SelectionError) -> Self {
        PairError::NoCandidates
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PairFailure {
    pub stage: PairStage,
    pub error: PairError,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PairOutcome {
    Transfer(TransferResult),
    Failed(PairFailure),
}

/// One attempted pair in catalog order.
#[derive(Debug, Clone, PartialEq)]
pub struct PairRecord {
    pub index: usize,
    pub departure_id: String,
    pub arrival_id: String,
    /// Branch chosen before refinement, when the pair got that far.
    pub selected: Option<TransferCandidate>,
    pub outcome: PairOutcome,
}

impl PairRecord {
    pub fn transfer(&self) -> Option<&TransferResult> {
        match &self.outcome {
            PairOutcome::Transfer(result) => Some(result),
            PairOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&PairFailure> {
        match &self.outcome {
            PairOutcome::Transfer(_) => None,
            PairOutcome::Failed(failure) => Some(failure),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScanReport {
    pub records: Vec<PairRecord>,
    pub succeeded: usize,
    pub failed: usize,
}

impl ScanReport {
    pub fn attempted(&self) -> usize {
        self.records.len()
    }

    pub fn transfers(&self) -> impl Iterator<Item = &TransferResult> {
        self.records.iter().filter_map(PairRecord::transfer)
    }

    /// Cheapest refined transfer of the scan.
    pub fn best(&self) -> Option<&TransferResult> {
        self.transfers()
            .filter(|t| t.total_delta_v_km_s().is_some())
            .min_by(|a, b| {
                let a = a.total_delta_v_km_s().unwrap_or(f64::INFINITY);
                let b = b.total_delta_v_km_s().unwrap_or(f64::INFINITY);
                a.total_cmp(&b)
            })
    }
}

/// Problems that stop a scan before any pair is attempted.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScanError {
    #[error("catalog needs at least two objects (got {count})")]
    CatalogTooSmall { count: usize },
    #[error("catalog object at position {index} has an empty identifier")]
    EmptyIdentifier { index: usize },
    #[error("duplicate catalog identifier `{0}`")]
    DuplicateIdentifier(String),
    #[error("invalid orbit model: {0}")]
    InvalidModel(#[source] EphemerisError),
    #[error("invalid scan settings: {0}")]
    InvalidSettings(String),
}

/// Runs the propagate, search, select, refine pipeline over catalog pairs.
pub struct CatalogScanner<'a> {
    propagation: &'a dyn PropagationModel,
    solver: &'a dyn LambertSolver,
    corrector: &'a dyn DifferentialCorrector,
}

fn validate_catalog(objects: &[CatalogObject]) -> Result<(), ScanError> {
    if objects.len() < 2 {
        return Err(ScanError::CatalogTooSmall {
            count: objects.len(),
        });
    }
    let mut seen = HashSet::with_capacity(objects.len());
    for (index, object) in objects.iter().enumerate() {
        if object.id.trim().is_empty() {
            return Err(ScanError::EmptyIdentifier { index });
        }
        if !seen.insert(object.id.as_str()) {
            return Err(ScanError::DuplicateIdentifier(object.id.clone()));
        }
        object.validate_model().map_err(ScanError::InvalidModel)?;
    }
    Ok(())
}

impl<'a> CatalogScanner<'a> {
    pub fn new(
        propagation: &'a dyn PropagationModel,
        solver: &'a dyn LambertSolver,
        corrector: &'a dyn DifferentialCorrector,
    ) -> Self {
        Self {
            propagation,
            solver,
            corrector,
        }
    }

    /// Attempt every pair the pairing mode selects. A failing pair is recorded
    /// and the scan moves on; only catalog or settings problems abort.
    pub fn scan(&self, objects: &[CatalogObject], settings: &ScanSettings) -> Result<ScanReport, ScanError> {
        validate_catalog(objects)?;
        settings.validate()?;
        let arrival_epoch = settings.arrival_epoch()?;

        let pairs = settings.pairing.pairs(objects.len());
        info!(
            objects = objects.len(),
            pairs = pairs.len(),
            pairing = settings.pairing.as_str(),
            "catalog scan started"
        );

        let mut report = ScanReport::default();
        for (index, (i, j)) in pairs.into_iter().enumerate() {
            let departure = &objects[i];
            let arrival = &objects[j];
            let (selected, outcome) = self.plan_pair(departure, arrival, arrival_epoch, settings);
            match &outcome {
                PairOutcome::Transfer(result) => {
                    report.succeeded += 1;
                    debug!(
                        pair = index,
                        departure = %departure.id,
                        arrival = %arrival.id,
                        total_dv_km_s = result.total_delta_v_km_s(),
                        "pair recorded"
                    );
                }
                PairOutcome::Failed(failure) => {
                    report.failed += 1;
                    warn!(
                        pair = index,
                        departure = %departure.id,
                        arrival = %arrival.id,
                        stage = %failure.stage,
                        error = %failure.error,
                        "pair failed"
                    );
                }
            }
            report.records.push(PairRecord {
                index,
                departure_id: departure.id.clone(),
                arrival_id: arrival.id.clone(),
                selected,
                outcome,
            });
        }

        info!(
            attempted = report.attempted(),
            succeeded = report.succeeded,
            failed = report.failed,
            "catalog scan finished"
        );
        Ok(report)
    }

    fn plan_pair(
        &self,
        departure: &CatalogObject,
        arrival: &CatalogObject,
        arrival_epoch: DateTime<Utc>,
        settings: &ScanSettings,
    ) -> (Option<TransferCandidate>, PairOutcome) {
        let fail = |stage, error: PairError| PairOutcome::Failed(PairFailure { stage, error });

        let states = self
            .propagation
            .propagate_to_epoch(departure, settings.departure_epoch)
            .and_then(|dep| Ok((dep, self.propagation.propagate_to_epoch(arrival, arrival_epoch)?)));
        let (departure_state, arrival_state) = match states {
            Ok(states) => states,
            Err(err) => return (None, fail(PairStage::Propagating, err.into())),
        };
        debug!(departure = %departure.id, arrival = %arrival.id, "states propagated");

        let request = BranchSearchRequest {
            departure: departure_state,
            arrival: arrival_state,
            time_of_flight_s: settings.time_of_flight_s,
            mu_km3_s2: settings.correction.mu_km3_s2,
            min_revolutions: settings.min_revolutions,
            max_revolutions: settings.max_revolutions,
        };
        let candidates = match branch_search::search(&request, self.solver) {
            Ok(candidates) => candidates,
            Err(err) => return (None, fail(PairStage::BranchSearching, err.into())),
        };
        if candidates.is_empty() {
            return (None, fail(PairStage::BranchSearching, PairError::NoCandidates));
        }

        let selected = match selection::select_best(&candidates) {
            Ok(selected) => selected,
            Err(err) => return (None, fail(PairStage::Selecting, err.into())),
        };
        debug!(
            revolutions = selected.revolutions,
            branch = selected.branch.as_str(),
            cost_km_s = selected.cost_km_s,
            "branch selected"
        );

        let refine_request = RefineRequest {
            departure_id: &departure.id,
            arrival_id: &arrival.id,
            departure: departure_state,
            arrival: arrival_state,
            time_of_flight_s: settings.time_of_flight_s,
            initial_velocity_km_s: selected.departure_velocity_km_s,
            settings: settings.correction,
        };
        let outcome = match refine::refine(&refine_request, self.corrector) {
            Ok(result) if result.converged() => PairOutcome::Transfer(result),
            Ok(result) => fail(
                PairStage::Refining,
                PairError::NotConverged {
                    iterations: result.iteration_count,
                    status: result.status,
                },
            ),
            Err(err) => fail(PairStage::Refining, err.into()),
        };
        (Some(selected), outcome)
    }
}
