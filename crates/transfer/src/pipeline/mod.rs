//! Per-pair transfer pipeline: propagate both objects, enumerate Lambert
//! branches, keep the cheapest, and refine it with a differential corrector.

pub mod branch_search;
pub mod refine;
pub mod scanner;
pub mod selection;

pub use branch_search::{BranchSearchRequest, TransferCandidate, impulse_cost, search};
pub use refine::{RefineRequest, RefinedTransfer, TransferResult, refine};
pub use scanner::{
    CatalogScanner, PairError, PairFailure, PairOutcome, PairRecord, PairStage, PairingMode,
    ScanError, ScanReport, ScanSettings,
};
pub use selection::{SelectionError, select_best};
