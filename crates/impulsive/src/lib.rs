//! Impulsive transfer utilities: Lambert solvers and differential correction.

pub mod lambert;
pub mod targeting;

pub use lambert::{
    BateSolver, IzzoSolver, LambertBranch, LambertProblem, LambertSolution, LambertSolver,
    LambertSolverError,
};
pub use targeting::{
    CorrectionError, CorrectionOutcome, CorrectionRequest, CorrectionSettings, CorrectionStatus,
    DifferentialCorrector, ShootingCorrector,
};
