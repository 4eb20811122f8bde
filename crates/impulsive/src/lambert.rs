//! Lambert boundary-value solvers.
//!
//! [`IzzoSolver`] enumerates every revolution count the time of flight admits
//! (one direct branch plus a left and right branch per extra revolution).
//! [`BateSolver`] wraps the universal-variable solver from `lambert-bate` and
//! only answers the direct branch.

use std::f64::consts::PI;

use hop_core::vector::{self, Vector3};
use lambert_bate::get_velocities;
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LambertSolverError {
    #[error("invalid lambert problem: {0}")]
    InvalidInput(&'static str),
    #[error("lambert solver failed: {0}")]
    Failure(String),
}

/// Which solution family a Lambert velocity pair belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LambertBranch {
    /// Zero-revolution transfer.
    Direct,
    /// Low-energy multi-revolution branch.
    Left,
    /// High-energy multi-revolution branch.
    Right,
}

impl LambertBranch {
    pub fn as_str(&self) -> &'static str {
        match self {
            LambertBranch::Direct => "direct",
            LambertBranch::Left => "left",
            LambertBranch::Right => "right",
        }
    }
}

/// Two positions, a flight time, and the revolution window to search.
///
/// `orbit_normal` fixes the sense of motion: every returned arc travels
/// counter-clockwise about it. A zero normal falls back to the short way.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LambertProblem {
    pub r1_km: Vector3,
    pub r2_km: Vector3,
    pub time_of_flight_s: f64,
    pub mu_km3_s2: f64,
    pub min_revolutions: u32,
    pub max_revolutions: u32,
    pub orbit_normal: Vector3,
}

impl LambertProblem {
    fn validate(&self) -> Result<(), LambertSolverError> {
        if !(vector::is_finite(&self.r1_km) && vector::is_finite(&self.r2_km)) {
            return Err(LambertSolverError::InvalidInput("positions must be finite"));
        }
        if vector::norm(&self.r1_km) <= f64::EPSILON || vector::norm(&self.r2_km) <= f64::EPSILON {
            return Err(LambertSolverError::InvalidInput("positions must be non-zero"));
        }
        if !(self.time_of_flight_s.is_finite() && self.time_of_flight_s > 0.0) {
            return Err(LambertSolverError::InvalidInput("time of flight must be positive"));
        }
        if !(self.mu_km3_s2.is_finite() && self.mu_km3_s2 > 0.0) {
            return Err(LambertSolverError::InvalidInput("gravitational parameter must be positive"));
        }
        if self.min_revolutions > self.max_revolutions {
            return Err(LambertSolverError::InvalidInput("min revolutions exceeds max revolutions"));
        }
        Ok(())
    }

    /// True when the prograde arc sweeps less than 180°.
    fn prograde_is_short_way(&self) -> bool {
        let h = vector::cross(&self.r1_km, &self.r2_km);
        match vector::unit(&self.orbit_normal) {
            Some(normal) => vector::dot(&h, &normal) >= 0.0,
            None => true,
        }
    }

    fn is_collinear(&self) -> bool {
        match (vector::unit(&self.r1_km), vector::unit(&self.r2_km)) {
            (Some(a), Some(b)) => vector::norm(&vector::cross(&a, &b)) < COLLINEAR_EPS,
            _ => true,
        }
    }
}

/// One branch of a Lambert solution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LambertSolution {
    pub v1_km_s: Vector3,
    pub v2_km_s: Vector3,
    pub revolutions: u32,
    pub branch: LambertBranch,
}

pub trait LambertSolver {
    /// Return every branch in the requested revolution window. An empty list
    /// means the geometry admits no solution there, which is not an error.
    fn solve(&self, problem: &LambertProblem) -> Result<Vec<LambertSolution>, LambertSolverError>;
}

const COLLINEAR_EPS: f64 = 1e-12;
const DIRECT_TOLERANCE: f64 = 1e-5;
const MULTI_REV_TOLERANCE: f64 = 1e-8;
const HOUSEHOLDER_MAX_ITERATIONS: usize = 15;
const HALLEY_MAX_ITERATIONS: usize = 12;
const TOF_RESIDUAL_TOLERANCE: f64 = 1e-6;

/// Izzo's Householder-iteration solver with multi-revolution support.
#[derive(Debug, Clone, Copy, Default)]
pub struct IzzoSolver;

impl LambertSolver for IzzoSolver {
    fn solve(&self, problem: &LambertProblem) -> Result<Vec<LambertSolution>, LambertSolverError> {
        problem.validate()?;
        if problem.is_collinear() {
            trace!("collinear lambert geometry, no transfer plane");
            return Ok(Vec::new());
        }

        let r1 = problem.r1_km;
        let r2 = problem.r2_km;
        let r1_mag = vector::norm(&r1);
        let r2_mag = vector::norm(&r2);
        let mu = problem.mu_km3_s2;

        let chord = vector::distance(&r2, &r1);
        let s = 0.5 * (chord + r1_mag + r2_mag);
        let lambda2 = 1.0 - chord / s;
        let mut lambda = lambda2.sqrt();

        let ir1 = vector::scale(&r1, 1.0 / r1_mag);
        let ir2 = vector::scale(&r2, 1.0 / r2_mag);
        let ih = vector::unit(&vector::cross(&ir1, &ir2))
            .ok_or(LambertSolverError::InvalidInput("degenerate transfer plane"))?;

        let (it1, it2) = if problem.prograde_is_short_way() {
            (vector::cross(&ih, &ir1), vector::cross(&ih, &ir2))
        } else {
            lambda = -lambda;
            (vector::cross(&ir1, &ih), vector::cross(&ir2, &ih))
        };

        let lambda3 = lambda * lambda2;
        let t = (2.0 * mu / (s * s * s)).sqrt() * problem.time_of_flight_s;

        let n_max = max_revolutions(t, lambda, lambda2, problem.max_revolutions);
        let mut roots: Vec<(f64, u32, LambertBranch)> = Vec::new();

        if problem.min_revolutions == 0 {
            let t00 = lambda.acos() + lambda * (1.0 - lambda2).sqrt();
            let t1 = 2.0 / 3.0 * (1.0 - lambda3);
            let x0 = if t >= t00 {
                -(t - t00) / (t - t00 + 4.0)
            } else if t <= t1 {
                t1 * (t1 - t) / (0.4 * (1.0 - lambda2 * lambda3) * t) + 1.0
            } else {
                (t / t00).powf(std::f64::consts::LN_2 / (t1 / t00).ln()) - 1.0
            };
            let x = householder(t, x0, lambda, 0, DIRECT_TOLERANCE);
            roots.push((x, 0, LambertBranch::Direct));
        }

        for revs in problem.min_revolutions.max(1)..=n_max {
            let n = f64::from(revs);
            let left = ((n * PI + PI) / (8.0 * t)).powf(2.0 / 3.0);
            let x_left = householder(t, (left - 1.0) / (left + 1.0), lambda, revs, MULTI_REV_TOLERANCE);
            roots.push((x_left, revs, LambertBranch::Left));

            let right = ((8.0 * t) / (n * PI)).powf(2.0 / 3.0);
            let x_right = householder(t, (right - 1.0) / (right + 1.0), lambda, revs, MULTI_REV_TOLERANCE);
            roots.push((x_right, revs, LambertBranch::Right));
        }

        let gamma = (mu * s / 2.0).sqrt();
        let rho = (r1_mag - r2_mag) / chord;
        let sigma = (1.0 - rho * rho).sqrt();

        let mut solutions = Vec::with_capacity(roots.len());
        for (x, revolutions, branch) in roots {
            let residual = (x_to_tof(x, lambda, revolutions) - t).abs();
            if !x.is_finite() || !(residual <= TOF_RESIDUAL_TOLERANCE * t.max(1.0)) {
                trace!(revolutions, ?branch, residual, "dropping unconverged lambert root");
                continue;
            }
            let y = (1.0 - lambda2 + lambda2 * x * x).sqrt();
            let vr1 = gamma * ((lambda * y - x) - rho * (lambda * y + x)) / r1_mag;
            let vr2 = -gamma * ((lambda * y - x) + rho * (lambda * y + x)) / r2_mag;
            let vt = gamma * sigma * (y + lambda * x);
            let v1 = vector::add(&vector::scale(&ir1, vr1), &vector::scale(&it1, vt / r1_mag));
            let v2 = vector::add(&vector::scale(&ir2, vr2), &vector::scale(&it2, vt / r2_mag));
            if !(vector::is_finite(&v1) && vector::is_finite(&v2)) {
                continue;
            }
            solutions.push(LambertSolution {
                v1_km_s: v1,
                v2_km_s: v2,
                revolutions,
                branch,
            });
        }
        Ok(solutions)
    }
}

/// Largest revolution count reachable in normalised time `t`, capped at `cap`.
fn max_revolutions(t: f64, lambda: f64, lambda2: f64, cap: u32) -> u32 {
    let floor = (t / PI).floor();
    if floor < 1.0 {
        return 0;
    }
    let n_max = if floor >= f64::from(cap) { cap } else { floor as u32 };
    if n_max == 0 {
        return 0;
    }

    let t00 = lambda.acos() + lambda * (1.0 - lambda2).sqrt();
    let t0 = t00 + f64::from(n_max) * PI;
    if t >= t0 {
        return n_max;
    }

    // Halley iterations for the minimum flight time of the n_max family.
    let mut x_old = 0.0;
    let mut t_min = t0;
    for _ in 0..HALLEY_MAX_ITERATIONS {
        let (dt, ddt, dddt) = tof_derivatives(x_old, t_min, lambda);
        if dt == 0.0 {
            break;
        }
        let x_new = x_old - dt * ddt / (ddt * ddt - dt * dddt / 2.0);
        if !x_new.is_finite() {
            break;
        }
        let err = (x_old - x_new).abs();
        t_min = x_to_tof(x_new, lambda, n_max);
        x_old = x_new;
        if err < 1e-13 {
            break;
        }
    }
    if t_min > t { n_max - 1 } else { n_max }
}

fn householder(t_target: f64, mut x: f64, lambda: f64, revs: u32, eps: f64) -> f64 {
    for _ in 0..HOUSEHOLDER_MAX_ITERATIONS {
        let tof = x_to_tof(x, lambda, revs);
        let (dt, ddt, dddt) = tof_derivatives(x, tof, lambda);
        let delta = tof - t_target;
        let dt2 = dt * dt;
        let x_new =
            x - delta * (dt2 - delta * ddt / 2.0) / (dt * (dt2 - delta * ddt) + dddt * delta * delta / 6.0);
        let err = (x - x_new).abs();
        x = x_new;
        if !(err > eps) {
            break;
        }
    }
    x
}

/// First three derivatives of the normalised time of flight with respect to x.
fn tof_derivatives(x: f64, t: f64, lambda: f64) -> (f64, f64, f64) {
    let l2 = lambda * lambda;
    let l3 = l2 * lambda;
    let umx2 = 1.0 - x * x;
    let y = (1.0 - l2 * umx2).sqrt();
    let y2 = y * y;
    let y3 = y2 * y;
    let dt = (3.0 * t * x - 2.0 + 2.0 * l3 * x / y) / umx2;
    let ddt = (3.0 * t + 5.0 * x * dt + 2.0 * (1.0 - l2) * l3 / y3) / umx2;
    let dddt = (7.0 * x * ddt + 8.0 * dt - 6.0 * (1.0 - l2) * l2 * l3 * x / y3 / y2) / umx2;
    (dt, ddt, dddt)
}

/// Normalised time of flight for parameter `x`: Battin's series near the
/// parabola, Lagrange's form close to it, Lancaster's form elsewhere.
fn x_to_tof(x: f64, lambda: f64, revs: u32) -> f64 {
    const BATTIN: f64 = 0.01;
    const LAGRANGE: f64 = 0.2;
    let n = f64::from(revs);
    let dist = (x - 1.0).abs();
    if dist < LAGRANGE && dist > BATTIN {
        return x_to_tof_lagrange(x, lambda, n);
    }
    let k = lambda * lambda;
    let e = x * x - 1.0;
    let rho = e.abs();
    let z = (1.0 + k * e).sqrt();
    if dist < BATTIN {
        let eta = z - lambda * x;
        let s1 = 0.5 * (1.0 - lambda - x * eta);
        let q = 4.0 / 3.0 * hypergeometric_f(s1, 1e-11);
        (eta * eta * eta * q + 4.0 * lambda * eta) / 2.0 + n * PI / rho.powf(1.5)
    } else {
        let y = rho.sqrt();
        let g = x * z - lambda * e;
        let d = if e < 0.0 {
            n * PI + g.acos()
        } else {
            let f = y * (z - lambda * x);
            (f + g).ln()
        };
        (x - lambda * z - d / y) / e
    }
}

fn x_to_tof_lagrange(x: f64, lambda: f64, n: f64) -> f64 {
    let a = 1.0 / (1.0 - x * x);
    if a > 0.0 {
        let alpha = 2.0 * x.acos();
        let mut beta = 2.0 * (lambda * lambda / a).sqrt().asin();
        if lambda < 0.0 {
            beta = -beta;
        }
        a * a.sqrt() * ((alpha - alpha.sin()) - (beta - beta.sin()) + 2.0 * PI * n) / 2.0
    } else {
        let alpha = 2.0 * x.acosh();
        let mut beta = 2.0 * (-lambda * lambda / a).sqrt().asinh();
        if lambda < 0.0 {
            beta = -beta;
        }
        -a * (-a).sqrt() * ((beta - beta.sinh()) - (alpha - alpha.sinh())) / 2.0
    }
}

fn hypergeometric_f(z: f64, tol: f64) -> f64 {
    let mut sum = 1.0;
    let mut term = 1.0;
    for j in 0..1_000 {
        let j = f64::from(j);
        term *= (3.0 + j) * (1.0 + j) / (2.5 + j) * z / (j + 1.0);
        sum += term;
        if term.abs() <= tol {
            break;
        }
    }
    sum
}

/// Zero-revolution solver backed by the `lambert-bate` crate.
#[derive(Debug, Clone, Copy)]
pub struct BateSolver {
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for BateSolver {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            max_iterations: 500,
        }
    }
}

impl LambertSolver for BateSolver {
    fn solve(&self, problem: &LambertProblem) -> Result<Vec<LambertSolution>, LambertSolverError> {
        problem.validate()?;
        if problem.min_revolutions > 0 || problem.is_collinear() {
            return Ok(Vec::new());
        }
        let (v1, v2) = solve(
            problem.r1_km,
            problem.r2_km,
            problem.time_of_flight_s,
            problem.mu_km3_s2,
            problem.prograde_is_short_way(),
            self.tolerance,
            self.max_iterations,
        )?;
        if !(vector::is_finite(&v1) && vector::is_finite(&v2)) {
            return Ok(Vec::new());
        }
        Ok(vec![LambertSolution {
            v1_km_s: v1,
            v2_km_s: v2,
            revolutions: 0,
            branch: LambertBranch::Direct,
        }])
    }
}

/// Direct call into the `lambert-bate` universal-variable solver.
pub fn solve(
    r1_km: Vector3,
    r2_km: Vector3,
    time_of_flight_s: f64,
    mu_km3_s2: f64,
    short: bool,
    tolerance: f64,
    max_iterations: usize,
) -> Result<(Vector3, Vector3), LambertSolverError> {
    get_velocities(r1_km, r2_km, time_of_flight_s, mu_km3_s2, short, tolerance, max_iterations)
        .map_err(|e| LambertSolverError::Failure(format!("{e:?}")))
}
