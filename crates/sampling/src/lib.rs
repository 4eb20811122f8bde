//! Seeded sampling of Keplerian element sets and perigee-radius filtering.
//!
//! The generator is owned by the caller through [`CandidateSampler`], so two
//! samplers built from the same seed always produce the same sequence.

use std::f64::consts::PI;

use hop_core::constants::TWO_PI;
use hop_orbits::OrbitalElements;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::debug;

/// Seed used by the reference sampling runs.
pub const DEFAULT_SEED: u64 = 100;
/// Number of element sets drawn by the reference sampling runs.
pub const DEFAULT_COUNT: usize = 100;
/// Perigee altitude ceiling (km) applied by the reference sampling runs.
pub const DEFAULT_MAX_PERIGEE_ALTITUDE_KM: f64 = 2_000.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SamplingError {
    #[error("invalid {element} range [{min}, {max}): {reason}")]
    InvalidRange {
        element: &'static str,
        min: f64,
        max: f64,
        reason: &'static str,
    },
}

/// Half-open interval `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRange {
    pub min: f64,
    pub max: f64,
}

impl SampleRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn check(&self, element: &'static str, lower: f64, upper: f64) -> Result<(), SamplingError> {
        let fail = |reason| SamplingError::InvalidRange {
            element,
            min: self.min,
            max: self.max,
            reason,
        };
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(fail("bounds must be finite"));
        }
        if self.min >= self.max {
            return Err(fail("min must be strictly less than max"));
        }
        if self.min < lower || self.max > upper {
            return Err(fail("bounds outside the admissible domain"));
        }
        Ok(())
    }
}

/// Sampling intervals for each of the six elements (km and radians).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementRanges {
    pub semi_major_axis_km: SampleRange,
    pub eccentricity: SampleRange,
    pub inclination_rad: SampleRange,
    pub raan_rad: SampleRange,
    pub argument_of_perigee_rad: SampleRange,
    pub eccentric_anomaly_rad: SampleRange,
}

impl ElementRanges {
    /// Ranges of the reference low-Earth study: `a` between one body diameter
    /// plus 100 km and plus 1000 km, any closed eccentricity, any orientation.
    pub fn low_earth_defaults(central_body_radius_km: f64) -> Self {
        let diameter = 2.0 * central_body_radius_km;
        Self {
            semi_major_axis_km: SampleRange::new(diameter + 100.0, diameter + 1_000.0),
            eccentricity: SampleRange::new(0.0, 1.0),
            inclination_rad: SampleRange::new(0.0, PI),
            raan_rad: SampleRange::new(0.0, TWO_PI),
            argument_of_perigee_rad: SampleRange::new(0.0, TWO_PI),
            eccentric_anomaly_rad: SampleRange::new(0.0, TWO_PI),
        }
    }

    pub fn validate(&self) -> Result<(), SamplingError> {
        self.semi_major_axis_km
            .check("semi-major axis", f64::MIN_POSITIVE, f64::INFINITY)?;
        self.eccentricity.check("eccentricity", 0.0, 1.0)?;
        self.inclination_rad.check("inclination", 0.0, PI)?;
        self.raan_rad.check("RAAN", 0.0, TWO_PI)?;
        self.argument_of_perigee_rad
            .check("argument of perigee", 0.0, TWO_PI)?;
        self.eccentric_anomaly_rad
            .check("eccentric anomaly", 0.0, TWO_PI)?;
        Ok(())
    }
}

/// Deterministic element-set generator.
#[derive(Debug, Clone)]
pub struct CandidateSampler {
    rng: ChaCha8Rng,
}

impl CandidateSampler {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn draw(&mut self, range: &SampleRange) -> f64 {
        self.rng.random_range(range.min..range.max)
    }

    /// Draw `count` element sets. Each set consumes a, e, i, Ω, ω, E in that order.
    pub fn sample(&mut self, ranges: &ElementRanges, count: usize) -> Result<Vec<OrbitalElements>, SamplingError> {
        ranges.validate()?;
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(OrbitalElements {
                semi_major_axis_km: self.draw(&ranges.semi_major_axis_km),
                eccentricity: self.draw(&ranges.eccentricity),
                inclination_rad: self.draw(&ranges.inclination_rad),
                raan_rad: self.draw(&ranges.raan_rad),
                argument_of_perigee_rad: self.draw(&ranges.argument_of_perigee_rad),
                eccentric_anomaly_rad: self.draw(&ranges.eccentric_anomaly_rad),
            });
        }
        debug!(count, "sampled element sets");
        Ok(out)
    }
}

/// Convenience wrapper that seeds a fresh sampler.
pub fn sample(ranges: &ElementRanges, count: usize, seed: u64) -> Result<Vec<OrbitalElements>, SamplingError> {
    CandidateSampler::from_seed(seed).sample(ranges, count)
}

/// Outcome of [`filter_physical`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerigeeFilter {
    pub retained: Vec<OrbitalElements>,
    pub below_surface: usize,
    pub above_ceiling: usize,
    /// Sets whose perigee radius is NaN or infinite.
    pub non_finite: usize,
}

impl PerigeeFilter {
    pub fn total(&self) -> usize {
        self.retained.len() + self.below_surface + self.above_ceiling + self.non_finite
    }
}

/// Keep element sets whose perigee radius lies strictly between the body
/// surface and the altitude ceiling, counting the rejects on each side.
/// Sets with a non-finite perigee are rejected and counted separately.
pub fn filter_physical(
    elements: &[OrbitalElements],
    central_body_radius_km: f64,
    max_perigee_altitude_km: f64,
) -> PerigeeFilter {
    let ceiling = central_body_radius_km + max_perigee_altitude_km;
    let mut filter = PerigeeFilter::default();
    for set in elements {
        let perigee = set.perigee_radius_km();
        if !perigee.is_finite() {
            filter.non_finite += 1;
        } else if perigee <= central_body_radius_km {
            filter.below_surface += 1;
        } else if perigee >= ceiling {
            filter.above_ceiling += 1;
        } else {
            filter.retained.push(*set);
        }
    }
    debug!(
        retained = filter.retained.len(),
        below_surface = filter.below_surface,
        above_ceiling = filter.above_ceiling,
        non_finite = filter.non_finite,
        "perigee filter applied"
    );
    filter
}
