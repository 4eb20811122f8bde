//! Orbit representations and two-body helpers: element sets, Cartesian
//! conversion, anomaly relations, and Kepler propagation.

pub mod anomaly;
pub mod conversion;
pub mod elements;
pub mod propagation;

pub use conversion::{ConversionError, to_cartesian, to_elements};
pub use elements::{OrbitalElements, StateVector};
pub use propagation::{PropagationError, propagate_elements, propagate_state};

/// Circular orbital speed at the given radius.
pub fn circular_speed(mu_km3_s2: f64, radius_km: f64) -> f64 {
    (mu_km3_s2 / radius_km).sqrt()
}
