//! Catalog objects and the models that place them at an arbitrary epoch.

use hop_core::time::{DateTime, Utc, seconds_between};
use hop_orbits::{
    ConversionError, OrbitalElements, PropagationError, StateVector, propagate_elements,
    propagate_state, to_cartesian,
};
use thiserror::Error;
use tracing::trace;

/// Orbit description carried by a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrbitModel {
    Elements(OrbitalElements),
    State(StateVector),
}

/// A tracked object: unique identifier, orbit model, and the epoch at which
/// that model is valid.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogObject {
    pub id: String,
    pub model: OrbitModel,
    pub reference_epoch: DateTime<Utc>,
}

impl CatalogObject {
    pub fn new(id: impl Into<String>, model: OrbitModel, reference_epoch: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            model,
            reference_epoch,
        }
    }

    /// Check the model describes a usable orbit (closed elements or a finite,
    /// non-degenerate state).
    pub fn validate_model(&self) -> Result<(), EphemerisError> {
        match &self.model {
            OrbitModel::Elements(elements) => elements.validate().map_err(|source| EphemerisError::Conversion {
                id: self.id.clone(),
                source,
            }),
            OrbitModel::State(state) => {
                if !state.is_finite() {
                    return Err(EphemerisError::InvalidState {
                        id: self.id.clone(),
                        reason: "non-finite components",
                    });
                }
                if state.range_km() <= f64::EPSILON {
                    return Err(EphemerisError::InvalidState {
                        id: self.id.clone(),
                        reason: "zero position radius",
                    });
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EphemerisError {
    #[error("object `{id}` has invalid elements: {source}")]
    Conversion {
        id: String,
        #[source]
        source: ConversionError,
    },
    #[error("object `{id}` has an invalid state: {reason}")]
    InvalidState { id: String, reason: &'static str },
    #[error("failed to propagate `{id}`: {source}")]
    Propagation {
        id: String,
        #[source]
        source: PropagationError,
    },
}

/// Source of object states at requested epochs.
pub trait PropagationModel {
    fn propagate_to_epoch(&self, object: &CatalogObject, epoch: DateTime<Utc>) -> Result<StateVector, EphemerisError>;
}

/// Unperturbed Keplerian motion about a single central body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoBodyEphemeris {
    pub mu_km3_s2: f64,
}

impl TwoBodyEphemeris {
    pub fn new(mu_km3_s2: f64) -> Self {
        Self { mu_km3_s2 }
    }
}

impl PropagationModel for TwoBodyEphemeris {
    fn propagate_to_epoch(&self, object: &CatalogObject, epoch: DateTime<Utc>) -> Result<StateVector, EphemerisError> {
        let dt = seconds_between(object.reference_epoch, epoch);
        trace!(id = %object.id, dt_s = dt, "two-body propagation");
        let propagation = |source| EphemerisError::Propagation {
            id: object.id.clone(),
            source,
        };
        match &object.model {
            OrbitModel::Elements(elements) => {
                let advanced = propagate_elements(elements, dt, self.mu_km3_s2).map_err(propagation)?;
                to_cartesian(&advanced, self.mu_km3_s2).map_err(|source| EphemerisError::Conversion {
                    id: object.id.clone(),
                    source,
                })
            }
            OrbitModel::State(state) => propagate_state(state, dt, self.mu_km3_s2).map_err(propagation),
        }
    }
}
