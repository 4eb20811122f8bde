//! Catalog transfer planning between Earth-orbiting objects.
//!
//! The root crate re-exports the workspace crates so front-ends (the `scan`
//! and `sample` binaries, integration tests) depend on a single library.

pub use hop_config as config;
pub use hop_core as core;
pub use hop_ephem as ephem;
pub use hop_export as export;
pub use hop_impulsive as impulsive;
pub use hop_orbits as orbits;
pub use hop_sampling as sampling;
pub use hop_transfer as transfer;

/// Returns the version of the library for smoke tests.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
