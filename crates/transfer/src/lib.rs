//! Transfer façade crate consolidating catalog planning and exposing supporting crates.

pub mod pipeline;

pub use facade::*;
pub use hop_ephem as ephem;
pub use hop_impulsive as impulsive;

mod facade;
