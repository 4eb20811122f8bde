//! Configuration models and loaders for catalog scans.

use std::fs::File;
use std::path::{Path, PathBuf};

use hop_core::constants::{EARTH_RADIUS_KM, MU_EARTH_KM3_S2};
use hop_core::time::{DateTime, TimeError, Utc, parse_epoch};
use serde::Deserialize;
use thiserror::Error;

/// Central body used for propagation, Lambert arcs, and the surface check.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CentralBodyConfig {
    #[serde(default = "default_mu")]
    pub mu_km3_s2: f64,
    #[serde(default = "default_radius")]
    pub radius_km: f64,
}

impl Default for CentralBodyConfig {
    fn default() -> Self {
        Self {
            mu_km3_s2: MU_EARTH_KM3_S2,
            radius_km: EARTH_RADIUS_KM,
        }
    }
}

fn default_mu() -> f64 {
    MU_EARTH_KM3_S2
}

fn default_radius() -> f64 {
    EARTH_RADIUS_KM
}

/// Which catalog pairs a scan attempts.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PairingConfig {
    #[default]
    Consecutive,
    All,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SolverConfig {
    #[default]
    Izzo,
    Bate,
}

/// Differential corrector tolerances.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct RefinementConfig {
    #[serde(default = "default_abs_tol")]
    pub abs_tol_km: f64,
    #[serde(default = "default_rel_tol")]
    pub rel_tol: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            abs_tol_km: default_abs_tol(),
            rel_tol: default_rel_tol(),
            max_iterations: default_max_iterations(),
        }
    }
}

fn default_abs_tol() -> f64 {
    1e-6
}

fn default_rel_tol() -> f64 {
    1e-9
}

fn default_max_iterations() -> usize {
    50
}

/// Interval bounds in configuration units (km, degrees).
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct RangeConfig {
    pub min: f64,
    pub max: f64,
}

/// Element ranges for synthetic catalogs; omitted ranges use the low-Earth defaults.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct SamplingRangesConfig {
    pub semi_major_axis_km: Option<RangeConfig>,
    pub eccentricity: Option<RangeConfig>,
    pub inclination_deg: Option<RangeConfig>,
    pub raan_deg: Option<RangeConfig>,
    pub aop_deg: Option<RangeConfig>,
    pub ea_deg: Option<RangeConfig>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct SamplingConfig {
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_count")]
    pub count: usize,
    #[serde(default = "default_max_perigee_altitude")]
    pub max_perigee_altitude_km: f64,
    #[serde(default)]
    pub ranges: SamplingRangesConfig,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            count: default_count(),
            max_perigee_altitude_km: default_max_perigee_altitude(),
            ranges: SamplingRangesConfig::default(),
        }
    }
}

fn default_seed() -> u64 {
    100
}

fn default_count() -> usize {
    100
}

fn default_max_perigee_altitude() -> f64 {
    2_000.0
}

/// Top-level scan manifest.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ScanConfig {
    #[serde(default)]
    pub central_body: CentralBodyConfig,
    pub departure_epoch: String,
    pub time_of_flight_s: f64,
    #[serde(default)]
    pub min_revolutions: u32,
    #[serde(default)]
    pub max_revolutions: u32,
    #[serde(default)]
    pub pairing: PairingConfig,
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub refinement: RefinementConfig,
    /// Catalog location, relative to the manifest when not absolute.
    #[serde(default)]
    pub catalog: Option<PathBuf>,
    #[serde(default)]
    pub sampling: Option<SamplingConfig>,
}

impl ScanConfig {
    pub fn departure_epoch(&self) -> Result<DateTime<Utc>, ConfigError> {
        Ok(parse_epoch(&self.departure_epoch)?)
    }

    /// Resolve the catalog path against the directory holding the manifest.
    pub fn catalog_path(&self, manifest: &Path) -> Option<PathBuf> {
        let catalog = self.catalog.as_ref()?;
        if catalog.is_absolute() {
            return Some(catalog.clone());
        }
        let base = manifest.parent().unwrap_or_else(|| Path::new(""));
        Some(base.join(catalog))
    }
}

/// Orbit description of a catalog entry.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(tag = "type")]
pub enum OrbitConfig {
    #[serde(rename = "elements")]
    Elements {
        a_km: f64,
        e: f64,
        i_deg: f64,
        raan_deg: f64,
        aop_deg: f64,
        ea_deg: f64,
    },
    #[serde(rename = "state")]
    State {
        position_km: [f64; 3],
        velocity_km_s: [f64; 3],
    },
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CatalogEntryConfig {
    pub id: String,
    pub epoch: String,
    pub orbit: OrbitConfig,
}

impl CatalogEntryConfig {
    pub fn epoch(&self) -> Result<DateTime<Utc>, ConfigError> {
        Ok(parse_epoch(&self.epoch)?)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    objects: Vec<CatalogEntryConfig>,
}

/// Errors that can occur while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Epoch(#[from] TimeError),
}

fn is_toml(path: &Path) -> bool {
    path.extension().map(|ext| ext == "toml").unwrap_or(false)
}

/// Load a scan manifest from a TOML or YAML file.
pub fn load_scan_config<P: AsRef<Path>>(path: P) -> Result<ScanConfig, ConfigError> {
    let path = path.as_ref();
    if is_toml(path) {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    } else {
        let reader = File::open(path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }
}

/// Load catalog entries.
///
/// Accepts a YAML list, a TOML file with an `[[objects]]` array, or a
/// directory holding one TOML entry per file (read in file-name order).
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Vec<CatalogEntryConfig>, ConfigError> {
    let path = path.as_ref();
    if path.is_dir() {
        read_dir_records(path)
    } else if is_toml(path) {
        let contents = std::fs::read_to_string(path)?;
        let document: CatalogDocument = toml::from_str(&contents)?;
        Ok(document.objects)
    } else {
        let reader = File::open(path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }
}

fn read_dir_records<T>(dir: &Path) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
{
    let mut records = Vec::new();
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_toml(path))
        .collect();
    entries.sort();
    for path in entries {
        let contents = std::fs::read_to_string(&path)?;
        let record: T = toml::from_str(&contents)?;
        records.push(record);
    }
    Ok(records)
}
