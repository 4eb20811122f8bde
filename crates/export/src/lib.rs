//! Export helpers for CSV and JSON artifacts.

use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Create a writer for the target path, handling stdout (`-`) by convention.
pub fn writer_for_path(path: &Path) -> io::Result<Box<dyn Write>> {
    if path == Path::new("-") {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    Ok(Box::new(BufWriter::new(file)))
}

/// Quote a free-text CSV field when it contains separators or quotes.
fn text_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

fn optional<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn optional_fixed(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.9}")).unwrap_or_default()
}

pub mod transfers {
    use std::io::{self, Write};

    use super::{optional, optional_fixed, text_field};

    const HEADER: &str = "pair,departure_id,arrival_id,status,failed_stage,cause,iterations,revolutions,branch,lambert_cost_km_s,dv_departure_km_s,dv_arrival_km_s,dv_total_km_s";

    pub fn write_header(writer: &mut dyn Write) -> io::Result<()> {
        writeln!(writer, "{}", HEADER)
    }

    /// One attempted catalog pair. Fields that a failed pair never reached are left empty.
    #[derive(Debug, Clone)]
    pub struct Record<'a> {
        pub pair: usize,
        pub departure_id: &'a str,
        pub arrival_id: &'a str,
        pub success: bool,
        pub failed_stage: Option<&'a str>,
        pub cause: Option<&'a str>,
        pub iterations: Option<usize>,
        pub revolutions: Option<u32>,
        pub branch: Option<&'a str>,
        pub lambert_cost_km_s: Option<f64>,
        pub dv_departure_km_s: Option<f64>,
        pub dv_arrival_km_s: Option<f64>,
        pub dv_total_km_s: Option<f64>,
    }

    impl<'a> Record<'a> {
        /// Serialize the record to CSV, matching the header ordering.
        pub fn write_to(&self, writer: &mut dyn Write) -> io::Result<()> {
            writeln!(
                writer,
                "{},{},{},{},{},{},{},{},{},{},{},{},{}",
                self.pair,
                text_field(self.departure_id),
                text_field(self.arrival_id),
                if self.success { "success" } else { "failed" },
                self.failed_stage.unwrap_or_default(),
                text_field(self.cause.unwrap_or_default()),
                optional(self.iterations),
                optional(self.revolutions),
                self.branch.unwrap_or_default(),
                optional_fixed(self.lambert_cost_km_s),
                optional_fixed(self.dv_departure_km_s),
                optional_fixed(self.dv_arrival_km_s),
                optional_fixed(self.dv_total_km_s),
            )
        }
    }
}

/// Dumps of sampled element sets and their Cartesian states.
pub mod samples {
    use std::io::{self, Write};

    const ELEMENTS_HEADER: &str = "semi_major_axis_km,eccentricity,inclination_deg,raan_deg,aop_deg,ea_deg";
    const CARTESIAN_HEADER: &str = "x_km,y_km,z_km,range_km,vx_km_s,vy_km_s,vz_km_s,speed_km_s";

    pub fn write_elements_header(writer: &mut dyn Write) -> io::Result<()> {
        writeln!(writer, "{}", ELEMENTS_HEADER)
    }

    pub fn write_cartesian_header(writer: &mut dyn Write) -> io::Result<()> {
        writeln!(writer, "{}", CARTESIAN_HEADER)
    }

    /// Element set in report units (km, degrees).
    #[derive(Debug, Clone, Copy)]
    pub struct ElementsRow {
        pub semi_major_axis_km: f64,
        pub eccentricity: f64,
        pub inclination_deg: f64,
        pub raan_deg: f64,
        pub aop_deg: f64,
        pub ea_deg: f64,
    }

    impl ElementsRow {
        pub fn write_to(&self, writer: &mut dyn Write) -> io::Result<()> {
            writeln!(
                writer,
                "{:.6},{:.9},{:.6},{:.6},{:.6},{:.6}",
                self.semi_major_axis_km,
                self.eccentricity,
                self.inclination_deg,
                self.raan_deg,
                self.aop_deg,
                self.ea_deg,
            )
        }
    }

    #[derive(Debug, Clone, Copy)]
    pub struct CartesianRow {
        pub position_km: [f64; 3],
        pub velocity_km_s: [f64; 3],
    }

    impl CartesianRow {
        /// Writes the components followed by range and speed.
        pub fn write_to(&self, writer: &mut dyn Write) -> io::Result<()> {
            let [x, y, z] = self.position_km;
            let [vx, vy, vz] = self.velocity_km_s;
            let range = (x * x + y * y + z * z).sqrt();
            let speed = (vx * vx + vy * vy + vz * vz).sqrt();
            writeln!(
                writer,
                "{:.6},{:.6},{:.6},{:.6},{:.9},{:.9},{:.9},{:.9}",
                x, y, z, range, vx, vy, vz, speed
            )
        }
    }
}

/// JSON sidecar summarising a scan.
pub mod summary {
    use std::collections::BTreeMap;
    use std::fs::{self, File};
    use std::io;
    use std::path::Path;

    use serde::Serialize;
    use serde_json::to_writer_pretty;

    #[derive(Debug, Clone, Serialize)]
    pub struct Settings<'a> {
        pub departure_epoch: &'a str,
        pub time_of_flight_s: f64,
        pub mu_km3_s2: f64,
        pub body_radius_km: f64,
        pub min_revolutions: u32,
        pub max_revolutions: u32,
        pub pairing: &'a str,
        pub solver: &'a str,
        pub abs_tol_km: f64,
        pub rel_tol: f64,
        pub max_iterations: usize,
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct ScanSummary<'a> {
        pub objects: usize,
        pub pairs_attempted: usize,
        pub succeeded: usize,
        pub failed: usize,
        pub failures_by_stage: BTreeMap<&'a str, usize>,
        /// Cheapest refined transfer, when any pair succeeded.
        pub best_total_dv_km_s: Option<f64>,
        pub mean_iterations: Option<f64>,
        pub settings: Settings<'a>,
    }

    pub fn write_summary(path: &Path, summary: &ScanSummary<'_>) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        to_writer_pretty(File::create(path)?, summary)?;
        Ok(())
    }
}
