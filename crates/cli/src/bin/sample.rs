use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use orbit_hop::config::{self as hop_config, CentralBodyConfig, SamplingConfig};
use orbit_hop::export::{self, samples};
use orbit_hop::orbits::to_cartesian;
use orbit_hop::sampling::{self, filter_physical};
use orbit_hop::transfer::{report, settings};

#[path = "common/logging.rs"]
mod logging;

/// Draw random element sets, drop those with an unphysical perigee, and dump the rest.
#[derive(Parser, Debug)]
#[command(author, version, about = "Seeded Keplerian element sampler with perigee filter")]
struct Cli {
    /// Scan manifest supplying the central body and `sampling` section
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of element sets to draw
    #[arg(long)]
    count: Option<usize>,

    /// Generator seed
    #[arg(long)]
    seed: Option<u64>,

    /// Perigee altitude ceiling in km
    #[arg(long)]
    max_perigee_altitude: Option<f64>,

    /// Elements CSV destination (km, degrees)
    #[arg(long)]
    elements: Option<PathBuf>,

    /// Cartesian CSV destination (km, km/s)
    #[arg(long)]
    cartesian: Option<PathBuf>,

    #[arg(long, short)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let (body, mut sampling_config) = match &cli.config {
        Some(path) => {
            let config = hop_config::load_scan_config(path)
                .with_context(|| format!("failed to load manifest {}", path.display()))?;
            (config.central_body, config.sampling.unwrap_or_default())
        }
        None => (CentralBodyConfig::default(), SamplingConfig::default()),
    };
    if let Some(count) = cli.count {
        sampling_config.count = count;
    }
    if let Some(seed) = cli.seed {
        sampling_config.seed = seed;
    }
    if let Some(altitude) = cli.max_perigee_altitude {
        sampling_config.max_perigee_altitude_km = altitude;
    }

    let ranges = settings::element_ranges(&sampling_config, body.radius_km);
    let sets = sampling::sample(&ranges, sampling_config.count, sampling_config.seed)?;
    let filtered = filter_physical(&sets, body.radius_km, sampling_config.max_perigee_altitude_km);

    println!("=== Element Sampling ===");
    println!("Seed            : {}", sampling_config.seed);
    println!("Drawn           : {}", sets.len());
    println!("Below surface   : {}", filtered.below_surface);
    println!("Above ceiling   : {}", filtered.above_ceiling);
    if filtered.non_finite > 0 {
        println!("Non-finite      : {}", filtered.non_finite);
    }
    println!("Retained        : {}", filtered.retained.len());

    if let Some(path) = &cli.elements {
        let mut writer = export::writer_for_path(path)?;
        samples::write_elements_header(writer.as_mut())?;
        for set in &filtered.retained {
            report::elements_row(set).write_to(writer.as_mut())?;
        }
        writer.flush()?;
    }

    if let Some(path) = &cli.cartesian {
        let mut writer = export::writer_for_path(path)?;
        samples::write_cartesian_header(writer.as_mut())?;
        for set in &filtered.retained {
            let state = to_cartesian(set, body.mu_km3_s2)?;
            report::cartesian_row(&state).write_to(writer.as_mut())?;
        }
        writer.flush()?;
    }

    Ok(())
}
