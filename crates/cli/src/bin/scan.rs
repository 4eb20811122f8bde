use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::{Parser, ValueEnum};
use orbit_hop::config::{self as hop_config, PairingConfig, SolverConfig};
use orbit_hop::export::{self, summary as export_summary};
use orbit_hop::sampling::{self, filter_physical};
use orbit_hop::transfer::{
    CatalogScanner, ShootingCorrector, TwoBodyEphemeris, catalog, report, settings,
};
use tracing::info;

#[path = "common/logging.rs"]
mod logging;

/// Plan minimum-cost two-impulse transfers between catalog objects.
#[derive(Parser, Debug)]
#[command(author, version, about = "Catalog transfer scanner (two-impulse, multi-revolution)")]
struct Cli {
    /// Scan manifest (TOML or YAML)
    #[arg(long)]
    config: PathBuf,

    /// Catalog file or directory (overrides the manifest's catalog entry)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Scan a synthetic catalog built from N sampled element sets instead
    #[arg(long, conflicts_with = "catalog")]
    synthetic: Option<usize>,

    /// Seed for the synthetic catalog (defaults to the manifest's sampling seed)
    #[arg(long, requires = "synthetic")]
    seed: Option<u64>,

    /// Which pairs to attempt
    #[arg(long, value_enum)]
    pairing: Option<PairingArg>,

    /// Lambert solver
    #[arg(long, value_enum)]
    solver: Option<SolverArg>,

    /// Transfers CSV destination ("-" for stdout)
    #[arg(long)]
    output: Option<PathBuf>,

    /// JSON summary sidecar destination
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Log per-stage progress
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Copy, Clone, ValueEnum, Debug)]
enum PairingArg {
    Consecutive,
    All,
}

#[derive(Copy, Clone, ValueEnum, Debug)]
enum SolverArg {
    Izzo,
    Bate,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let mut config = hop_config::load_scan_config(&cli.config)
        .with_context(|| format!("failed to load scan manifest {}", cli.config.display()))?;
    if let Some(pairing) = cli.pairing {
        config.pairing = match pairing {
            PairingArg::Consecutive => PairingConfig::Consecutive,
            PairingArg::All => PairingConfig::All,
        };
    }
    if let Some(solver) = cli.solver {
        config.solver = match solver {
            SolverArg::Izzo => SolverConfig::Izzo,
            SolverArg::Bate => SolverConfig::Bate,
        };
    }

    let scan_settings = settings::scan_settings(&config)?;

    let objects = if let Some(count) = cli.synthetic {
        let mut sampling_config = config.sampling.unwrap_or_default();
        if let Some(seed) = cli.seed {
            sampling_config.seed = seed;
        }
        let ranges = settings::element_ranges(&sampling_config, config.central_body.radius_km);
        let sets = sampling::sample(&ranges, count, sampling_config.seed)?;
        let filtered = filter_physical(
            &sets,
            config.central_body.radius_km,
            sampling_config.max_perigee_altitude_km,
        );
        info!(
            sampled = count,
            retained = filtered.retained.len(),
            seed = sampling_config.seed,
            "synthetic catalog built"
        );
        catalog::synthetic(&filtered.retained, scan_settings.departure_epoch)
    } else {
        let path = cli
            .catalog
            .clone()
            .or_else(|| config.catalog_path(&cli.config))
            .ok_or_else(|| anyhow!("no catalog given: pass --catalog, --synthetic, or set `catalog` in the manifest"))?;
        catalog::load(&path).with_context(|| format!("failed to load catalog {}", path.display()))?
    };

    let ephemeris = TwoBodyEphemeris::new(scan_settings.correction.mu_km3_s2);
    let solver = settings::solver(config.solver);
    let corrector = ShootingCorrector;
    let scanner = CatalogScanner::new(&ephemeris, solver.as_ref(), &corrector);
    let scan_report = scanner.scan(&objects, &scan_settings)?;

    let to_stdout = cli.output.as_deref().is_some_and(|p| p == std::path::Path::new("-"));
    if let Some(output) = &cli.output {
        let mut writer = export::writer_for_path(output)?;
        report::write_transfers(writer.as_mut(), &scan_report)?;
    }

    if let Some(path) = &cli.summary {
        let summary = report::summary(
            &scan_report,
            objects.len(),
            &scan_settings,
            &config.departure_epoch,
            settings::solver_name(config.solver),
        );
        export_summary::write_summary(path, &summary)?;
    }

    if !to_stdout {
        println!("=== Catalog Scan ===");
        println!("Objects         : {}", objects.len());
        println!("Pairs attempted : {}", scan_report.attempted());
        println!("Succeeded       : {}", scan_report.succeeded);
        println!("Failed          : {}", scan_report.failed);
        if let Some(best) = scan_report.best() {
            if let Some(total) = best.total_delta_v_km_s() {
                println!(
                    "Cheapest        : {} -> {} Δv = {:.4} km/s ({} iterations)",
                    best.departure_id, best.arrival_id, total, best.iteration_count
                );
            }
        }
    }

    Ok(())
}
