mod error;
mod sweep_file;

use clap::{Parser, Subcommand};
use error::CliResult;
use std::path::{Path, PathBuf};
use sweep_file::SweepFile;
use tm_maps::{
    AnalyticMap, AnalyticParams, AnyMap, Interpolation, PerformanceMap, ReferenceState,
    TabulatedMap, load_map_file, save_map_file,
};
use tm_sweep::{SweepOutcome, solve_sweep};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tm-cli")]
#[command(about = "Turbomap CLI - performance map evaluation and speed sweeps", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a speed sweep defined in a YAML file
    Sweep {
        /// Path to the sweep YAML file
        config_path: PathBuf,
        /// Output file (.csv or .json); CSV on stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Evaluate a stored map at one point
    Eval {
        /// Path to the map TOML file
        map_path: PathBuf,
        /// Group path inside the file (e.g. maps.hpc)
        group: String,
        /// Corrected speed
        speed: f64,
        /// Corrected flow (compressor) or pressure ratio (turbine)
        axis_value: f64,
    },
    /// Summarize a stored map
    Inspect {
        /// Path to the map TOML file
        map_path: PathBuf,
        /// Group path inside the file
        group: String,
    },
    /// Store the default analytic compressor map, optionally tabulated
    NewMap {
        /// Path to the map TOML file (merged when it exists)
        map_path: PathBuf,
        /// Group path to write
        group: String,
        /// Sample onto a SPEEDSxFLOWS table instead of storing the closed form
        #[arg(long, num_args = 2, value_names = ["SPEEDS", "FLOWS"])]
        tabulate: Option<Vec<usize>>,
        /// Table interpolation (bilinear or bicubic)
        #[arg(long, default_value = "bicubic")]
        interpolation: String,
    },
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sweep {
            config_path,
            output,
        } => cmd_sweep(&config_path, output.as_deref()),
        Commands::Eval {
            map_path,
            group,
            speed,
            axis_value,
        } => cmd_eval(&map_path, &group, speed, axis_value),
        Commands::Inspect { map_path, group } => cmd_inspect(&map_path, &group),
        Commands::NewMap {
            map_path,
            group,
            tabulate,
            interpolation,
        } => cmd_new_map(&map_path, &group, tabulate.as_deref(), &interpolation),
    }
}

fn cmd_sweep(config_path: &Path, output: Option<&Path>) -> CliResult<()> {
    let file = SweepFile::load(config_path)?;
    let map = load_map_file(&file.map.path, &file.map.group)?;
    let eos = file.fluid.build()?;
    info!(
        map = %file.map.path.display(),
        group = %file.map.group,
        fluid = eos.name(),
        "running sweep"
    );

    let outcome = solve_sweep(&map, eos.as_ref(), &file.sweep)?;
    match output {
        Some(path) => {
            outcome.write_to(path)?;
            eprintln!("✓ Sweep written to {}", path.display());
            print_summary(&outcome);
        }
        None => print!("{}", outcome.to_csv()),
    }
    Ok(())
}

fn print_summary(outcome: &SweepOutcome) {
    let rows = outcome.rows();
    let backed_off = rows.iter().filter(|r| r.used_backoff).count();
    eprintln!("  Rows: {}", rows.len());
    eprintln!("  Converged: {}", outcome.converged_count());
    eprintln!("  Backed off: {}", backed_off);
    if let SweepOutcome::AllBranches {
        branch_ids, events, ..
    } = outcome
    {
        eprintln!("  Branches: {}", branch_ids.len());
        eprintln!("  Events: {}", events.len());
    }
}

fn cmd_eval(map_path: &Path, group: &str, speed: f64, axis_value: f64) -> CliResult<()> {
    let map = load_map_file(map_path, group)?;
    let out = map.evaluate(speed, axis_value)?;
    println!("kind: {}", map.kind());
    println!("{}: {}", map.kind().primary_output(), out.value);
    println!("efficiency: {}", out.efficiency);
    Ok(())
}

fn cmd_inspect(map_path: &Path, group: &str) -> CliResult<()> {
    let map = load_map_file(map_path, group)?;
    let reference = map.reference();
    let (s_lo, s_hi) = map.speed_range();

    println!("Map {} in {}", group, map_path.display());
    println!("  kind: {}", map.kind());
    println!(
        "  reference: {} K, {} Pa",
        reference.temperature().value,
        reference.pressure().value
    );
    println!("  corrected speed: [{}, {}]", s_lo, s_hi);
    for speed in [s_lo, 0.5 * (s_lo + s_hi), s_hi] {
        let (lo, hi) = map.axis_range(speed);
        println!("    at {:.1}: axis [{:.4}, {:.4}]", speed, lo, hi);
    }
    match &map {
        AnyMap::Table(table) => {
            let primary = table.primary_table();
            println!(
                "  table: {} x {} {}",
                primary.xgrid().len(),
                primary.ygrid().len(),
                primary.interpolation()
            );
        }
        AnyMap::Analytic(analytic) => {
            let p = analytic.params();
            println!("  analytic: design PR {}, peak efficiency {}", p.pr_design, p.eta_peak);
        }
    }
    Ok(())
}

fn cmd_new_map(
    map_path: &Path,
    group: &str,
    tabulate: Option<&[usize]>,
    interpolation: &str,
) -> CliResult<()> {
    let analytic = AnalyticMap::new(ReferenceState::standard(), AnalyticParams::default())?;
    let map: AnyMap = match tabulate {
        Some(&[n_speed, n_flow]) => {
            let interpolation: Interpolation = interpolation.parse()?;
            TabulatedMap::sample(&analytic, interpolation, n_speed, n_flow)?.into()
        }
        _ => analytic.into(),
    };
    save_map_file(map_path, group, &map)?;
    println!("✓ {} map written to {} [{}]", map.kind(), map_path.display(), group);
    Ok(())
}
