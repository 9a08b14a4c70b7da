use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use sf_modules::{ModuleError, registry};
use sf_runtime::{BuildError, ControlLoop, LoopConfig, RuntimeError};
use tracing_subscriber::EnvFilter;

mod demos;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Module(#[from] ModuleError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("unknown demo '{0}' (try one of: negate, limits, logic, control)")]
    UnknownDemo(String),
}

pub type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "sf-cli")]
#[command(about = "ScanFlow CLI - scan-cycle control engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List module types and their ports
    Modules,
    /// Run a built-in demo application under the scheduler
    Run {
        /// Demo name (negate, limits, logic, control)
        demo: String,
        /// Loop configuration YAML file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Cycle period in milliseconds
        #[arg(long)]
        period: Option<u64>,
        /// Start-of-scan delay in milliseconds
        #[arg(long)]
        delay: Option<u64>,
        /// Stop after this many scans
        #[arg(long)]
        scans: Option<u64>,
    },
    /// Show the effective settings of a loop configuration file
    Config {
        /// Path to the configuration YAML file
        path: PathBuf,
    },
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Modules => cmd_modules(),
        Commands::Run {
            demo,
            config,
            period,
            delay,
            scans,
        } => cmd_run(&demo, config.as_deref(), period, delay, scans),
        Commands::Config { path } => cmd_config(&path),
    }
}

fn cmd_modules() -> CliResult<()> {
    println!("Module types:");
    for d in registry::descriptors() {
        println!(
            "  {:<11} {} -> {}",
            d.type_name,
            d.inputs.describe(),
            d.outputs.describe()
        );
        println!("  {:<11} {}", "", d.summary);
    }
    println!();
    println!("Demos:");
    for demo in demos::DEMOS {
        println!("  {:<8} {}", demo.name, demo.summary);
    }
    Ok(())
}

fn cmd_run(
    demo: &str,
    config_path: Option<&Path>,
    period: Option<u64>,
    delay: Option<u64>,
    scans: Option<u64>,
) -> CliResult<()> {
    let mut config = match config_path {
        Some(path) => LoopConfig::load(path)?,
        None => LoopConfig::default(),
    };
    if scans.is_some() {
        config.max_scans = scans;
    }

    let demo = demos::find(demo)?;
    let assembly = demo.assemble()?;
    println!(
        "Running demo '{}': {} modules, {} buffer slots",
        demo.name,
        assembly.crates.len(),
        assembly.buffer_size
    );

    let mut control = ControlLoop::new(config);
    if let Some(ms) = period {
        control.set_cycle_period(ms);
    }
    if let Some(ms) = delay {
        control.set_start_scan_delay(ms);
    }
    let report = control.run(assembly.crates, assembly.buffer_size)?;

    println!(
        "✓ {} scans, {} overruns, {} faults",
        report.scans, report.overruns, report.faults
    );
    if report.scans > 0 {
        println!(
            "  scan time: min {:.1} ms, mean {:.1} ms, max {:.1} ms",
            report.durations.min().as_secs_f64() * 1e3,
            report.durations.mean().as_secs_f64() * 1e3,
            report.durations.max().as_secs_f64() * 1e3
        );
    }
    Ok(())
}

fn cmd_config(path: &Path) -> CliResult<()> {
    let config = LoopConfig::load(path)?;
    println!("Configuration: {}", path.display());
    print!("{}", config.to_yaml_string()?);
    println!(
        "effective start delay: {} ms",
        config.effective_start_delay().as_millis()
    );
    println!("dump directory: {}", config.dump_dir().display());
    Ok(())
}
