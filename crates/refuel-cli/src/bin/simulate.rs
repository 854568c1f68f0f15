//! Fly a refueling scenario and write the run report.
//!
//! Usage:
//!   cargo run -p refuel-cli --bin simulate -- --config scenarios/jfk_lax.yml --output run.json

use anyhow::Context;
use clap::Parser;
use refuel_cli::{init_tracing, write_json, RunSettings};
use refuel_core::{run_scenario, SimulationConfig};
use std::path::PathBuf;

/// Simulate an airliner refueled in flight by UAVs
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Scenario file (YAML); built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Report file (JSON); stdout when omitted
    #[arg(long)]
    output: Option<PathBuf>,

    /// Simulation time step in seconds
    #[arg(long)]
    time_step_s: Option<f64>,

    /// Largest accepted time step in seconds
    #[arg(long)]
    max_time_step_s: Option<f64>,

    /// Keep a snapshot of every airplane every N steps
    #[arg(long)]
    trace_every: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load scenario {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    let settings =
        RunSettings::from_env().merged(args.time_step_s, args.max_time_step_s, args.trace_every);
    settings.apply(&mut config)?;

    let report = run_scenario(&config, settings.trace_every).context("simulation failed")?;
    for airplane in &report.airplanes {
        tracing::info!(
            "{}: energy {:.2} % -> {:.2} %",
            airplane.plan.id,
            airplane.initial_energy_level_pc,
            airplane.final_energy_level_pc
        );
    }
    tracing::info!(
        "{} dockings delivered {:.0} MJ in {:.0} s of simulated time",
        report.docking_log.len(),
        report.total_delivered_mj(),
        report.simulated_time_s
    );
    write_json(&report, args.output.as_deref())
}
