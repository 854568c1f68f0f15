//! Generate the waypoint paths of a scenario without simulating it.

use anyhow::Context;
use clap::Parser;
use refuel_cli::{init_tracing, write_json};
use refuel_core::{Fleet, PlanReport, SimulationConfig};
use std::path::PathBuf;

/// Write planned paths and tagged waypoint times of a refueling scenario
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Scenario file (YAML); built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output file (JSON); stdout when omitted
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SimulationConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load scenario {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    let fleet = Fleet::build(&config).context("path generation failed")?;
    let plan = PlanReport::new(fleet.plan()?);
    write_json(&plan, args.output.as_deref())
}
