#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that explores scenario maps with a simulated agent.

mod scenario;
mod simulation;
mod terrain;

use std::{fs, path::PathBuf, rc::Rc};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use grid_explorer_core::Classification;
use grid_explorer_system_lifecycle::Explorer;
use grid_explorer_world::{query, Grid};
use tracing_subscriber::EnvFilter;

use crate::{
    scenario::Scenario,
    simulation::{RunSummary, ScenarioSession},
    terrain::RasterOracle,
};

/// Grid exploration driver.
#[derive(Debug, Parser)]
#[command(name = "grid-explorer", version, about = "Explore tile maps with a simulated agent")]
struct Cli {
    /// Format of log lines written to stderr.
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Runs a scenario until exploration finishes or the tick limit is hit.
    Run(RunArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Scenario TOML file.
    scenario: PathBuf,

    /// Overrides the known radius, in cells.
    #[arg(long, allow_negative_numbers = true)]
    known_radius: Option<i32>,

    /// Overrides the seen radius, in cells.
    #[arg(long, allow_negative_numbers = true)]
    seen_radius: Option<i32>,

    /// Overrides the tick limit.
    #[arg(long)]
    max_ticks: Option<u32>,

    /// Overrides the seed of a generated map.
    #[arg(long)]
    seed: Option<u64>,

    /// Prints the summary as JSON instead of text.
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

/// Entry point for the grid explorer command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        CliCommand::Run(args) => run(&args),
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn run(args: &RunArgs) -> Result<()> {
    let text = fs::read_to_string(&args.scenario)
        .with_context(|| format!("failed to read scenario {}", args.scenario.display()))?;
    let mut scenario = Scenario::from_toml(&text)
        .with_context(|| format!("failed to parse scenario {}", args.scenario.display()))?;
    let map = scenario
        .tile_map(args.seed)
        .context("failed to prepare scenario map")?;

    if let Some(max_ticks) = args.max_ticks {
        scenario.simulation.max_ticks = max_ticks;
    }

    let raster = Rc::new(map.raster().context("failed to build scenario raster")?);
    let mut session = ScenarioSession::new(&map, Rc::clone(&raster), &scenario.simulation.area_id);
    let mut explorer = Explorer::new(
        scenario.explorer,
        terrain::is_walkable,
        RasterOracle::new(raster),
    );
    if let Some(radius) = args.known_radius {
        let _ = explorer.set_known_radius(radius);
    }
    if let Some(radius) = args.seen_radius {
        let _ = explorer.set_seen_radius(radius);
    }

    explorer.start();
    let summary = simulation::run(&mut explorer, &mut session, &scenario.simulation);
    if args.json {
        let json =
            serde_json::to_string_pretty(&summary).context("failed to encode run summary")?;
        println!("{json}");
    } else {
        print_summary(&summary);
        if let Some(grid) = explorer.grid() {
            print!("{}", coverage_map(grid));
        }
    }
    explorer.stop();
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let counts = &summary.counts;
    println!("area:         {} ({:08x})", summary.area, summary.area_hash);
    println!(
        "ticks:        {}{}",
        summary.ticks,
        if summary.exhausted {
            ""
        } else {
            " (tick limit reached)"
        }
    );
    println!("travelled:    {}", summary.distance_travelled);
    println!("abandoned:    {}", summary.abandoned_targets);
    println!("position:     {}", summary.final_position);
    println!("completion:   {:.1}%", summary.completion_percentage);
    println!(
        "cells:        {} seen, {} known, {} unknown, {} ignored, {} disconnected",
        counts.seen, counts.known, counts.unknown, counts.ignored, counts.disconnected
    );
}

/// Renders the final classification of every cell, one text row per grid row.
fn coverage_map(grid: &Grid) -> String {
    let (columns, _) = query::dimensions(grid);
    let mut text = String::new();
    for cell in query::cells(grid) {
        text.push(match cell.classification() {
            Classification::Unknown => '?',
            Classification::Known => 'k',
            Classification::Seen => '.',
            Classification::Ignored => 'x',
            Classification::Disconnected => '#',
        });
        if cell.index().column() + 1 == columns {
            text.push('\n');
        }
    }
    text
}
