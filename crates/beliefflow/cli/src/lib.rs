//! beliefflow CLI - Command-line interface for the belief-tracking engine
//!
//! This CLI lets level authors and instructors:
//! - Generate and inspect hypothesis spaces from JSON specs or scripts
//! - Run a JSON token-flow network and read off the posterior
//! - Watch the built-in shuffler-with-retention demo

use anyhow::Context;
use beliefflow_hypothesis::{generate, generate_from_script, HypothesisSpace, HypothesisSpec};
use beliefflow_simulation::{NetworkDefinition, Simulation, SimulationConfig, StationKind};
use beliefflow_types::{Hypothesis, HypothesisPosterior, SlotId, SlotMarginal};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tabled::Tabled;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod output;
pub mod scenarios;

use output::{heading, print_json, print_output, probability_bar, OutputFormat};

/// beliefflow CLI application
#[derive(Parser)]
#[command(name = "beliefflow")]
#[command(about = "beliefflow - exact Bayesian belief tracking over token flows", long_about = None)]
#[command(version)]
struct Cli {
    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    output: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Generate a hypothesis space from a JSON spec or script
    Hypotheses {
        /// Spec file (`.json`) or script (`.bfs`)
        file: PathBuf,
        /// Treat the file as a script regardless of extension
        #[arg(long)]
        script: bool,
    },

    /// Run a JSON network against a hypothesis space
    Run {
        /// Network definition (JSON)
        #[arg(long)]
        network: PathBuf,
        /// Hypothesis spec (`.json`) or script (`.bfs`)
        #[arg(long)]
        hypotheses: PathBuf,
        /// Ticks to run; runs until idle when omitted
        #[arg(long)]
        ticks: Option<u64>,
        /// RNG seed for display colors
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Run the built-in shuffler-with-retention scenario
    Demo {
        /// Ticks to run; runs until idle when omitted
        #[arg(long)]
        ticks: Option<u64>,
        /// RNG seed for display colors
        #[arg(long)]
        seed: Option<u64>,
    },
}

/// Run using the current process arguments.
pub fn run() -> anyhow::Result<()> {
    run_with_args(std::env::args_os())
}

/// Run using the provided argument iterator.
pub fn run_with_args<I, T>(args: I) -> anyhow::Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    match cli.command {
        Commands::Hypotheses { file, script } => show_hypotheses(&file, script, cli.output),
        Commands::Run {
            network,
            hypotheses,
            ticks,
            seed,
        } => {
            let space = load_space(&hypotheses, false)?;
            let json = std::fs::read_to_string(&network)
                .with_context(|| format!("reading network {}", network.display()))?;
            let network = NetworkDefinition::from_json(&json)
                .with_context(|| format!("parsing network {}", network.display()))?;
            let config = SimulationConfig::default().with_seed(seed.unwrap_or(0));
            simulate(network, &space, config, ticks, cli.output)
        }
        Commands::Demo { ticks, seed } => {
            let space = scenarios::demo_space().context("building demo hypotheses")?;
            let mut config = SimulationConfig::demo();
            if let Some(seed) = seed {
                config = config.with_seed(seed);
            }
            simulate(scenarios::demo_network(), &space, config, ticks, cli.output)
        }
    }
}

/// Read a spec or script; scripts are recognized by `--script` or `.bfs`
fn load_space(path: &Path, script: bool) -> anyhow::Result<HypothesisSpace> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("reading hypotheses {}", path.display()))?;
    let is_script = script || path.extension().is_some_and(|ext| ext == "bfs");
    tracing::debug!(path = %path.display(), script = is_script, "Loading hypotheses");

    let space = if is_script {
        generate_from_script(&source)
    } else {
        HypothesisSpec::from_json(&source).and_then(|spec| generate(&spec))
    };
    space.with_context(|| format!("generating hypotheses from {}", path.display()))
}

fn show_hypotheses(path: &Path, script: bool, format: OutputFormat) -> anyhow::Result<()> {
    let space = load_space(path, script)?;

    match format {
        OutputFormat::Json => print_json(&space)?,
        OutputFormat::Table => {
            heading(&format!("Hypothesis Space ({} worlds)", space.len()));
            println!("  Prior: {:.6} each", space.prior());
            if !space.schedule().is_empty() {
                let schedule: Vec<&str> = space.schedule().iter().map(SlotId::as_str).collect();
                println!("  Schedule: {}", schedule.join(" → "));
            }
            println!();
            let rows: Vec<HypothesisRow> = space.hypotheses().iter().map(HypothesisRow::from).collect();
            print_output(rows, format)?;
        }
    }
    Ok(())
}

/// Table row for hypothesis display
#[derive(Debug, Serialize, Tabled)]
struct HypothesisRow {
    id: String,
    label: String,
    /// One `slot: distribution` pair per line
    slots: String,
}

impl From<&Hypothesis> for HypothesisRow {
    fn from(h: &Hypothesis) -> Self {
        let slots: Vec<String> = h
            .slots
            .iter()
            .map(|(slot, dist)| format!("{}: {}", slot, dist))
            .collect();
        Self {
            id: h.id.to_string(),
            label: h.label.clone(),
            slots: slots.join("\n"),
        }
    }
}

// ── Simulation Report ────────────────────────────────────────────────

#[derive(Serialize)]
struct SlotReport {
    slot: SlotId,
    marginals: Vec<SlotMarginal>,
}

#[derive(Clone, Serialize, Tabled)]
struct SinkReport {
    station: String,
    arrivals: usize,
}

#[derive(Serialize)]
struct RunReport {
    network: String,
    ticks: u64,
    posterior: Vec<HypothesisPosterior>,
    slots: Vec<SlotReport>,
    sinks: Vec<SinkReport>,
    anomalies: u64,
}

/// Table row for posterior display
#[derive(Debug, Serialize, Tabled)]
struct PosteriorRow {
    id: String,
    probability: String,
    label: String,
}

impl From<&HypothesisPosterior> for PosteriorRow {
    fn from(p: &HypothesisPosterior) -> Self {
        Self {
            id: p.id.to_string(),
            probability: probability_bar(p.probability),
            label: p.label.clone(),
        }
    }
}

/// Table row for one distinct distribution of a slot
#[derive(Debug, Serialize, Tabled)]
struct MarginalRow {
    probability: String,
    distribution: String,
    hypotheses: usize,
}

impl From<&SlotMarginal> for MarginalRow {
    fn from(m: &SlotMarginal) -> Self {
        Self {
            probability: probability_bar(m.probability),
            distribution: m.distribution.to_string(),
            hypotheses: m.hypotheses.len(),
        }
    }
}

fn simulate(
    network: NetworkDefinition,
    space: &HypothesisSpace,
    config: SimulationConfig,
    ticks: Option<u64>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let mut sim = Simulation::new(network, space, config).context("building simulation")?;
    if !space.schedule().is_empty() {
        sim.queue_schedule(space.schedule().iter().cloned())
            .context("queueing scripted schedule")?;
    }

    match ticks {
        Some(n) => sim.run(n).context("running simulation")?,
        None => {
            sim.run_until_idle().context("running simulation to idle")?;
        }
    }

    let network = sim.network();
    let report = RunReport {
        network: network.name.clone(),
        ticks: sim.clock(),
        posterior: sim.posterior(),
        slots: network
            .source_slots()
            .into_iter()
            .map(|slot| SlotReport {
                marginals: sim.slot_posterior(&slot),
                slot,
            })
            .collect(),
        sinks: network
            .stations
            .iter()
            .filter(|s| matches!(s.kind, StationKind::Sink))
            .map(|s| SinkReport {
                station: s.id.to_string(),
                arrivals: sim.sink_arrivals(&s.id).map(|a| a.len()).unwrap_or(0),
            })
            .collect(),
        anomalies: sim.tracker().anomaly_count(),
    };

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => print_report(&report)?,
    }
    Ok(())
}

fn print_report(report: &RunReport) -> anyhow::Result<()> {
    let format = OutputFormat::Table;
    heading(&format!("{} after {} ticks", report.network, report.ticks));
    println!();
    println!("{}", "Posterior".bold());
    print_output(report.posterior.iter().map(PosteriorRow::from).collect(), format)?;

    for slot in &report.slots {
        println!();
        println!("{} {}", "Slot".bold(), slot.slot.as_str().bold());
        print_output(slot.marginals.iter().map(MarginalRow::from).collect(), format)?;
    }

    println!();
    println!("{}", "Sinks".bold());
    print_output(report.sinks.clone(), format)?;
    if report.anomalies > 0 {
        println!(
            "{}: {} observations contradicted every hypothesis",
            "Warning".bold().red(),
            report.anomalies
        );
    }
    Ok(())
}
