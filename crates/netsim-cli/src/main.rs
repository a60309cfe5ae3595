//! `netsim`: a small command-line front end over `netsim-core` and `netsim-scenario`. Wires up
//! structured logging (`RUST_LOG`-driven `EnvFilter`) and dispatches to the library crates; none
//! of the algorithmically interesting code lives here.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use netsim_core::traversal::{self, shortest_delay, shortest_hops};
use netsim_core::{Network, NetworkConfig, NodeKind};
use netsim_scenario::{parse_auto, run_scenario, ScenarioRunConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Network-simulation engine CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a scenario document (YAML or JSON) and print the result as JSON.
    Scenario {
        /// Path to the scenario document.
        path: PathBuf,
        /// Seed for the scenario's packet-loss PRNG.
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Build the chain-ping demo topology (S1 from the design notes) and report both a
    /// shortest-hops and a shortest-delay path between its endpoints.
    Demo,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Scenario { path, seed } => run_scenario_file(&path, seed),
        Command::Demo => run_demo(),
    }
}

fn run_scenario_file(path: &PathBuf, seed: u64) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(path)?;
    let doc = parse_auto(&text)?;
    let result = run_scenario(&doc, ScenarioRunConfig::builder().rng_seed(seed).build())?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    if !result.success {
        anyhow::bail!("scenario {:?} failed", result.name);
    }
    Ok(())
}

fn run_demo() -> anyhow::Result<()> {
    let network = Arc::new(Network::new(NetworkConfig::default()));
    network.add_node("A", NodeKind::Host, "10.0.0.1")?;
    network.add_node("B", NodeKind::Router, "10.0.0.2")?;
    network.add_node("C", NodeKind::Host, "10.0.0.3")?;
    network.connect("A", "B")?;
    network.connect("B", "C")?;
    network.set_link_delay("A", "B", 10)?;
    network.set_link_delay("B", "C", 10)?;

    let hops = network.query(|oracle| shortest_hops(oracle, "A", "C"));
    let delay = network.query(|oracle| shortest_delay(oracle, "A", "C"));
    let next_hops = network.query(|oracle| traversal::equal_cost_next_hops(oracle, "A", "C"));

    println!("shortest hops A->C: {hops:?}");
    println!("shortest delay A->C: {delay:?}");
    println!("equal-cost next hops A->C: {next_hops:?}");
    Ok(())
}
