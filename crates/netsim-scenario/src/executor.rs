//! The scenario executor: builds a fresh network from a document's setup section, runs its
//! steps in order, then runs its validations — recording every failure rather than aborting, so
//! the result document is always complete.

use std::sync::Arc;

use netsim_core::{GraphError, Network, NetworkConfig, NodeKind, Packet, Simulator, SimulatorConfig};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::document::{NodeConfigPatch, Scenario, Setup, Step, Validation};
use crate::error::ScenarioError;
use crate::validators;

/// Engine-wide knobs for a single scenario run.
#[derive(Debug, Clone, TypedBuilder)]
pub struct ScenarioRunConfig {
    /// Seed for the network's packet-loss PRNG, so `send` step delivery rates are reproducible.
    #[builder(default = 0)]
    pub rng_seed: u64,
}

impl Default for ScenarioRunConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// The outcome of a single step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub name: String,
    pub action: String,
    pub passed: bool,
    pub message: String,
}

/// The outcome of a single validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub kind: String,
    pub passed: bool,
    pub message: String,
    pub details: serde_json::Value,
}

/// The complete outcome of running a scenario: successful iff every step and every validation
/// passed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub success: bool,
    pub steps: Vec<StepResult>,
    pub validations: Vec<ValidationResult>,
}

/// Builds the network described by `doc.setup`, runs `doc.steps` in order, then runs
/// `doc.validation`. Returns `Err` only if the setup section itself is malformed (references an
/// edge before it exists, etc) — failures within steps/validations are captured in the result,
/// not propagated.
#[tracing::instrument(skip(doc), fields(scenario = %doc.name))]
pub fn run_scenario(doc: &Scenario, config: ScenarioRunConfig) -> Result<ScenarioResult, ScenarioError> {
    let network = Arc::new(Network::new(
        NetworkConfig::builder().rng_seed(config.rng_seed).build(),
    ));
    let sim = Simulator::new(Arc::clone(&network), SimulatorConfig::default());

    setup_network(&network, &doc.setup)?;

    let steps = doc
        .steps
        .iter()
        .map(|step| execute_step(&network, &sim, step))
        .collect::<Vec<_>>();

    let validations = doc
        .validation
        .iter()
        .map(|v| validators::evaluate(&network, v))
        .collect::<Vec<_>>();

    let success = steps.iter().all(|s| s.passed) && validations.iter().all(|v| v.passed);
    tracing::info!(success, steps = steps.len(), validations = validations.len(), "scenario finished");
    Ok(ScenarioResult {
        name: doc.name.clone(),
        success,
        steps,
        validations,
    })
}

fn setup_network(network: &Network, setup: &Setup) -> Result<(), ScenarioError> {
    for n in &setup.nodes {
        network.add_node(&n.name, parse_node_kind(&n.kind), &n.ip)?;
        if let Some(vlan) = n.vlan {
            network.assign_vlan(&n.name, Some(vlan))?;
        }
        if let Some(cfg) = &n.config {
            apply_config_patch(network, &n.name, cfg)?;
        }
    }
    for l in &setup.links {
        network.connect(&l.from, &l.to)?;
        if let Some(delay) = l.delay_ms {
            network.set_link_delay(&l.from, &l.to, delay as i64)?;
        }
        if let Some(bw) = l.bandwidth_mbps {
            network.set_bandwidth(&l.from, &l.to, bw as i64)?;
        }
        if let Some(loss) = l.packet_loss {
            network.set_packet_loss(&l.from, &l.to, loss)?;
        }
    }
    Ok(())
}

fn parse_node_kind(s: &str) -> NodeKind {
    match s {
        "host" => NodeKind::Host,
        "router" => NodeKind::Router,
        "iot" => NodeKind::Iot,
        "cloud" => NodeKind::Cloud,
        _ => NodeKind::Generic,
    }
}

fn apply_config_patch(network: &Network, name: &str, cfg: &NodeConfigPatch) -> Result<(), GraphError> {
    if let Some(mtu) = cfg.mtu {
        network.set_mtu(name, mtu)?;
    }
    if let Some(queue_size) = cfg.queue_size {
        network.set_max_queue_size(name, queue_size)?;
    }
    if let Some(vlan) = cfg.vlan {
        network.assign_vlan(name, Some(vlan))?;
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct PingParams {
    from: String,
    to: String,
}

#[derive(Debug, Default, Deserialize)]
struct PingExpect {
    #[serde(default = "default_true")]
    success: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct SendParams {
    from: String,
    to: String,
    #[serde(default = "default_count")]
    count: u32,
    #[serde(default)]
    size_bytes: usize,
}

fn default_count() -> u32 {
    1
}

#[derive(Debug, Default, Deserialize)]
struct SendExpect {
    #[serde(default)]
    min_delivery_rate: f64,
}

#[derive(Debug, Deserialize)]
struct ConfigureParams {
    node: String,
    #[serde(default)]
    config: NodeConfigPatch,
}

#[derive(Debug, Deserialize)]
struct WaitParams {
    duration_ms: u64,
}

#[derive(Debug, Deserialize)]
struct ValidateStepParams {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default = "serde_json::Value::default")]
    expectations: serde_json::Value,
}

/// Wraps a step/validation param-decode failure in [`ScenarioError::MalformedParams`] before it's
/// flattened to a plain message — keeps `StepResult.message` a `String` while still constructing
/// the typed error for callers that log or match on it upstream.
fn decode_error(e: serde_json::Error) -> String {
    ScenarioError::MalformedParams(e.to_string()).to_string()
}

fn execute_step(network: &Network, sim: &Simulator, step: &Step) -> StepResult {
    let outcome = match step.action.as_str() {
        "ping" => run_ping(network, step),
        "send" => run_send(network, step),
        "configure" => run_configure(network, step),
        "wait" => run_wait(sim, step),
        "validate" => run_inline_validate(network, step),
        other => Err(format!("unknown step action: {other}")),
    };
    match outcome {
        Ok(message) => StepResult {
            name: step.name.clone(),
            action: step.action.clone(),
            passed: true,
            message,
        },
        Err(message) => StepResult {
            name: step.name.clone(),
            action: step.action.clone(),
            passed: false,
            message,
        },
    }
}

fn run_ping(network: &Network, step: &Step) -> Result<String, String> {
    let params: PingParams = serde_json::from_value(step.params.clone()).map_err(decode_error)?;
    let expect: PingExpect = if step.expect.is_null() {
        PingExpect::default()
    } else {
        serde_json::from_value(step.expect.clone()).map_err(decode_error)?
    };
    let found = network.query(|oracle| {
        netsim_core::traversal::shortest_hops(oracle, &params.from, &params.to).is_some()
    });
    if found == expect.success {
        Ok(format!("ping {} -> {}: success={found}", params.from, params.to))
    } else {
        Err(format!(
            "ping {} -> {}: success={found}, expected {}",
            params.from, params.to, expect.success
        ))
    }
}

#[tracing::instrument(skip(network, step))]
fn run_send(network: &Network, step: &Step) -> Result<String, String> {
    let params: SendParams = serde_json::from_value(step.params.clone()).map_err(decode_error)?;
    let expect: SendExpect = if step.expect.is_null() {
        SendExpect::default()
    } else {
        serde_json::from_value(step.expect.clone()).map_err(decode_error)?
    };

    let mut delivered = 0u32;
    for _ in 0..params.count {
        network.record_packet_sent(&params.from).map_err(|e| e.to_string())?;
        let lost = network.sample_loss(&params.from, &params.to).map_err(|e| e.to_string())?;
        network.record_link_traffic(&params.from, &params.to).map_err(|e| e.to_string())?;
        network
            .record_directed_traffic(&params.from, &params.to)
            .map_err(|e| e.to_string())?;
        if !lost {
            delivered += 1;
            network.record_packet_received(&params.to).map_err(|e| e.to_string())?;
            let packet = Packet::builder()
                .src(params.from.clone())
                .dst(params.to.clone())
                .payload(vec![0u8; params.size_bytes])
                .build();
            network.enqueue(&params.to, packet).map_err(|e| e.to_string())?;
        }
    }
    let rate = if params.count == 0 { 1.0 } else { delivered as f64 / params.count as f64 };
    if rate >= expect.min_delivery_rate {
        Ok(format!("send {} -> {}: delivery_rate={rate}", params.from, params.to))
    } else {
        Err(format!(
            "send {} -> {}: delivery_rate={rate}, expected >= {}",
            params.from, params.to, expect.min_delivery_rate
        ))
    }
}

fn run_configure(network: &Network, step: &Step) -> Result<String, String> {
    let params: ConfigureParams = serde_json::from_value(step.params.clone()).map_err(decode_error)?;
    apply_config_patch(network, &params.node, &params.config).map_err(|e| e.to_string())?;
    Ok(format!("configured {}", params.node))
}

fn run_wait(sim: &Simulator, step: &Step) -> Result<String, String> {
    let params: WaitParams = serde_json::from_value(step.params.clone()).map_err(decode_error)?;
    sim.advance_time(params.duration_ms).map_err(|e| e.to_string())?;
    Ok(format!("waited {}ms", params.duration_ms))
}

fn run_inline_validate(network: &Network, step: &Step) -> Result<String, String> {
    let params: ValidateStepParams = serde_json::from_value(step.params.clone()).map_err(decode_error)?;
    let threshold = params.expectations.get("threshold").and_then(|v| v.as_f64());
    let validation = Validation {
        kind: params.kind,
        params: params.expectations,
        threshold,
    };
    let result = validators::evaluate(network, &validation);
    if result.passed {
        Ok(result.message)
    } else {
        Err(result.message)
    }
}
