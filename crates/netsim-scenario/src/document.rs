//! The scenario document model. A scenario is accepted as YAML or JSON text; both wire forms
//! deserialize through this single `serde`-derived model, so there is exactly one in-memory
//! representation regardless of which form the caller supplied — no separate hand-rolled
//! YAML/JSON parsers to keep in sync.

use serde::{Deserialize, Serialize};

/// A full scenario document: metadata, setup, an ordered step list, and an unordered validation
/// list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub setup: Setup,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub validation: Vec<Validation>,
    #[serde(default)]
    pub expected_outcome: Option<String>,
}

/// The setup section: the network is built from scratch from this before any step runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Setup {
    #[serde(default)]
    pub nodes: Vec<SetupNode>,
    #[serde(default)]
    pub links: Vec<SetupLink>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupNode {
    pub name: String,
    #[serde(rename = "type", default = "default_node_type")]
    pub kind: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub vlan: Option<i64>,
    #[serde(default)]
    pub config: Option<NodeConfigPatch>,
}

fn default_node_type() -> String {
    "generic".to_string()
}

/// The subset of a node's attributes a setup or `configure` step may set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeConfigPatch {
    #[serde(default)]
    pub mtu: Option<u32>,
    #[serde(default)]
    pub queue_size: Option<usize>,
    #[serde(default)]
    pub vlan: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupLink {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub delay_ms: Option<u64>,
    #[serde(default)]
    pub bandwidth_mbps: Option<u64>,
    #[serde(default)]
    pub packet_loss: Option<f64>,
}

/// A single ordered step. `action` dispatches on the kinds listed in the engine's step table
/// (`ping`, `send`, `configure`, `wait`, `validate`); `params` and `expect` are kept as loosely
/// typed JSON and decoded by the dispatcher because their shape varies per action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub name: String,
    pub action: String,
    #[serde(default = "serde_json::Value::default")]
    pub params: serde_json::Value,
    #[serde(default = "serde_json::Value::default")]
    pub expect: serde_json::Value,
}

/// An unordered validation, checked once after the last step. `kind` is one of `connectivity`,
/// `isolation`, `latency`, `packet_loss`, `throughput`, `vlan`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Validation {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "serde_json::Value::default")]
    pub params: serde_json::Value,
    #[serde(default)]
    pub threshold: Option<f64>,
}
