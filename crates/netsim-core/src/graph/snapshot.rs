//! The export/import snapshot document. Unlike the source this is based on, attributes are
//! preserved on export — the round trip `import(export())` is the identity on all observable
//! state, not just on the node set and adjacency.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub name: String,
    pub ip: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlan: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotAttribute {
    pub a: String,
    pub b: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bandwidth: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loss: Option<f64>,
}

/// `{ "nodes": [...], "connections": [...], "attributes": [...] }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub nodes: Vec<SnapshotNode>,
    pub connections: Vec<(String, String)>,
    #[serde(default)]
    pub attributes: Vec<SnapshotAttribute>,
}

/// A persistence collaborator seam. The core never talks to a database directly; whoever wires
/// up the (out of scope) SQL-backed persistence implements this trait instead.
pub trait SnapshotStore {
    type Error;

    fn save_snapshot(&self, doc: &Snapshot) -> Result<(), Self::Error>;
    fn load_snapshot(&self) -> Result<Snapshot, Self::Error>;
}
