//! The entity types the graph store owns: nodes and the links between them.

use crate::units::{Bandwidth, DelayMs, LossProb};

/// The kind tag carried by every node. Behavior that diverges by kind (battery drain for `Iot`,
/// routing-table maintenance for `Router`) is dispatched on this field rather than through a
/// subclass hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Host,
    Router,
    Iot,
    Cloud,
    Generic,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NodeKind::Host => "host",
            NodeKind::Router => "router",
            NodeKind::Iot => "iot",
            NodeKind::Cloud => "cloud",
            NodeKind::Generic => "generic",
        };
        f.write_str(s)
    }
}

/// The default MTU assigned to a node if the caller doesn't specify one.
pub const DEFAULT_MTU: u32 = 1500;
/// The default max queue size assigned to a node if the caller doesn't specify one.
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 10;
/// Battery level below which an IoT node is automatically marked failed.
pub const LOW_BATTERY_THRESHOLD: u8 = 10;

/// A node in the topology. All kind-specific fields are present on every node (just unused for
/// kinds that don't need them); this keeps the struct flat and avoids a trait-object per node.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NodeData {
    pub name: String,
    pub kind: NodeKind,
    pub address: String,
    pub mtu: u32,
    pub max_queue_size: usize,
    pub vlan: Option<i64>,
    pub failed: bool,
    /// Host-only: the port it listens on.
    pub port: Option<u32>,
    /// IoT-only: battery level in `[0, 100]`.
    pub battery: Option<u8>,
}

impl NodeData {
    pub fn new(name: impl Into<String>, kind: NodeKind, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            address: address.into(),
            mtu: DEFAULT_MTU,
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            vlan: None,
            failed: false,
            port: None,
            battery: if kind == NodeKind::Iot { Some(100) } else { None },
        }
    }
}

/// The attributes of an undirected link. A single edge backs both directions, so symmetry
/// (invariant: `delay(a,b) == delay(b,a)`) holds by construction rather than by bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LinkData {
    pub delay: DelayMs,
    pub bandwidth: Bandwidth,
    pub loss: LossProb,
    pub wireless_range: Option<u32>,
}
