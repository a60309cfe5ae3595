//! Packets carried by the simulation: the payload and control fields a [`crate::sim::Simulator`]
//! schedules, queues, and delivers, but never interprets beyond what's needed to route and
//! account for them.

use typed_builder::TypedBuilder;

/// TCP-style control fields carried alongside a packet. Left at their defaults for
/// connectionless traffic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TcpControl {
    pub syn: bool,
    pub ack: bool,
    pub seq: u32,
    pub ack_num: u32,
}

/// Fragmentation fields for a packet that is one fragment of a larger payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fragmentation {
    pub fragment_id: u32,
    pub sequence: u32,
    pub is_last: bool,
}

/// A single packet moving through the simulated network.
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder, serde::Serialize, serde::Deserialize)]
pub struct Packet {
    pub src: String,
    pub dst: String,

    #[builder(default)]
    pub payload: Vec<u8>,

    #[builder(default = "ip".to_string())]
    pub protocol: String,

    #[builder(default = 64)]
    pub ttl: u32,

    #[builder(default = 0)]
    pub delay_budget_ms: u64,

    #[builder(default = 0)]
    pub priority: i32,

    #[builder(default)]
    pub tcp: TcpControl,

    #[builder(default)]
    pub fragmentation: Option<Fragmentation>,
}

impl Packet {
    /// Decrements TTL, saturating at zero. The traversal kernel never consults this; it is only
    /// meaningful to a caller that wants hop-count-limited forwarding semantics at the scenario
    /// or control-surface level.
    pub fn decrement_ttl(&mut self) {
        self.ttl = self.ttl.saturating_sub(1);
    }

    pub fn is_expired(&self) -> bool {
        self.ttl == 0
    }
}
