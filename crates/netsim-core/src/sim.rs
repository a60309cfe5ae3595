//! Simulation state layered on top of a [`crate::graph::Network`]: the monotone time cursor and
//! its scheduled-delivery queue, the one-shot arrival signal, IoT battery drain, and cloud
//! scale-up/down. None of this lives inside the graph store itself — the store owns topology and
//! per-node/per-edge attributes, the simulator owns the things that change as simulated time
//! advances.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;
use typed_builder::TypedBuilder;

use crate::error::GraphError;
use crate::graph::{Network, NodeKind};
use crate::packet::Packet;
use crate::traversal::shortest_hops;

/// Construction-time configuration for a [`Simulator`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct SimulatorConfig {
    /// Battery percentage below which an IoT node auto-fails. Mirrors
    /// [`crate::graph::LOW_BATTERY_THRESHOLD`]; exposed here so tests can tune it without
    /// reaching into the graph store's internals.
    #[builder(default = crate::graph::LOW_BATTERY_THRESHOLD)]
    pub low_battery_threshold: u8,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

struct ScheduledDelivery {
    arrival: u64,
    seq: u64,
    packet: Packet,
}

impl PartialEq for ScheduledDelivery {
    fn eq(&self, other: &Self) -> bool {
        self.arrival == other.arrival && self.seq == other.seq
    }
}
impl Eq for ScheduledDelivery {}

impl PartialOrd for ScheduledDelivery {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledDelivery {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Arrival time first, then insertion order — this is fed to a `BinaryHeap`, which is a
        // max-heap, so callers wrap entries in `Reverse` to pop the earliest-arriving first.
        (self.arrival, self.seq).cmp(&(other.arrival, other.seq))
    }
}

#[derive(Default)]
struct State {
    cursor: u64,
    queue: BinaryHeap<Reverse<ScheduledDelivery>>,
    arrived: FxHashMap<String, bool>,
}

/// Advances simulated time over a [`Network`]: holds the monotone time cursor, the
/// scheduled-delivery queue, and per-node arrival latches. Battery drain and cloud scaling also
/// live here since they're state that evolves with simulated activity rather than static
/// topology.
pub struct Simulator {
    network: Arc<Network>,
    config: SimulatorConfig,
    state: Mutex<State>,
    seq: AtomicU64,
}

impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cursor = self.state.lock().expect("simulator state poisoned").cursor;
        f.debug_struct("Simulator").field("cursor_ms", &cursor).finish()
    }
}

impl Simulator {
    pub fn new(network: Arc<Network>, config: SimulatorConfig) -> Self {
        Self {
            network,
            config,
            state: Mutex::new(State::default()),
            seq: AtomicU64::new(0),
        }
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn cursor(&self) -> u64 {
        self.state.lock().expect("simulator state poisoned").cursor
    }

    /// Computes `arrival = cursor + extra_delay + packet.delay_budget_ms + link_delay(src, dst)`
    /// and inserts the packet into the ordered delivery queue, returning the computed arrival
    /// time. Fails if `src`/`dst` are not connected by an edge (there is no link delay to
    /// consult).
    #[tracing::instrument(skip(self, packet), fields(src = %packet.src, dst = %packet.dst))]
    pub fn schedule(&self, packet: Packet, extra_delay_ms: u64) -> Result<u64, GraphError> {
        let link_delay = self.network.link_delay(&packet.src, &packet.dst)?;
        let mut state = self.state.lock().expect("simulator state poisoned");
        let arrival = state.cursor + extra_delay_ms + packet.delay_budget_ms + link_delay.get();
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        state.queue.push(Reverse(ScheduledDelivery { arrival, seq, packet }));
        tracing::debug!(arrival, "scheduled delivery");
        Ok(arrival)
    }

    /// Advances the cursor by `delta_ms` and delivers every scheduled packet whose arrival time
    /// is now at or before the cursor, in non-decreasing arrival-time order (ties broken by
    /// insertion order). Delivery enqueues the packet at its destination (silently dropped if the
    /// destination's queue is full — that is the store's existing capacity semantics) and sets
    /// the destination's one-shot arrival latch. Returns the delivered packets in delivery order.
    #[tracing::instrument(skip(self))]
    pub fn advance_time(&self, delta_ms: u64) -> Result<Vec<Packet>, GraphError> {
        let mut state = self.state.lock().expect("simulator state poisoned");
        state.cursor += delta_ms;
        let cursor = state.cursor;

        let mut delivered = Vec::new();
        while let Some(Reverse(next)) = state.queue.peek() {
            if next.arrival > cursor {
                break;
            }
            let Reverse(entry) = state.queue.pop().expect("just peeked");
            delivered.push(entry.packet);
        }
        drop(state);

        for packet in &delivered {
            self.network.enqueue(&packet.dst, packet.clone())?;
            self.network.record_packet_received(&packet.dst)?;
            let mut state = self.state.lock().expect("simulator state poisoned");
            state.arrived.insert(packet.dst.clone(), true);
        }
        Ok(delivered)
    }

    /// One-shot: returns `true` iff a packet has been delivered to `name` since the last call
    /// that returned `true`, then clears the latch.
    pub fn has_packet_arrived(&self, name: &str) -> bool {
        let mut state = self.state.lock().expect("simulator state poisoned");
        match state.arrived.get_mut(name) {
            Some(flag) if *flag => {
                *flag = false;
                true
            }
            _ => false,
        }
    }

    /// Reduces `name`'s battery by `pct`, clamped to `[0, 100]`. If the resulting level falls
    /// below the low-battery threshold, the node is marked failed as a side effect of this same
    /// call.
    pub fn drain_battery(&self, name: &str, pct: u8) -> Result<u8, GraphError> {
        let current = self.network.battery(name)?.unwrap_or(0);
        let next = current.saturating_sub(pct).min(100);
        self.network.set_battery(name, next)?;
        if next < self.config.low_battery_threshold {
            self.network.fail_node(name)?;
        }
        Ok(next)
    }

    /// Allocates a new `<base>_instance_<n>` node, adds it to the topology as a `Cloud` node, and
    /// registers it in `base`'s scale group. Returns the new instance's name.
    pub fn scale_up(&self, base: &str, address: &str) -> Result<String, GraphError> {
        self.network.ensure_cloud_group(base)?;
        let instance = self.network.next_cloud_instance_name(base);
        self.network.add_node(&instance, NodeKind::Cloud, address)?;
        self.network.push_cloud_instance(base, &instance)?;
        Ok(instance)
    }

    /// Removes the most recently added instance of `base`'s scale group. Never removes the base
    /// instance; a no-op (returns `None`) on a group of size 1.
    pub fn scale_down(&self, base: &str) -> Result<Option<String>, GraphError> {
        let Some(instance) = self.network.pop_cloud_instance(base) else {
            return Ok(None);
        };
        self.network.remove_node(&instance)?;
        Ok(Some(instance))
    }

    /// Convenience wrapper used by `ping`-style callers: is there any path at all from `from` to
    /// `to`? Delegates to the shortest-hops traversal under a single read-locked query.
    pub fn can_reach(&self, from: &str, to: &str) -> bool {
        self.network.query(|oracle| shortest_hops(oracle, from, to).is_some())
    }
}

/// The TCP handshake/teardown state machine the control surface uses to report connection
/// success/failure. Represented as an enum with explicit transition methods so an invalid
/// transition simply returns `false` rather than needing a runtime check at every call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TcpState {
    Closed,
    SynSent,
    SynReceived,
    Established,
}

/// A single TCP connection's handshake/teardown state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpConnection(TcpState);

impl Default for TcpConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl TcpConnection {
    pub fn new() -> Self {
        Self(TcpState::Closed)
    }

    pub fn state(&self) -> TcpState {
        self.0
    }

    pub fn is_established(&self) -> bool {
        self.0 == TcpState::Established
    }

    /// `Closed -> SynSent`. Returns whether the transition was valid.
    pub fn send_syn(&mut self) -> bool {
        self.transition(TcpState::Closed, TcpState::SynSent)
    }

    /// `SynSent -> SynReceived`, triggered by a synthetic syn-ack.
    pub fn receive_syn_ack(&mut self) -> bool {
        self.transition(TcpState::SynSent, TcpState::SynReceived)
    }

    /// `SynReceived -> Established`, triggered by the final handshake ack.
    pub fn send_ack(&mut self) -> bool {
        self.transition(TcpState::SynReceived, TcpState::Established)
    }

    /// Tears the connection down unconditionally, from any state.
    pub fn close(&mut self) {
        self.0 = TcpState::Closed;
    }

    fn transition(&mut self, from: TcpState, to: TcpState) -> bool {
        if self.0 == from {
            self.0 = to;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NetworkConfig;
    use crate::packet::Packet;

    fn chain() -> Arc<Network> {
        let net = Network::new(NetworkConfig::default());
        net.add_node("A", NodeKind::Host, "10.0.0.1").unwrap();
        net.add_node("B", NodeKind::Host, "10.0.0.2").unwrap();
        net.connect("A", "B").unwrap();
        net.set_link_delay("A", "B", 100).unwrap();
        Arc::new(net)
    }

    #[test]
    fn time_cursor_delivery_latches_and_clears() {
        let net = chain();
        let sim = Simulator::new(Arc::clone(&net), SimulatorConfig::default());
        let packet = Packet::builder().src("A".to_string()).dst("B".to_string()).build();
        let arrival = sim.schedule(packet, 50).unwrap();
        assert_eq!(arrival, 150);

        sim.advance_time(100).unwrap();
        assert!(!sim.has_packet_arrived("B"));

        sim.advance_time(60).unwrap();
        assert!(sim.has_packet_arrived("B"));
        assert!(!sim.has_packet_arrived("B"));
    }

    #[test]
    fn advance_time_zero_is_a_no_op() {
        let net = chain();
        let sim = Simulator::new(Arc::clone(&net), SimulatorConfig::default());
        let packet = Packet::builder().src("A".to_string()).dst("B".to_string()).build();
        sim.schedule(packet, 1000).unwrap();
        let delivered = sim.advance_time(0).unwrap();
        assert!(delivered.is_empty());
        assert_eq!(sim.cursor(), 0);
    }

    #[test]
    fn deliveries_are_arrival_ordered() {
        let net = Network::new(NetworkConfig::default());
        net.add_node("A", NodeKind::Host, "10.0.0.1").unwrap();
        net.add_node("B", NodeKind::Host, "10.0.0.2").unwrap();
        net.connect("A", "B").unwrap();
        net.set_link_delay("A", "B", 0).unwrap();
        let net = Arc::new(net);
        let sim = Simulator::new(Arc::clone(&net), SimulatorConfig::default());

        let late = Packet::builder().src("A".to_string()).dst("B".to_string()).build();
        sim.schedule(late, 100).unwrap();
        let early = Packet::builder().src("A".to_string()).dst("B".to_string()).build();
        sim.schedule(early, 10).unwrap();

        let delivered = sim.advance_time(200).unwrap();
        assert_eq!(delivered.len(), 2);
    }

    #[test]
    fn iot_low_battery_auto_fails() {
        let net = Network::new(NetworkConfig::default());
        net.add_node("sensor", NodeKind::Iot, "10.0.0.5").unwrap();
        let net = Arc::new(net);
        let sim = Simulator::new(Arc::clone(&net), SimulatorConfig::default());
        let level = sim.drain_battery("sensor", 95).unwrap();
        assert_eq!(level, 5);
        assert!(net.is_failed("sensor").unwrap());
    }

    #[test]
    fn battery_drain_clamps_at_zero() {
        let net = Network::new(NetworkConfig::default());
        net.add_node("sensor", NodeKind::Iot, "10.0.0.5").unwrap();
        let net = Arc::new(net);
        let sim = Simulator::new(Arc::clone(&net), SimulatorConfig::default());
        let level = sim.drain_battery("sensor", 250).unwrap();
        assert_eq!(level, 0);
    }

    #[test]
    fn cloud_scale_up_then_down() {
        let net = Network::new(NetworkConfig::default());
        net.add_node("web", NodeKind::Cloud, "10.0.0.9").unwrap();
        let net = Arc::new(net);
        let sim = Simulator::new(Arc::clone(&net), SimulatorConfig::default());

        let instance = sim.scale_up("web", "10.0.0.10").unwrap();
        assert!(net.node_exists(&instance));
        assert_eq!(sim.scale_down("web").unwrap(), Some(instance.clone()));
        assert!(!net.node_exists(&instance));
        assert_eq!(sim.scale_down("web"), Ok(None));
    }

    #[test]
    fn tcp_handshake_happy_path() {
        let mut conn = TcpConnection::new();
        assert!(conn.send_syn());
        assert!(conn.receive_syn_ack());
        assert!(conn.send_ack());
        assert!(conn.is_established());
        conn.close();
        assert_eq!(conn.state(), TcpState::Closed);
    }

    #[test]
    fn tcp_rejects_out_of_order_transitions() {
        let mut conn = TcpConnection::new();
        assert!(!conn.receive_syn_ack());
        assert!(!conn.send_ack());
        assert_eq!(conn.state(), TcpState::Closed);
    }
}
