//! The graph store: the authoritative in-memory topology and all per-node/per-edge runtime
//! state layered on top of it (VLANs, firewall rules, queues, counters, cloud groups).

pub mod oracle;
pub mod snapshot;
pub mod types;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, RwLock};

use petgraph::stable_graph::{NodeIndex, StableUnGraph};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use typed_builder::TypedBuilder;

use crate::error::GraphError;
use crate::events::{Event, EventKind, Publisher};
use crate::packet::Packet;
use crate::units::{Bandwidth, DelayMs, LossProb};

pub use oracle::Oracle;
pub use snapshot::{Snapshot, SnapshotAttribute, SnapshotNode, SnapshotStore};
pub use types::{LinkData, NodeData, NodeKind, DEFAULT_MAX_QUEUE_SIZE, DEFAULT_MTU, LOW_BATTERY_THRESHOLD};

/// Construction-time configuration for a [`Network`]: default attribute values and the seed for
/// its process-wide PRNG (packet-loss sampling). Threaded explicitly through the constructor
/// rather than read from mutable module-level state.
#[derive(Debug, Clone, TypedBuilder)]
pub struct NetworkConfig {
    #[builder(default = DEFAULT_MTU)]
    pub default_mtu: u32,
    #[builder(default = DEFAULT_MAX_QUEUE_SIZE)]
    pub default_max_queue_size: usize,
    #[builder(default = 0)]
    pub rng_seed: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

type EdgeKey = (String, String);

#[derive(Default)]
struct Inner {
    graph: StableUnGraph<NodeData, LinkData>,
    index: FxHashMap<String, NodeIndex>,
    firewall: FxHashMap<(String, String, String), bool>,
    queues: FxHashMap<String, VecDeque<Packet>>,
    sent: FxHashMap<String, u64>,
    received: FxHashMap<String, u64>,
    link_traffic: FxHashMap<EdgeKey, u64>,
    directed_traffic: FxHashMap<EdgeKey, u64>,
    cloud_groups: FxHashMap<String, Vec<String>>,
}

struct ProcessState {
    rng: StdRng,
    cloud_counter: u64,
}

/// The in-memory topology store. Cheap to query concurrently (`RwLock::read`); every mutator
/// takes the write lock, restores invariants, then drops the lock before publishing its event.
pub struct Network {
    inner: RwLock<Inner>,
    process: Mutex<ProcessState>,
    publisher: Arc<Publisher>,
    config: NetworkConfig,
}

impl std::fmt::Debug for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let node_count = self.inner.read().map(|i| i.graph.node_count()).unwrap_or(0);
        f.debug_struct("Network").field("nodes", &node_count).finish()
    }
}

fn edge_key(a: &str, b: &str) -> EdgeKey {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

impl Network {
    pub fn new(config: NetworkConfig) -> Self {
        let process = ProcessState {
            rng: StdRng::seed_from_u64(config.rng_seed),
            cloud_counter: 0,
        };
        Self {
            inner: RwLock::new(Inner::default()),
            process: Mutex::new(process),
            publisher: Arc::new(Publisher::new()),
            config,
        }
    }

    pub fn publisher(&self) -> Arc<Publisher> {
        Arc::clone(&self.publisher)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().expect("graph store lock poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().expect("graph store lock poisoned")
    }

    fn node_index(inner: &Inner, name: &str) -> Result<NodeIndex, GraphError> {
        inner
            .index
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::not_found(name))
    }

    // -- node lifecycle ---------------------------------------------------

    pub fn add_node(&self, name: &str, kind: NodeKind, address: &str) -> Result<(), GraphError> {
        if name.is_empty() {
            return Err(GraphError::invalid_argument("node name must not be empty"));
        }
        let event = {
            let mut inner = self.write();
            if inner.index.contains_key(name) {
                return Err(GraphError::already_exists(name));
            }
            let mut data = NodeData::new(name, kind, address);
            data.mtu = self.config.default_mtu;
            data.max_queue_size = self.config.default_max_queue_size;
            let idx = inner.graph.add_node(data);
            inner.index.insert(name.to_string(), idx);
            inner.queues.insert(name.to_string(), VecDeque::new());
            Event::new(
                EventKind::NodeAdded,
                serde_json::json!({ "name": name, "kind": kind.to_string() }),
            )
        };
        self.publisher.publish(event);
        Ok(())
    }

    pub fn set_port(&self, name: &str, port: u32) -> Result<(), GraphError> {
        let mut inner = self.write();
        let idx = Self::node_index(&inner, name)?;
        inner.graph.node_weight_mut(idx).expect("index consistency").port = Some(port);
        Ok(())
    }

    pub fn remove_node(&self, name: &str) -> Result<(), GraphError> {
        let event = {
            let mut inner = self.write();
            let idx = Self::node_index(&inner, name)?;
            inner.graph.remove_node(idx);
            inner.index.remove(name);
            inner.queues.remove(name);
            inner.sent.remove(name);
            inner.received.remove(name);
            inner.firewall.retain(|(s, d, _), _| s != name && d != name);
            inner.link_traffic.retain(|(a, b), _| a != name && b != name);
            inner.directed_traffic.retain(|(a, b), _| a != name && b != name);
            inner.cloud_groups.remove(name);
            for instances in inner.cloud_groups.values_mut() {
                instances.retain(|n| n != name);
            }
            Event::new(EventKind::NodeRemoved, serde_json::json!({ "name": name }))
        };
        self.publisher.publish(event);
        Ok(())
    }

    pub fn node_exists(&self, name: &str) -> bool {
        self.read().index.contains_key(name)
    }

    pub fn node(&self, name: &str) -> Result<NodeData, GraphError> {
        let inner = self.read();
        let idx = Self::node_index(&inner, name)?;
        Ok(inner.graph.node_weight(idx).expect("index consistency").clone())
    }

    // -- adjacency ----------------------------------------------------------

    pub fn connect(&self, a: &str, b: &str) -> Result<(), GraphError> {
        if a == b {
            return Err(GraphError::invalid_argument("a node cannot connect to itself"));
        }
        let event = {
            let mut inner = self.write();
            let ia = Self::node_index(&inner, a)?;
            let ib = Self::node_index(&inner, b)?;
            if inner.graph.find_edge(ia, ib).is_some() {
                return Ok(());
            }
            inner.graph.add_edge(ia, ib, LinkData::default());
            Event::new(EventKind::LinkAdded, serde_json::json!({ "a": a, "b": b }))
        };
        self.publisher.publish(event);
        Ok(())
    }

    pub fn disconnect(&self, a: &str, b: &str) -> Result<(), GraphError> {
        let event = {
            let mut inner = self.write();
            let ia = Self::node_index(&inner, a)?;
            let ib = Self::node_index(&inner, b)?;
            let edge = inner.graph.find_edge(ia, ib).ok_or_else(|| {
                GraphError::precondition_failed(format!("no edge between {a} and {b}"))
            })?;
            inner.graph.remove_edge(edge);
            Event::new(EventKind::LinkRemoved, serde_json::json!({ "a": a, "b": b }))
        };
        self.publisher.publish(event);
        Ok(())
    }

    pub fn neighbors(&self, name: &str) -> Result<Vec<String>, GraphError> {
        let inner = self.read();
        let idx = Self::node_index(&inner, name)?;
        Ok(inner
            .graph
            .neighbors(idx)
            .map(|n| inner.graph.node_weight(n).expect("index consistency").name.clone())
            .collect())
    }

    fn edge_mut<'a>(
        inner: &'a mut Inner,
        a: &str,
        b: &str,
    ) -> Result<&'a mut LinkData, GraphError> {
        let ia = Self::node_index(inner, a)?;
        let ib = Self::node_index(inner, b)?;
        let edge = inner
            .graph
            .find_edge(ia, ib)
            .ok_or_else(|| GraphError::precondition_failed(format!("no edge between {a} and {b}")))?;
        Ok(inner.graph.edge_weight_mut(edge).expect("edge index consistency"))
    }

    fn edge_ref<'a>(inner: &'a Inner, a: &str, b: &str) -> Result<&'a LinkData, GraphError> {
        let ia = Self::node_index(inner, a)?;
        let ib = Self::node_index(inner, b)?;
        let edge = inner
            .graph
            .find_edge(ia, ib)
            .ok_or_else(|| GraphError::precondition_failed(format!("no edge between {a} and {b}")))?;
        Ok(inner.graph.edge_weight(edge).expect("edge index consistency"))
    }

    pub fn set_link_delay(&self, a: &str, b: &str, delay_ms: i64) -> Result<(), GraphError> {
        if delay_ms < 0 {
            return Err(GraphError::invalid_argument("delay must be non-negative"));
        }
        let event = {
            let mut inner = self.write();
            Self::edge_mut(&mut inner, a, b)?.delay = DelayMs::new(delay_ms as u64);
            Event::new(
                EventKind::TopologyChanged,
                serde_json::json!({ "a": a, "b": b, "delay_ms": delay_ms }),
            )
        };
        self.publisher.publish(event);
        Ok(())
    }

    pub fn set_bandwidth(&self, a: &str, b: &str, cap: i64) -> Result<(), GraphError> {
        if cap < 0 {
            return Err(GraphError::invalid_argument("bandwidth must be non-negative"));
        }
        let event = {
            let mut inner = self.write();
            Self::edge_mut(&mut inner, a, b)?.bandwidth = Bandwidth::new(cap as u64);
            Event::new(
                EventKind::TopologyChanged,
                serde_json::json!({ "a": a, "b": b, "bandwidth": cap }),
            )
        };
        self.publisher.publish(event);
        Ok(())
    }

    pub fn set_packet_loss(&self, a: &str, b: &str, p: f64) -> Result<(), GraphError> {
        if !LossProb::is_valid(p) {
            return Err(GraphError::invalid_argument("loss probability must be in [0, 1]"));
        }
        let event = {
            let mut inner = self.write();
            Self::edge_mut(&mut inner, a, b)?.loss = LossProb::new_clamped(p);
            Event::new(
                EventKind::TopologyChanged,
                serde_json::json!({ "a": a, "b": b, "loss": p }),
            )
        };
        self.publisher.publish(event);
        Ok(())
    }

    pub fn set_wireless_range(&self, a: &str, b: &str, range: u32) -> Result<(), GraphError> {
        let event = {
            let mut inner = self.write();
            Self::edge_mut(&mut inner, a, b)?.wireless_range = Some(range);
            Event::new(
                EventKind::TopologyChanged,
                serde_json::json!({ "a": a, "b": b, "wireless_range": range }),
            )
        };
        self.publisher.publish(event);
        Ok(())
    }

    pub fn link_delay(&self, a: &str, b: &str) -> Result<DelayMs, GraphError> {
        Ok(Self::edge_ref(&self.read(), a, b)?.delay)
    }

    pub fn bandwidth(&self, a: &str, b: &str) -> Result<Bandwidth, GraphError> {
        Ok(Self::edge_ref(&self.read(), a, b)?.bandwidth)
    }

    pub fn packet_loss(&self, a: &str, b: &str) -> Result<LossProb, GraphError> {
        Ok(Self::edge_ref(&self.read(), a, b)?.loss)
    }

    // -- VLAN / firewall ------------------------------------------------

    pub fn assign_vlan(&self, name: &str, tag: Option<i64>) -> Result<(), GraphError> {
        let event = {
            let mut inner = self.write();
            let idx = Self::node_index(&inner, name)?;
            inner.graph.node_weight_mut(idx).expect("index consistency").vlan = tag;
            Event::new(
                EventKind::NodeUpdated,
                serde_json::json!({ "name": name, "vlan": tag }),
            )
        };
        self.publisher.publish(event);
        Ok(())
    }

    pub fn set_mtu(&self, name: &str, mtu: u32) -> Result<(), GraphError> {
        if mtu == 0 {
            return Err(GraphError::invalid_argument("mtu must be positive"));
        }
        let event = {
            let mut inner = self.write();
            let idx = Self::node_index(&inner, name)?;
            inner.graph.node_weight_mut(idx).expect("index consistency").mtu = mtu;
            Event::new(EventKind::NodeUpdated, serde_json::json!({ "name": name, "mtu": mtu }))
        };
        self.publisher.publish(event);
        Ok(())
    }

    pub fn set_max_queue_size(&self, name: &str, size: usize) -> Result<(), GraphError> {
        if size == 0 {
            return Err(GraphError::invalid_argument("max queue size must be positive"));
        }
        let event = {
            let mut inner = self.write();
            let idx = Self::node_index(&inner, name)?;
            inner.graph.node_weight_mut(idx).expect("index consistency").max_queue_size = size;
            Event::new(
                EventKind::NodeUpdated,
                serde_json::json!({ "name": name, "max_queue_size": size }),
            )
        };
        self.publisher.publish(event);
        Ok(())
    }

    pub fn can_communicate(&self, a: &str, b: &str) -> Result<bool, GraphError> {
        let inner = self.read();
        let ia = Self::node_index(&inner, a)?;
        let ib = Self::node_index(&inner, b)?;
        let va = inner.graph.node_weight(ia).expect("index consistency").vlan;
        let vb = inner.graph.node_weight(ib).expect("index consistency").vlan;
        Ok(match (va, vb) {
            (None, _) | (_, None) => true,
            (Some(x), Some(y)) => x == y,
        })
    }

    pub fn add_firewall_rule(
        &self,
        src: &str,
        dst: &str,
        protocol: &str,
        allow: bool,
    ) -> Result<(), GraphError> {
        let event = {
            let mut inner = self.write();
            if !inner.index.contains_key(src) {
                return Err(GraphError::not_found(src));
            }
            if !inner.index.contains_key(dst) {
                return Err(GraphError::not_found(dst));
            }
            inner
                .firewall
                .insert((src.to_string(), dst.to_string(), protocol.to_string()), allow);
            Event::new(
                EventKind::TopologyChanged,
                serde_json::json!({ "src": src, "dst": dst, "protocol": protocol, "allow": allow }),
            )
        };
        self.publisher.publish(event);
        Ok(())
    }

    pub fn is_allowed(&self, src: &str, dst: &str, protocol: &str) -> Result<bool, GraphError> {
        let inner = self.read();
        if !inner.index.contains_key(src) {
            return Err(GraphError::not_found(src));
        }
        if !inner.index.contains_key(dst) {
            return Err(GraphError::not_found(dst));
        }
        Ok(*inner
            .firewall
            .get(&(src.to_string(), dst.to_string(), protocol.to_string()))
            .unwrap_or(&true))
    }

    // -- failure ----------------------------------------------------------

    pub fn fail_node(&self, name: &str) -> Result<(), GraphError> {
        let event = {
            let mut inner = self.write();
            let idx = Self::node_index(&inner, name)?;
            inner.graph.node_weight_mut(idx).expect("index consistency").failed = true;
            Event::new(EventKind::NodeFailed, serde_json::json!({ "name": name }))
        };
        self.publisher.publish(event);
        Ok(())
    }

    pub fn recover(&self, name: &str) -> Result<(), GraphError> {
        let event = {
            let mut inner = self.write();
            let idx = Self::node_index(&inner, name)?;
            inner.graph.node_weight_mut(idx).expect("index consistency").failed = false;
            Event::new(EventKind::NodeRecovered, serde_json::json!({ "name": name }))
        };
        self.publisher.publish(event);
        Ok(())
    }

    pub fn is_failed(&self, name: &str) -> Result<bool, GraphError> {
        let inner = self.read();
        let idx = Self::node_index(&inner, name)?;
        Ok(inner.graph.node_weight(idx).expect("index consistency").failed)
    }

    // -- queues -------------------------------------------------------------

    /// Returns `true` if the packet was enqueued, `false` if it was dropped because the queue
    /// was at capacity. A full queue is not an error condition.
    pub fn enqueue(&self, name: &str, packet: Packet) -> Result<bool, GraphError> {
        let mut inner = self.write();
        let idx = Self::node_index(&inner, name)?;
        let max = inner.graph.node_weight(idx).expect("index consistency").max_queue_size;
        let queue = inner.queues.get_mut(name).expect("queue consistency");
        if queue.len() >= max {
            return Ok(false);
        }
        queue.push_back(packet);
        Ok(true)
    }

    pub fn dequeue(&self, name: &str) -> Result<Option<Packet>, GraphError> {
        let mut inner = self.write();
        if !inner.index.contains_key(name) {
            return Err(GraphError::not_found(name));
        }
        Ok(inner.queues.get_mut(name).expect("queue consistency").pop_front())
    }

    pub fn is_congested(&self, name: &str) -> Result<bool, GraphError> {
        let inner = self.read();
        let idx = Self::node_index(&inner, name)?;
        let max = inner.graph.node_weight(idx).expect("index consistency").max_queue_size;
        Ok(inner.queues.get(name).expect("queue consistency").len() >= max)
    }

    // -- counters -------------------------------------------------------------

    pub fn record_packet_sent(&self, name: &str) -> Result<(), GraphError> {
        let event = {
            let mut inner = self.write();
            if !inner.index.contains_key(name) {
                return Err(GraphError::not_found(name));
            }
            *inner.sent.entry(name.to_string()).or_insert(0) += 1;
            Event::new(
                EventKind::StatisticsUpdate,
                serde_json::json!({ "name": name, "counter": "sent" }),
            )
        };
        self.publisher.publish(event);
        Ok(())
    }

    pub fn record_packet_received(&self, name: &str) -> Result<(), GraphError> {
        let event = {
            let mut inner = self.write();
            if !inner.index.contains_key(name) {
                return Err(GraphError::not_found(name));
            }
            *inner.received.entry(name.to_string()).or_insert(0) += 1;
            Event::new(
                EventKind::StatisticsUpdate,
                serde_json::json!({ "name": name, "counter": "received" }),
            )
        };
        self.publisher.publish(event);
        Ok(())
    }

    pub fn record_link_traffic(&self, a: &str, b: &str) -> Result<(), GraphError> {
        let event = {
            let mut inner = self.write();
            if !inner.index.contains_key(a) {
                return Err(GraphError::not_found(a));
            }
            if !inner.index.contains_key(b) {
                return Err(GraphError::not_found(b));
            }
            *inner.link_traffic.entry(edge_key(a, b)).or_insert(0) += 1;
            Event::new(
                EventKind::StatisticsUpdate,
                serde_json::json!({ "a": a, "b": b, "counter": "link_traffic" }),
            )
        };
        self.publisher.publish(event);
        Ok(())
    }

    /// Ordered `(src, dst)` packet count, supplementing the unordered link-traffic counter.
    pub fn record_directed_traffic(&self, src: &str, dst: &str) -> Result<(), GraphError> {
        let mut inner = self.write();
        if !inner.index.contains_key(src) {
            return Err(GraphError::not_found(src));
        }
        if !inner.index.contains_key(dst) {
            return Err(GraphError::not_found(dst));
        }
        *inner
            .directed_traffic
            .entry((src.to_string(), dst.to_string()))
            .or_insert(0) += 1;
        Ok(())
    }

    pub fn packets_sent(&self, name: &str) -> u64 {
        self.read().sent.get(name).copied().unwrap_or(0)
    }

    pub fn packets_received(&self, name: &str) -> u64 {
        self.read().received.get(name).copied().unwrap_or(0)
    }

    pub fn link_traffic(&self, a: &str, b: &str) -> u64 {
        self.read().link_traffic.get(&edge_key(a, b)).copied().unwrap_or(0)
    }

    // -- IoT battery ----------------------------------------------------------

    pub fn battery(&self, name: &str) -> Result<Option<u8>, GraphError> {
        let inner = self.read();
        let idx = Self::node_index(&inner, name)?;
        Ok(inner.graph.node_weight(idx).expect("index consistency").battery)
    }

    /// Sets the raw battery level without applying the low-battery auto-fail side effect; the
    /// `drain` operation in the simulation layer composes this with `fail_node`.
    pub fn set_battery(&self, name: &str, level: u8) -> Result<(), GraphError> {
        let event = {
            let mut inner = self.write();
            let idx = Self::node_index(&inner, name)?;
            inner.graph.node_weight_mut(idx).expect("index consistency").battery = Some(level);
            Event::new(
                EventKind::NodeUpdated,
                serde_json::json!({ "name": name, "battery": level }),
            )
        };
        self.publisher.publish(event);
        Ok(())
    }

    // -- cloud scaling ----------------------------------------------------------

    pub fn cloud_group(&self, base: &str) -> Vec<String> {
        self.read().cloud_groups.get(base).cloned().unwrap_or_default()
    }

    /// Registers `base` as a cloud group root (idempotent) and returns the current membership.
    pub fn ensure_cloud_group(&self, base: &str) -> Result<(), GraphError> {
        let mut inner = self.write();
        if !inner.index.contains_key(base) {
            return Err(GraphError::not_found(base));
        }
        inner
            .cloud_groups
            .entry(base.to_string())
            .or_insert_with(|| vec![base.to_string()]);
        Ok(())
    }

    /// Allocates the next `<base>_instance_<n>` name using the process-wide cloud counter.
    pub fn next_cloud_instance_name(&self, base: &str) -> String {
        let mut process = self.process.lock().expect("process state poisoned");
        process.cloud_counter += 1;
        format!("{base}_instance_{}", process.cloud_counter)
    }

    pub fn push_cloud_instance(&self, base: &str, instance: &str) -> Result<(), GraphError> {
        let mut inner = self.write();
        if !inner.index.contains_key(instance) {
            return Err(GraphError::not_found(instance));
        }
        inner
            .cloud_groups
            .entry(base.to_string())
            .or_insert_with(|| vec![base.to_string()])
            .push(instance.to_string());
        Ok(())
    }

    /// Removes and returns the most recently added instance of `base`'s group, never the base
    /// itself. A group of size 1 (just the base) is a no-op, returning `None`.
    pub fn pop_cloud_instance(&self, base: &str) -> Option<String> {
        let mut inner = self.write();
        let group = inner.cloud_groups.get_mut(base)?;
        if group.len() <= 1 {
            return None;
        }
        group.pop()
    }

    // -- PRNG-backed loss sampling ----------------------------------------------

    /// Draws from the store's seeded PRNG to decide whether a packet traversing `(a, b)` is
    /// lost, consulting that edge's loss probability.
    pub fn sample_loss(&self, a: &str, b: &str) -> Result<bool, GraphError> {
        let p = self.packet_loss(a, b)?.get();
        if p <= 0.0 {
            return Ok(false);
        }
        let mut process = self.process.lock().expect("process state poisoned");
        Ok(process.rng.gen::<f64>() < p)
    }

    // -- snapshot -------------------------------------------------------------

    pub fn export_snapshot(&self) -> Snapshot {
        let inner = self.read();
        let mut nodes = Vec::new();
        let mut connections = Vec::new();
        let mut attributes = Vec::new();
        let mut seen_edges = std::collections::HashSet::new();
        for idx in inner.graph.node_indices() {
            let n = inner.graph.node_weight(idx).expect("index consistency");
            nodes.push(SnapshotNode {
                name: n.name.clone(),
                ip: n.address.clone(),
                kind: n.kind.to_string(),
                vlan: n.vlan,
                failed: Some(n.failed),
            });
            for neighbor_idx in inner.graph.neighbors(idx) {
                let neighbor = inner.graph.node_weight(neighbor_idx).expect("index consistency");
                let key = edge_key(&n.name, &neighbor.name);
                if !seen_edges.insert(key.clone()) {
                    continue;
                }
                connections.push((key.0.clone(), key.1.clone()));
                let link = Self::edge_ref(&inner, &n.name, &neighbor.name).expect("edge exists");
                attributes.push(SnapshotAttribute {
                    a: key.0,
                    b: key.1,
                    delay: Some(link.delay.get()),
                    bandwidth: Some(link.bandwidth.get()),
                    loss: Some(link.loss.get()),
                });
            }
        }
        Snapshot {
            nodes,
            connections,
            attributes,
        }
    }

    /// Destructively replaces all state with `doc`. Fails atomically (leaving the prior state
    /// untouched) if `doc` references a name not present in its own `nodes` array.
    pub fn import_snapshot(&self, doc: &Snapshot) -> Result<(), GraphError> {
        let known: std::collections::HashSet<&str> =
            doc.nodes.iter().map(|n| n.name.as_str()).collect();
        for (a, b) in &doc.connections {
            if !known.contains(a.as_str()) || !known.contains(b.as_str()) {
                return Err(GraphError::invalid_argument(format!(
                    "snapshot connection references unknown node: {a} or {b}"
                )));
            }
        }
        for attr in &doc.attributes {
            if !known.contains(attr.a.as_str()) || !known.contains(attr.b.as_str()) {
                return Err(GraphError::invalid_argument(format!(
                    "snapshot attribute references unknown node: {} or {}",
                    attr.a, attr.b
                )));
            }
        }

        let mut fresh = Inner::default();
        for n in &doc.nodes {
            let kind = match n.kind.as_str() {
                "host" => NodeKind::Host,
                "router" => NodeKind::Router,
                "iot" => NodeKind::Iot,
                "cloud" => NodeKind::Cloud,
                _ => NodeKind::Generic,
            };
            let mut data = NodeData::new(&n.name, kind, &n.ip);
            data.vlan = n.vlan;
            data.failed = n.failed.unwrap_or(false);
            let idx = fresh.graph.add_node(data);
            fresh.index.insert(n.name.clone(), idx);
            fresh.queues.insert(n.name.clone(), VecDeque::new());
        }
        for (a, b) in &doc.connections {
            let ia = fresh.index[a];
            let ib = fresh.index[b];
            fresh.graph.add_edge(ia, ib, LinkData::default());
        }
        for attr in &doc.attributes {
            let ia = fresh.index[&attr.a];
            let ib = fresh.index[&attr.b];
            if let Some(edge) = fresh.graph.find_edge(ia, ib) {
                let link = fresh.graph.edge_weight_mut(edge).expect("edge index consistency");
                if let Some(d) = attr.delay {
                    link.delay = DelayMs::new(d);
                }
                if let Some(bw) = attr.bandwidth {
                    link.bandwidth = Bandwidth::new(bw);
                }
                if let Some(l) = attr.loss {
                    link.loss = LossProb::new_clamped(l);
                }
            }
        }

        let event = {
            let mut inner = self.write();
            *inner = fresh;
            Event::new(EventKind::TopologyChanged, serde_json::json!({ "reason": "import" }))
        };
        self.publisher.publish(event);
        Ok(())
    }

    /// Runs a traversal-kernel query against a single consistent read-locked view of the graph.
    /// The read guard is held for the full duration of `f`, matching the "read borrow for the
    /// entire execution" requirement on traversal queries.
    pub fn query<R>(&self, f: impl FnOnce(&dyn Oracle) -> R) -> R {
        let inner = self.read();
        let view = StoreOracle { inner: &inner };
        f(&view)
    }
}

struct StoreOracle<'a> {
    inner: &'a Inner,
}

impl Oracle for StoreOracle<'_> {
    fn neighbors(&self, node: &str) -> Vec<String> {
        let Some(&idx) = self.inner.index.get(node) else {
            return Vec::new();
        };
        self.inner
            .graph
            .neighbors(idx)
            .map(|n| self.inner.graph.node_weight(n).expect("index consistency").name.clone())
            .collect()
    }

    fn delay(&self, a: &str, b: &str) -> i64 {
        Network::edge_ref(self.inner, a, b)
            .map(|l| l.delay.get() as i64)
            .unwrap_or(0)
    }

    fn bandwidth(&self, a: &str, b: &str) -> i64 {
        Network::edge_ref(self.inner, a, b)
            .map(|l| l.bandwidth.get() as i64)
            .unwrap_or(0)
    }

    fn loss(&self, a: &str, b: &str) -> f64 {
        Network::edge_ref(self.inner, a, b).map(|l| l.loss.get()).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_node_chain() -> Network {
        let net = Network::new(NetworkConfig::default());
        net.add_node("A", NodeKind::Host, "10.0.0.1").unwrap();
        net.add_node("B", NodeKind::Router, "10.0.0.2").unwrap();
        net.add_node("C", NodeKind::Host, "10.0.0.3").unwrap();
        net.connect("A", "B").unwrap();
        net.connect("B", "C").unwrap();
        net.set_link_delay("A", "B", 10).unwrap();
        net.set_link_delay("B", "C", 10).unwrap();
        net
    }

    #[test]
    fn adjacency_is_symmetric() {
        let net = three_node_chain();
        assert!(net.neighbors("A").unwrap().contains(&"B".to_string()));
        assert!(net.neighbors("B").unwrap().contains(&"A".to_string()));
    }

    #[test]
    fn link_attributes_are_symmetric() {
        let net = three_node_chain();
        assert_eq!(net.link_delay("A", "B").unwrap(), net.link_delay("B", "A").unwrap());
    }

    #[test]
    fn duplicate_add_fails() {
        let net = three_node_chain();
        assert!(matches!(
            net.add_node("A", NodeKind::Host, "x"),
            Err(GraphError::AlreadyExists(_))
        ));
    }

    #[test]
    fn self_connect_fails() {
        let net = three_node_chain();
        assert!(matches!(
            net.connect("A", "A"),
            Err(GraphError::InvalidArgument(_))
        ));
    }

    #[test]
    fn connect_is_idempotent() {
        let net = three_node_chain();
        net.connect("A", "B").unwrap();
        assert_eq!(net.neighbors("A").unwrap().len(), 1);
    }

    #[test]
    fn disconnect_without_edge_fails() {
        let net = three_node_chain();
        assert!(matches!(
            net.disconnect("A", "C"),
            Err(GraphError::PreconditionFailed(_))
        ));
    }

    #[test]
    fn negative_delay_rejected() {
        let net = three_node_chain();
        assert!(matches!(
            net.set_link_delay("A", "B", -1),
            Err(GraphError::InvalidArgument(_))
        ));
    }

    #[test]
    fn remove_node_purges_everything() {
        let net = three_node_chain();
        net.add_firewall_rule("A", "B", "tcp", true).unwrap();
        net.record_link_traffic("A", "B").unwrap();
        net.remove_node("B").unwrap();
        assert!(!net.node_exists("B"));
        assert!(net.neighbors("A").unwrap().is_empty());
        assert!(net.is_allowed("A", "C", "tcp").unwrap());
        assert_eq!(net.link_traffic("A", "B"), 0);
    }

    #[test]
    fn vlan_isolation() {
        let net = Network::new(NetworkConfig::default());
        net.add_node("A", NodeKind::Host, "10.0.0.1").unwrap();
        net.add_node("B", NodeKind::Host, "10.0.0.2").unwrap();
        net.connect("A", "B").unwrap();
        net.assign_vlan("A", Some(10)).unwrap();
        net.assign_vlan("B", Some(20)).unwrap();
        assert!(!net.can_communicate("A", "B").unwrap());
        net.assign_vlan("B", Some(10)).unwrap();
        assert!(net.can_communicate("A", "B").unwrap());
    }

    #[test]
    fn firewall_default_allow() {
        let net = three_node_chain();
        assert!(net.is_allowed("A", "C", "tcp").unwrap());
        net.add_firewall_rule("A", "C", "tcp", false).unwrap();
        assert!(!net.is_allowed("A", "C", "tcp").unwrap());
    }

    #[test]
    fn battery_low_marks_failed_is_caller_composed() {
        let net = Network::new(NetworkConfig::default());
        net.add_node("sensor", NodeKind::Iot, "10.0.0.5").unwrap();
        assert_eq!(net.battery("sensor").unwrap(), Some(100));
        net.set_battery("sensor", 5).unwrap();
        assert_eq!(net.battery("sensor").unwrap(), Some(5));
        assert!(!net.is_failed("sensor").unwrap());
    }

    #[test]
    fn cloud_scale_never_removes_base() {
        let net = Network::new(NetworkConfig::default());
        net.add_node("web", NodeKind::Cloud, "10.0.0.9").unwrap();
        net.ensure_cloud_group("web").unwrap();
        assert_eq!(net.pop_cloud_instance("web"), None);
        let inst = net.next_cloud_instance_name("web");
        net.add_node(&inst, NodeKind::Cloud, "10.0.0.10").unwrap();
        net.push_cloud_instance("web", &inst).unwrap();
        assert_eq!(net.cloud_group("web"), vec!["web".to_string(), inst.clone()]);
        assert_eq!(net.pop_cloud_instance("web"), Some(inst));
        assert_eq!(net.cloud_group("web"), vec!["web".to_string()]);
    }

    #[test]
    fn queue_drops_silently_when_full() {
        let net = Network::new(NetworkConfig::builder().default_max_queue_size(1).build());
        net.add_node("A", NodeKind::Host, "10.0.0.1").unwrap();
        let p = |dst: &str| Packet::builder().src("x".into()).dst(dst.into()).build();
        assert!(net.enqueue("A", p("A")).unwrap());
        assert!(!net.enqueue("A", p("A")).unwrap());
        assert!(net.is_congested("A").unwrap());
    }

    #[test]
    fn snapshot_round_trip_preserves_attributes() {
        let net = three_node_chain();
        net.set_bandwidth("A", "B", 100).unwrap();
        net.set_packet_loss("A", "B", 0.5).unwrap();
        let doc = net.export_snapshot();

        let restored = Network::new(NetworkConfig::default());
        restored.import_snapshot(&doc).unwrap();
        assert_eq!(restored.link_delay("A", "B").unwrap().get(), 10);
        assert_eq!(restored.bandwidth("A", "B").unwrap().get(), 100);
        assert!((restored.packet_loss("A", "B").unwrap().get() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn configure_mtu_and_queue_size() {
        let net = three_node_chain();
        net.set_mtu("A", 9000).unwrap();
        net.set_max_queue_size("A", 4).unwrap();
        assert_eq!(net.node("A").unwrap().mtu, 9000);
        assert_eq!(net.node("A").unwrap().max_queue_size, 4);
    }

    #[test]
    fn import_rejects_dangling_reference() {
        let net = Network::new(NetworkConfig::default());
        let doc = Snapshot {
            nodes: vec![SnapshotNode {
                name: "A".into(),
                ip: "10.0.0.1".into(),
                kind: "host".into(),
                vlan: None,
                failed: None,
            }],
            connections: vec![("A".into(), "ghost".into())],
            attributes: vec![],
        };
        assert!(net.import_snapshot(&doc).is_err());
    }
}
