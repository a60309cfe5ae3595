//! Synthetic oracles and fixtures for exercising the traversal kernel without a [`crate::graph::Network`]
//! behind it.

use rustc_hash::FxHashMap;

use crate::graph::Oracle;

/// A small in-memory [`Oracle`] built directly from edge lists, for unit-testing traversal
/// functions in isolation.
#[derive(Debug, Default, Clone)]
pub struct MapOracle {
    adjacency: FxHashMap<String, Vec<String>>,
    delay: FxHashMap<(String, String), i64>,
    bandwidth: FxHashMap<(String, String), i64>,
    loss: FxHashMap<(String, String), f64>,
}

impl MapOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_isolated(&mut self, name: &str) -> &mut Self {
        self.adjacency.entry(name.to_string()).or_default();
        self
    }

    pub fn add_edge(&mut self, a: &str, b: &str, delay: i64, bandwidth: i64) -> &mut Self {
        self.adjacency.entry(a.to_string()).or_default().push(b.to_string());
        self.adjacency.entry(b.to_string()).or_default().push(a.to_string());
        self.delay.insert((a.to_string(), b.to_string()), delay);
        self.delay.insert((b.to_string(), a.to_string()), delay);
        self.bandwidth.insert((a.to_string(), b.to_string()), bandwidth);
        self.bandwidth.insert((b.to_string(), a.to_string()), bandwidth);
        self
    }

    pub fn set_loss(&mut self, a: &str, b: &str, loss: f64) -> &mut Self {
        self.loss.insert((a.to_string(), b.to_string()), loss);
        self.loss.insert((b.to_string(), a.to_string()), loss);
        self
    }

    /// A linear chain `names[0] - names[1] - ... - names[n]`, uniform delay, bandwidth 100.
    pub fn chain(names: &[&str], delay: i64) -> Self {
        let mut o = Self::new();
        for w in names.windows(2) {
            o.add_edge(w[0], w[1], delay, 100);
        }
        o
    }

    /// The diamond from S2: A-B(10), A-C(10), B-D(10), C-D(10).
    pub fn diamond() -> Self {
        let mut o = Self::new();
        o.add_edge("A", "B", 10, 100);
        o.add_edge("A", "C", 10, 100);
        o.add_edge("B", "D", 10, 100);
        o.add_edge("C", "D", 10, 100);
        o
    }

    /// The bandwidth-detour topology from S3: A,B,C,D,E,F with a cheap-but-narrow A-D shortcut.
    pub fn bandwidth_detour() -> Self {
        let mut o = Self::new();
        o.add_edge("A", "D", 5, 50);
        o.add_edge("D", "E", 10, 100);
        o.add_edge("E", "F", 20, 100);
        o.add_edge("A", "B", 10, 100);
        o.add_edge("B", "C", 10, 100);
        o.add_edge("C", "F", 15, 100);
        o.add_edge("B", "E", 5, 100);
        o
    }
}

impl Oracle for MapOracle {
    fn neighbors(&self, node: &str) -> Vec<String> {
        self.adjacency.get(node).cloned().unwrap_or_default()
    }

    fn delay(&self, a: &str, b: &str) -> i64 {
        *self.delay.get(&(a.to_string(), b.to_string())).unwrap_or(&0)
    }

    fn bandwidth(&self, a: &str, b: &str) -> i64 {
        *self.bandwidth.get(&(a.to_string(), b.to_string())).unwrap_or(&0)
    }

    fn loss(&self, a: &str, b: &str) -> f64 {
        *self.loss.get(&(a.to_string(), b.to_string())).unwrap_or(&0.0)
    }
}
