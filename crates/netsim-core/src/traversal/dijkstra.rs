use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::{FxHashMap, FxHashSet};

use super::{reconstruct_path, Oracle, Path};

/// The result of running Dijkstra from a single source: distances and parent pointers, reusable
/// by every component built on top of shortest-delay routing (ECMP, link-state tables, RPF,
/// multipath, multi-commodity flow).
#[derive(Debug, Default)]
pub struct Dijkstra {
    pub dist: FxHashMap<String, i64>,
    pub parent: FxHashMap<String, String>,
}

impl Dijkstra {
    /// Runs Dijkstra from `src` over every edge the oracle reports.
    pub fn run(oracle: &dyn Oracle, src: &str) -> Self {
        Self::run_filtered(oracle, src, |_, _| true)
    }

    /// Runs Dijkstra from `src`, ignoring any edge `(u, v)` for which `edge_ok(u, v)` is false.
    /// Used by the bandwidth-constrained shortest path and the residual-graph traversals in
    /// multi-commodity flow.
    pub fn run_filtered(oracle: &dyn Oracle, src: &str, edge_ok: impl Fn(&str, &str) -> bool) -> Self {
        let mut dist: FxHashMap<String, i64> = FxHashMap::default();
        let mut parent: FxHashMap<String, String> = FxHashMap::default();
        let mut visited: FxHashSet<String> = FxHashSet::default();
        let mut heap: BinaryHeap<Reverse<(i64, String)>> = BinaryHeap::new();

        dist.insert(src.to_string(), 0);
        heap.push(Reverse((0, src.to_string())));

        while let Some(Reverse((d, u))) = heap.pop() {
            // Lazy deletion: only process the entry if it still reflects the best known
            // distance for u.
            if dist.get(&u).copied() != Some(d) {
                continue;
            }
            if !visited.insert(u.clone()) {
                continue;
            }
            for v in oracle.neighbors(&u) {
                if !edge_ok(&u, &v) {
                    continue;
                }
                let w = oracle.delay(&u, &v);
                let nd = d + w;
                if dist.get(&v).map_or(true, |&cur| nd < cur) {
                    dist.insert(v.clone(), nd);
                    parent.insert(v.clone(), u.clone());
                    heap.push(Reverse((nd, v)));
                }
            }
        }

        Self { dist, parent }
    }

    pub fn path_to(&self, src: &str, dst: &str) -> Option<Path> {
        if !self.dist.contains_key(dst) {
            return None;
        }
        Some(reconstruct_path(&self.parent, src, dst))
    }
}

/// The path from `src` to `dst` minimizing total delay, or `None` if unreachable.
pub fn shortest_delay(oracle: &dyn Oracle, src: &str, dst: &str) -> Option<Path> {
    if src == dst {
        return Some(vec![src.to_string()]);
    }
    Dijkstra::run(oracle, src).path_to(src, dst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MapOracle;

    #[test]
    fn delay_sums_exactly() {
        let oracle = MapOracle::chain(&["A", "B", "C"], 10);
        let path = shortest_delay(&oracle, "A", "C").unwrap();
        assert_eq!(path, vec!["A".to_string(), "B".to_string(), "C".to_string()]);
        let d = Dijkstra::run(&oracle, "A");
        assert_eq!(d.dist["C"], 20);
    }

    #[test]
    fn zero_delay_edges_allowed() {
        let mut oracle = MapOracle::new();
        oracle.add_edge("A", "B", 0, 100);
        let d = Dijkstra::run(&oracle, "A");
        assert_eq!(d.dist["B"], 0);
    }

    #[test]
    fn unreachable_returns_none() {
        let mut oracle = MapOracle::chain(&["A", "B"], 10);
        oracle.add_isolated("Z");
        assert_eq!(shortest_delay(&oracle, "A", "Z"), None);
    }
}
