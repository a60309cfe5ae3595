//! The traversal kernel: pure functions over a four-method [`Oracle`], never mutating, never
//! failing on mere unreachability. Every public function here can be fed a synthetic oracle in
//! tests, entirely decoupled from [`crate::graph::Network`].

mod constrained;
mod dijkstra;
mod ecmp;
mod flood;
mod flow;
mod multicast;
mod shortest_hops;

pub use constrained::bandwidth_constrained_shortest_path;
pub use dijkstra::{shortest_delay, Dijkstra};
pub use ecmp::{ecmp_k_paths, equal_cost_next_hops, is_rpf, link_state_next_hops};
pub use flood::probabilistic_flood;
pub use flow::{multi_commodity_flow, multipath_flow_aware, CommodityDemand, CommodityResult, WeightedPath};
pub use multicast::multicast_bfs;
pub use shortest_hops::{bounded_dfs, shortest_hops};

pub use crate::graph::oracle::Oracle;

/// A path from source to destination, inclusive of both endpoints.
pub type Path = Vec<String>;

pub(crate) fn reconstruct_path(
    parent: &rustc_hash::FxHashMap<String, String>,
    src: &str,
    dst: &str,
) -> Path {
    let mut path = vec![dst.to_string()];
    let mut cur = dst.to_string();
    while cur != src {
        match parent.get(&cur) {
            Some(p) => {
                path.push(p.clone());
                cur = p.clone();
            }
            None => break,
        }
    }
    path.reverse();
    path
}
