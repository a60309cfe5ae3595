use rustc_hash::{FxHashMap, FxHashSet};

use super::{Dijkstra, Oracle, Path};

/// Every neighbor `v` of `node` such that `dist(v) + delay(node, v) == dist(node)`, where `dist`
/// is computed from `dst`. Symmetric on undirected edge weights since `delay` is.
pub fn equal_cost_next_hops(oracle: &dyn Oracle, node: &str, dst: &str) -> Vec<String> {
    let dist = Dijkstra::run(oracle, dst);
    let Some(&d_node) = dist.dist.get(node) else {
        return Vec::new();
    };
    oracle
        .neighbors(node)
        .into_iter()
        .filter(|v| {
            dist.dist
                .get(v)
                .is_some_and(|&d_v| d_v + oracle.delay(node, v) == d_node)
        })
        .collect()
}

/// Up to `k` simple paths from `src` to `dst`, following only edges that lie on some shortest
/// path (per the distance field computed from `dst`). Returns fewer than `k` if the shortest-path
/// DAG doesn't have that many.
pub fn ecmp_k_paths(oracle: &dyn Oracle, src: &str, dst: &str, k: usize) -> Vec<Path> {
    if k == 0 {
        return Vec::new();
    }
    let dist = Dijkstra::run(oracle, dst);
    if !dist.dist.contains_key(src) {
        return Vec::new();
    }
    let mut results = Vec::new();
    let mut path = vec![src.to_string()];
    let mut on_path: FxHashSet<String> = FxHashSet::default();
    on_path.insert(src.to_string());
    walk(oracle, &dist, src, dst, k, &mut path, &mut on_path, &mut results);
    results
}

#[allow(clippy::too_many_arguments)]
fn walk(
    oracle: &dyn Oracle,
    dist: &Dijkstra,
    cur: &str,
    dst: &str,
    k: usize,
    path: &mut Path,
    on_path: &mut FxHashSet<String>,
    results: &mut Vec<Path>,
) {
    if results.len() >= k {
        return;
    }
    if cur == dst {
        results.push(path.clone());
        return;
    }
    let Some(&d_cur) = dist.dist.get(cur) else {
        return;
    };
    for v in oracle.neighbors(cur) {
        if results.len() >= k {
            return;
        }
        if on_path.contains(&v) {
            continue;
        }
        let Some(&d_v) = dist.dist.get(&v) else {
            continue;
        };
        if d_v + oracle.delay(cur, &v) != d_cur {
            continue;
        }
        path.push(v.clone());
        on_path.insert(v.clone());
        walk(oracle, dist, &v, dst, k, path, on_path, results);
        on_path.remove(&v);
        path.pop();
    }
}

/// The link-state next-hop table from `src`: for every reachable destination, the first-hop
/// neighbor on its shortest path.
pub fn link_state_next_hops(oracle: &dyn Oracle, src: &str) -> FxHashMap<String, String> {
    let d = Dijkstra::run(oracle, src);
    let mut table = FxHashMap::default();
    for dest in d.dist.keys() {
        if dest == src {
            continue;
        }
        let mut cur = dest.clone();
        while let Some(p) = d.parent.get(&cur) {
            if p == src {
                break;
            }
            cur = p.clone();
        }
        table.insert(dest.clone(), cur);
    }
    table
}

/// True iff `incoming_neighbor` lies on a shortest path from `src` to `node` — i.e. the packet
/// arrived on the interface a loop-free forwarder would expect.
pub fn is_rpf(oracle: &dyn Oracle, node: &str, incoming_neighbor: &str, src: &str) -> bool {
    let dist = Dijkstra::run(oracle, src);
    match (dist.dist.get(incoming_neighbor), dist.dist.get(node)) {
        (Some(&d_in), Some(&d_node)) => d_in + oracle.delay(incoming_neighbor, node) == d_node,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MapOracle;

    #[test]
    fn diamond_ecmp_next_hops() {
        let oracle = MapOracle::diamond();
        let mut hops = equal_cost_next_hops(&oracle, "A", "D");
        hops.sort();
        assert_eq!(hops, vec!["B".to_string(), "C".to_string()]);
    }

    #[test]
    fn diamond_k_paths() {
        let oracle = MapOracle::diamond();
        let paths = ecmp_k_paths(&oracle, "A", "D", 4);
        assert_eq!(paths.len(), 2);
    }

    #[test]
    fn diamond_k_paths_snapshot() {
        let oracle = MapOracle::diamond();
        let paths = ecmp_k_paths(&oracle, "A", "D", 4);
        insta::assert_yaml_snapshot!(paths, @r###"
        ---
        - - A
          - B
          - D
        - - A
          - C
          - D
        "###);
    }

    #[test]
    fn link_state_table_matches_shortest_hop() {
        let oracle = MapOracle::chain(&["A", "B", "C"], 10);
        let table = link_state_next_hops(&oracle, "A");
        assert_eq!(table["B"], "B");
        assert_eq!(table["C"], "B");
    }

    #[test]
    fn rpf_accepts_shortest_path_neighbor_only() {
        let oracle = MapOracle::chain(&["A", "B", "C"], 10);
        assert!(is_rpf(&oracle, "C", "B", "A"));
        assert!(!is_rpf(&oracle, "C", "C", "A"));
    }
}
