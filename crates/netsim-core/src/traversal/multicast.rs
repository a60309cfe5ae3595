use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};

use super::{reconstruct_path, Oracle, Path};

/// A single BFS sweep from `src` that accumulates a path to every member of `destinations` it
/// reaches. Unreachable destinations are simply absent from the result map. This is the
/// single-source fan-out semantics; it supersedes any design that issues one ping per
/// destination, since that throws away the shared-prefix structure a real spanning tree has.
pub fn multicast_bfs(oracle: &dyn Oracle, src: &str, destinations: &[String]) -> FxHashMap<String, Path> {
    let wanted: FxHashSet<&str> = destinations.iter().map(String::as_str).collect();
    let mut found: FxHashSet<String> = FxHashSet::default();
    let mut visited: FxHashSet<String> = FxHashSet::default();
    visited.insert(src.to_string());
    if wanted.contains(src) {
        found.insert(src.to_string());
    }

    let mut parent: FxHashMap<String, String> = FxHashMap::default();
    let mut queue = VecDeque::new();
    queue.push_back(src.to_string());

    while let Some(u) = queue.pop_front() {
        if found.len() == wanted.len() {
            break;
        }
        for v in oracle.neighbors(&u) {
            if visited.insert(v.clone()) {
                parent.insert(v.clone(), u.clone());
                if wanted.contains(v.as_str()) {
                    found.insert(v.clone());
                }
                queue.push_back(v);
            }
        }
    }

    destinations
        .iter()
        .filter(|d| visited.contains(d.as_str()))
        .map(|d| (d.clone(), reconstruct_path(&parent, src, d)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MapOracle;

    #[test]
    fn reaches_every_connected_destination() {
        let oracle = MapOracle::diamond();
        let dests = vec!["B".to_string(), "C".to_string(), "D".to_string()];
        let result = multicast_bfs(&oracle, "A", &dests);
        assert_eq!(result.len(), 3);
        assert_eq!(result["B"], vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn omits_unreachable_destinations() {
        let mut oracle = MapOracle::diamond();
        oracle.add_isolated("Z");
        let dests = vec!["D".to_string(), "Z".to_string()];
        let result = multicast_bfs(&oracle, "A", &dests);
        assert!(result.contains_key("D"));
        assert!(!result.contains_key("Z"));
    }
}
