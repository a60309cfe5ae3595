use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};

use super::{reconstruct_path, Oracle, Path};

/// Minimum-edge-count path from `src` to `dst`, or `None` if unreachable. Ties are broken by
/// neighbor-enumeration order, since that's the order BFS explores them in.
pub fn shortest_hops(oracle: &dyn Oracle, src: &str, dst: &str) -> Option<Path> {
    if src == dst {
        return Some(vec![src.to_string()]);
    }
    let mut visited: FxHashSet<String> = FxHashSet::default();
    visited.insert(src.to_string());
    let mut parent: FxHashMap<String, String> = FxHashMap::default();
    let mut queue = VecDeque::new();
    queue.push_back(src.to_string());

    while let Some(u) = queue.pop_front() {
        for v in oracle.neighbors(&u) {
            if visited.insert(v.clone()) {
                parent.insert(v.clone(), u.clone());
                if v == dst {
                    return Some(reconstruct_path(&parent, src, dst));
                }
                queue.push_back(v);
            }
        }
    }
    None
}

/// Any path from `src` to `dst` of length at most `max_depth` edges, preferring the first one
/// found in neighbor-enumeration order. Backtracks on dead ends; a node already on the current
/// path is never revisited.
pub fn bounded_dfs(oracle: &dyn Oracle, src: &str, dst: &str, max_depth: u32) -> Option<Path> {
    let mut visited: FxHashSet<String> = FxHashSet::default();
    visited.insert(src.to_string());
    let mut path = vec![src.to_string()];
    if dfs_visit(oracle, src, dst, max_depth, &mut visited, &mut path) {
        Some(path)
    } else {
        None
    }
}

fn dfs_visit(
    oracle: &dyn Oracle,
    cur: &str,
    dst: &str,
    remaining: u32,
    visited: &mut FxHashSet<String>,
    path: &mut Path,
) -> bool {
    if cur == dst {
        return true;
    }
    if remaining == 0 {
        return false;
    }
    for next in oracle.neighbors(cur) {
        if visited.insert(next.clone()) {
            path.push(next.clone());
            if dfs_visit(oracle, &next, dst, remaining - 1, visited, path) {
                return true;
            }
            path.pop();
            visited.remove(&next);
        }
    }
    false
}
