use super::{Dijkstra, Oracle, Path};

/// Shortest-delay path from `src` to `dst` that never crosses an edge with bandwidth below
/// `min_bandwidth`. `None` if no such path exists.
pub fn bandwidth_constrained_shortest_path(
    oracle: &dyn Oracle,
    src: &str,
    dst: &str,
    min_bandwidth: i64,
) -> Option<Path> {
    if src == dst {
        return Some(vec![src.to_string()]);
    }
    let dijkstra = Dijkstra::run_filtered(oracle, src, |u, v| oracle.bandwidth(u, v) >= min_bandwidth);
    dijkstra.path_to(src, dst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MapOracle;

    #[test]
    fn routes_around_narrow_shortcut() {
        let oracle = MapOracle::bandwidth_detour();
        let path = bandwidth_constrained_shortest_path(&oracle, "A", "F", 60).unwrap();
        assert!(!path.windows(2).any(|w| (w[0] == "A" && w[1] == "D") || (w[0] == "D" && w[1] == "A")));
        assert_eq!(path.first().unwrap(), "A");
        assert_eq!(path.last().unwrap(), "F");
    }

    #[test]
    fn unconstrained_prefers_the_shortcut() {
        let oracle = MapOracle::bandwidth_detour();
        let path = bandwidth_constrained_shortest_path(&oracle, "A", "F", 0).unwrap();
        assert_eq!(path, vec!["A".to_string(), "D".to_string(), "E".to_string(), "F".to_string()]);
    }
}
