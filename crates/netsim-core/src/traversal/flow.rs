use rustc_hash::FxHashMap;

use super::{Dijkstra, Oracle, Path};

/// One path in a multipath split, with its normalized share of the total flow.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedPath {
    pub path: Path,
    pub weight: f64,
}

/// A single (source, destination, demand) commodity to route.
#[derive(Debug, Clone)]
pub struct CommodityDemand {
    pub src: String,
    pub dst: String,
    pub demand: i64,
}

/// The outcome of greedily routing one commodity: the paths used and any demand left unserved.
#[derive(Debug, Clone)]
pub struct CommodityResult {
    pub key: String,
    pub paths: Vec<(Path, i64)>,
    pub remaining_demand: i64,
}

/// Iteratively finds up to `k` shortest-delay paths from `src` to `dst`, banning every directed
/// edge of a path once used so later iterations route around it, recording each path's bottleneck
/// bandwidth. Stops early if `dst` becomes unreachable or the current bottleneck is zero. The
/// returned weights are each path's bottleneck normalized to sum to 1.0, falling back to a
/// uniform split if every bottleneck happened to be zero.
pub fn multipath_flow_aware(oracle: &dyn Oracle, src: &str, dst: &str, k: usize) -> Vec<WeightedPath> {
    let mut banned: std::collections::HashSet<(String, String)> = std::collections::HashSet::new();
    let mut collected: Vec<(Path, i64)> = Vec::new();

    for _ in 0..k {
        let dijkstra =
            Dijkstra::run_filtered(oracle, src, |u, v| !banned.contains(&(u.to_string(), v.to_string())));
        let Some(path) = dijkstra.path_to(src, dst) else {
            break;
        };
        let bottleneck = path
            .windows(2)
            .map(|w| oracle.bandwidth(&w[0], &w[1]))
            .min()
            .unwrap_or(0);
        if bottleneck <= 0 {
            break;
        }
        for w in path.windows(2) {
            banned.insert((w[0].clone(), w[1].clone()));
        }
        collected.push((path, bottleneck));
    }

    let total: i64 = collected.iter().map(|(_, b)| b).sum();
    let n = collected.len();
    collected
        .into_iter()
        .map(|(path, b)| {
            let weight = if total > 0 {
                b as f64 / total as f64
            } else {
                1.0 / n.max(1) as f64
            };
            WeightedPath { path, weight }
        })
        .collect()
}

/// Greedily routes every commodity in `commodities`, in order, over a shared directed residual
/// capacity map seeded lazily from the oracle's undirected bandwidths. Each commodity gets up to
/// `k` augmenting paths; commodities are never revisited once their turn passes (no
/// back-pressure between commodities — that's the "greedy" in greedy multi-commodity flow).
pub fn multi_commodity_flow(
    oracle: &dyn Oracle,
    commodities: &[CommodityDemand],
    k: usize,
) -> Vec<CommodityResult> {
    let mut residual: FxHashMap<(String, String), i64> = FxHashMap::default();
    let mut residual_of = |residual: &mut FxHashMap<(String, String), i64>, u: &str, v: &str| -> i64 {
        *residual
            .entry((u.to_string(), v.to_string()))
            .or_insert_with(|| oracle.bandwidth(u, v))
    };

    let mut results = Vec::with_capacity(commodities.len());
    for c in commodities {
        let mut remaining = c.demand;
        let mut paths = Vec::new();

        for _ in 0..k {
            if remaining <= 0 {
                break;
            }
            let dijkstra = Dijkstra::run_filtered(oracle, &c.src, |u, v| {
                residual
                    .get(&(u.to_string(), v.to_string()))
                    .copied()
                    .unwrap_or_else(|| oracle.bandwidth(u, v))
                    > 0
            });
            let Some(path) = dijkstra.path_to(&c.src, &c.dst) else {
                break;
            };
            let min_residual = path
                .windows(2)
                .map(|w| residual_of(&mut residual, &w[0], &w[1]))
                .min()
                .unwrap_or(0);
            let assigned = remaining.min(min_residual);
            if assigned <= 0 {
                break;
            }
            for w in path.windows(2) {
                let r = residual
                    .entry((w[0].clone(), w[1].clone()))
                    .or_insert_with(|| oracle.bandwidth(&w[0], &w[1]));
                *r = (*r - assigned).max(0);
            }
            remaining -= assigned;
            paths.push((path, assigned));
        }

        results.push(CommodityResult {
            key: format!("{}->{}", c.src, c.dst),
            paths,
            remaining_demand: remaining,
        });
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MapOracle;

    #[test]
    fn multipath_weights_sum_to_one() {
        let oracle = MapOracle::diamond();
        let weighted = multipath_flow_aware(&oracle, "A", "D", 4);
        assert!(!weighted.is_empty());
        let total: f64 = weighted.iter().map(|w| w.weight).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn multi_commodity_respects_capacity() {
        let oracle = MapOracle::diamond();
        let commodities = vec![CommodityDemand {
            src: "A".into(),
            dst: "D".into(),
            demand: 1000,
        }];
        let results = multi_commodity_flow(&oracle, &commodities, 4);
        let mut used: FxHashMap<(String, String), i64> = FxHashMap::default();
        for r in &results {
            for (path, assigned) in &r.paths {
                for w in path.windows(2) {
                    *used.entry((w[0].clone(), w[1].clone())).or_insert(0) += assigned;
                }
            }
        }
        for ((a, b), amount) in used {
            assert!(amount <= oracle.bandwidth(&a, &b));
        }
    }
}
