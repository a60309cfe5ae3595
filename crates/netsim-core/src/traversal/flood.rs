use rustc_hash::FxHashSet;
use rand::Rng;
use rand::rngs::StdRng;

use super::Oracle;

/// The default independent-forward probability used by callers that don't override it, matching
/// the original prototype's flood routine.
pub const DEFAULT_FORWARD_PROB: f64 = 0.8;

/// A stochastic reachability sweep: starting from `src`, each edge is independently forwarded
/// across with probability `forward_prob`, using `rng` as the sole source of randomness (no
/// hidden global generator). Returns the set of nodes reached, including `src` itself. Distinct
/// from [`super::multicast_bfs`], which is deterministic and produces actual paths — this only
/// estimates gossip-style reachability.
pub fn probabilistic_flood(
    oracle: &dyn Oracle,
    src: &str,
    forward_prob: f64,
    rng: &mut StdRng,
) -> FxHashSet<String> {
    let mut reached: FxHashSet<String> = FxHashSet::default();
    reached.insert(src.to_string());
    let mut frontier = vec![src.to_string()];

    while let Some(u) = frontier.pop() {
        for v in oracle.neighbors(&u) {
            if reached.contains(&v) {
                continue;
            }
            if rng.gen::<f64>() < forward_prob {
                reached.insert(v.clone());
                frontier.push(v);
            }
        }
    }
    reached
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MapOracle;
    use rand::SeedableRng;

    #[test]
    fn forward_prob_one_reaches_everything_connected() {
        let oracle = MapOracle::chain(&["A", "B", "C", "D"], 10);
        let mut rng = StdRng::seed_from_u64(0);
        let reached = probabilistic_flood(&oracle, "A", 1.0, &mut rng);
        assert_eq!(reached.len(), 4);
    }

    #[test]
    fn forward_prob_zero_reaches_only_source() {
        let oracle = MapOracle::chain(&["A", "B", "C"], 10);
        let mut rng = StdRng::seed_from_u64(0);
        let reached = probabilistic_flood(&oracle, "A", 0.0, &mut rng);
        assert_eq!(reached.len(), 1);
        assert!(reached.contains("A"));
    }

    #[test]
    fn deterministic_given_same_seed() {
        let oracle = MapOracle::diamond();
        let mut rng1 = StdRng::seed_from_u64(42);
        let mut rng2 = StdRng::seed_from_u64(42);
        let r1 = probabilistic_flood(&oracle, "A", 0.5, &mut rng1);
        let r2 = probabilistic_flood(&oracle, "A", 0.5, &mut rng2);
        assert_eq!(r1, r2);
    }
}
