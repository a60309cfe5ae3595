//! Shared scenario-document fixtures for this crate's tests.

use crate::document::{Scenario, Setup, SetupLink, SetupNode, Step, Validation};

/// The S1 chain-ping scenario from the spec's end-to-end examples: A-B-C, delay 10ms each,
/// a ping step and a connectivity validation.
pub fn chain_ping_scenario() -> Scenario {
    Scenario {
        name: "chain-ping".into(),
        description: "S1: shortest-hops ping across a three-node chain".into(),
        version: "1".into(),
        author: "fixtures".into(),
        tags: vec!["smoke".into()],
        setup: Setup {
            nodes: vec![
                SetupNode { name: "A".into(), kind: "host".into(), ip: "10.0.0.1".into(), vlan: None, config: None },
                SetupNode { name: "B".into(), kind: "router".into(), ip: "10.0.0.2".into(), vlan: None, config: None },
                SetupNode { name: "C".into(), kind: "host".into(), ip: "10.0.0.3".into(), vlan: None, config: None },
            ],
            links: vec![
                SetupLink { from: "A".into(), to: "B".into(), delay_ms: Some(10), bandwidth_mbps: None, packet_loss: None },
                SetupLink { from: "B".into(), to: "C".into(), delay_ms: Some(10), bandwidth_mbps: None, packet_loss: None },
            ],
        },
        steps: vec![Step {
            name: "ping-a-c".into(),
            action: "ping".into(),
            params: serde_json::json!({"from": "A", "to": "C"}),
            expect: serde_json::Value::Null,
        }],
        validation: vec![Validation {
            kind: "connectivity".into(),
            params: serde_json::json!({"a": "A", "b": "C"}),
            threshold: None,
        }],
        expected_outcome: Some("success".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_is_internally_consistent() {
        let scenario = chain_ping_scenario();
        assert_eq!(scenario.setup.nodes.len(), 3);
        assert_eq!(scenario.setup.links.len(), 2);
    }
}
