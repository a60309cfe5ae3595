//! Validator dispatch: each validation kind inspects the network after the last step and
//! produces a `(passed, message, details)` record. A validator never aborts the run — a failure
//! to even parse its own parameters is reported as `passed: false`, the same as a failed check.

use netsim_core::traversal::shortest_hops;
use netsim_core::Network;
use serde::Deserialize;

use crate::document::Validation;
use crate::executor::ValidationResult;

#[derive(Debug, Default, Deserialize)]
struct EndpointParams {
    #[serde(default, alias = "from")]
    a: Option<String>,
    #[serde(default, alias = "to")]
    b: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VlanParams {
    same_vlan: (String, String),
    different_vlan: (String, String),
}

fn fail(kind: &str, message: impl Into<String>) -> ValidationResult {
    ValidationResult {
        kind: kind.to_string(),
        passed: false,
        message: message.into(),
        details: serde_json::Value::Null,
    }
}

fn endpoints(kind: &str, params: &serde_json::Value) -> Result<(String, String), ValidationResult> {
    let parsed: EndpointParams =
        serde_json::from_value(params.clone()).map_err(|e| fail(kind, format!("malformed parameters: {e}")))?;
    match (parsed.a, parsed.b) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(fail(kind, "expected both endpoints (a/b or from/to)")),
    }
}

/// Runs `validation` against `network` and returns its result. Dispatches on
/// `connectivity`/`isolation`/`latency`/`packet_loss`/`throughput`/`vlan`; an unrecognized kind
/// fails rather than panicking.
pub fn evaluate(network: &Network, validation: &Validation) -> ValidationResult {
    match validation.kind.as_str() {
        "connectivity" => connectivity(network, validation, true),
        "isolation" => connectivity(network, validation, false),
        "latency" => threshold_check(network, validation, "latency", |n, a, b| n.link_delay(a, b).map(|d| d.get() as f64)),
        "packet_loss" => threshold_check(network, validation, "packet_loss", |n, a, b| n.packet_loss(a, b).map(|l| l.get())),
        "throughput" => throughput(network, validation),
        "vlan" => vlan(network, validation),
        other => fail(other, format!("unknown validator kind: {other}")),
    }
}

fn connectivity(network: &Network, validation: &Validation, want_reachable: bool) -> ValidationResult {
    let (a, b) = match endpoints(&validation.kind, &validation.params) {
        Ok(pair) => pair,
        Err(result) => return result,
    };
    let reachable = network.query(|oracle| shortest_hops(oracle, &a, &b).is_some());
    let passed = reachable == want_reachable;
    let message = if passed {
        format!("{a} -> {b}: reachable={reachable} as expected")
    } else {
        format!("{a} -> {b}: reachable={reachable}, expected {want_reachable}")
    };
    ValidationResult {
        kind: validation.kind.clone(),
        passed,
        message,
        details: serde_json::json!({ "a": a, "b": b, "reachable": reachable }),
    }
}

fn threshold_check(
    network: &Network,
    validation: &Validation,
    name: &str,
    lookup: impl Fn(&Network, &str, &str) -> Result<f64, netsim_core::GraphError>,
) -> ValidationResult {
    let (a, b) = match endpoints(&validation.kind, &validation.params) {
        Ok(pair) => pair,
        Err(result) => return result,
    };
    let Some(threshold) = validation.threshold else {
        return fail(name, "threshold is required");
    };
    match lookup(network, &a, &b) {
        Ok(value) => {
            let passed = value <= threshold;
            ValidationResult {
                kind: validation.kind.clone(),
                passed,
                message: format!("{name}({a}, {b}) = {value}, threshold <= {threshold}"),
                details: serde_json::json!({ "a": a, "b": b, "value": value, "threshold": threshold }),
            }
        }
        Err(e) => fail(name, e.to_string()),
    }
}

fn throughput(network: &Network, validation: &Validation) -> ValidationResult {
    let (a, b) = match endpoints(&validation.kind, &validation.params) {
        Ok(pair) => pair,
        Err(result) => return result,
    };
    let Some(threshold) = validation.threshold else {
        return fail("throughput", "threshold is required");
    };
    let traffic = network.link_traffic(&a, &b) as f64;
    let passed = traffic >= threshold;
    ValidationResult {
        kind: validation.kind.clone(),
        passed,
        message: format!("throughput({a}, {b}) = {traffic}, threshold >= {threshold}"),
        details: serde_json::json!({ "a": a, "b": b, "traffic": traffic, "threshold": threshold }),
    }
}

fn vlan(network: &Network, validation: &Validation) -> ValidationResult {
    let parsed: VlanParams = match serde_json::from_value(validation.params.clone()) {
        Ok(p) => p,
        Err(e) => return fail("vlan", format!("malformed parameters: {e}")),
    };
    let same_ok = network.can_communicate(&parsed.same_vlan.0, &parsed.same_vlan.1);
    let diff_ok = network.can_communicate(&parsed.different_vlan.0, &parsed.different_vlan.1);
    match (same_ok, diff_ok) {
        (Ok(same_reaches), Ok(diff_reaches)) => {
            let passed = same_reaches && !diff_reaches;
            ValidationResult {
                kind: validation.kind.clone(),
                passed,
                message: format!("same-VLAN reaches={same_reaches}, different-VLAN reaches={diff_reaches}"),
                details: serde_json::json!({ "same_vlan_reaches": same_reaches, "different_vlan_reaches": diff_reaches }),
            }
        }
        (Err(e), _) | (_, Err(e)) => fail("vlan", e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netsim_core::{NetworkConfig, NodeKind};

    fn net() -> Network {
        let net = Network::new(NetworkConfig::default());
        net.add_node("A", NodeKind::Host, "10.0.0.1").unwrap();
        net.add_node("B", NodeKind::Host, "10.0.0.2").unwrap();
        net.connect("A", "B").unwrap();
        net.set_link_delay("A", "B", 10).unwrap();
        net
    }

    #[test]
    fn connectivity_passes_when_reachable() {
        let n = net();
        let v = Validation {
            kind: "connectivity".into(),
            params: serde_json::json!({"a": "A", "b": "B"}),
            threshold: None,
        };
        assert!(evaluate(&n, &v).passed);
    }

    #[test]
    fn isolation_fails_when_reachable() {
        let n = net();
        let v = Validation {
            kind: "isolation".into(),
            params: serde_json::json!({"a": "A", "b": "B"}),
            threshold: None,
        };
        assert!(!evaluate(&n, &v).passed);
    }

    #[test]
    fn latency_threshold() {
        let n = net();
        let v = Validation {
            kind: "latency".into(),
            params: serde_json::json!({"a": "A", "b": "B"}),
            threshold: Some(20.0),
        };
        assert!(evaluate(&n, &v).passed);
        let v2 = Validation {
            kind: "latency".into(),
            params: serde_json::json!({"a": "A", "b": "B"}),
            threshold: Some(5.0),
        };
        assert!(!evaluate(&n, &v2).passed);
    }

    #[test]
    fn vlan_validator_checks_both_pairs() {
        let n = Network::new(NetworkConfig::default());
        n.add_node("A", NodeKind::Host, "10.0.0.1").unwrap();
        n.add_node("B", NodeKind::Host, "10.0.0.2").unwrap();
        n.add_node("C", NodeKind::Host, "10.0.0.3").unwrap();
        n.assign_vlan("A", Some(10)).unwrap();
        n.assign_vlan("B", Some(10)).unwrap();
        n.assign_vlan("C", Some(20)).unwrap();
        let v = Validation {
            kind: "vlan".into(),
            params: serde_json::json!({"same_vlan": ["A", "B"], "different_vlan": ["A", "C"]}),
            threshold: None,
        };
        assert!(evaluate(&n, &v).passed);
    }
}
