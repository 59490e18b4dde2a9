//! Resolution of the node a DaemonSet pod is pinned to
//!
//! At admission time `spec.nodeName` is still empty. The DaemonSet controller
//! instead injects a required node affinity term selecting the target node by
//! name:
//!
//! ```yaml
//! affinity:
//!   nodeAffinity:
//!     requiredDuringSchedulingIgnoredDuringExecution:
//!       nodeSelectorTerms:
//!       - matchFields:
//!         - key: metadata.name
//!           operator: In
//!           values:
//!           - ip-10-0-1-156.us-west-2.compute.internal
//! ```

use k8s_openapi::api::core::v1::{NodeSelectorRequirement, NodeSelectorTerm, Pod};

use crate::error::ResolveError;

/// Field selector key naming a node
pub const NODE_NAME_FIELD: &str = "metadata.name";

/// Returns the name of the node the pod's required node affinity pins it to
///
/// Terms and their `matchFields` are scanned in order; the first value of the
/// first `metadata.name` clause wins. A pod without any affinity is treated the
/// same as one whose affinity has no such clause.
pub fn scheduled_node(pod: &Pod) -> Result<String, ResolveError> {
    node_selector_terms(pod)
        .iter()
        .flat_map(|term| term.match_fields.as_deref().unwrap_or_default())
        .find_map(node_name)
        .map(str::to_owned)
        .ok_or(ResolveError::NodeNotFound)
}

fn node_selector_terms(pod: &Pod) -> &[NodeSelectorTerm] {
    pod.spec
        .as_ref()
        .and_then(|spec| spec.affinity.as_ref())
        .and_then(|affinity| affinity.node_affinity.as_ref())
        .and_then(|node_affinity| {
            node_affinity
                .required_during_scheduling_ignored_during_execution
                .as_ref()
        })
        .map(|selector| selector.node_selector_terms.as_slice())
        .unwrap_or_default()
}

// clauses without values cannot name a node, keep scanning
fn node_name(requirement: &NodeSelectorRequirement) -> Option<&str> {
    if requirement.key != NODE_NAME_FIELD {
        return None;
    }

    requirement
        .values
        .as_deref()
        .and_then(<[_]>::first)
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pod(affinity: serde_json::Value) -> Pod {
        serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": { "name": "node-exporter-4tq9z", "namespace": "monitoring" },
            "spec": {
                "containers": [{ "name": "exporter", "image": "prom/node-exporter" }],
                "affinity": affinity,
            }
        }))
        .unwrap()
    }

    fn pinned_to(values: serde_json::Value) -> serde_json::Value {
        json!({
            "nodeAffinity": {
                "requiredDuringSchedulingIgnoredDuringExecution": {
                    "nodeSelectorTerms": [{
                        "matchFields": [{
                            "key": "metadata.name",
                            "operator": "In",
                            "values": values
                        }]
                    }]
                }
            }
        })
    }

    #[test]
    fn test_resolves_pinned_node() {
        let pod = pod(pinned_to(json!(["node-a"])));
        assert_eq!(scheduled_node(&pod).unwrap(), "node-a");
    }

    #[test]
    fn test_first_value_wins() {
        let pod = pod(pinned_to(json!(["node-a", "node-b"])));
        assert_eq!(scheduled_node(&pod).unwrap(), "node-a");
    }

    #[test]
    fn test_scans_later_terms_and_fields() {
        let pod = pod(json!({
            "nodeAffinity": {
                "requiredDuringSchedulingIgnoredDuringExecution": {
                    "nodeSelectorTerms": [
                        {
                            "matchExpressions": [{
                                "key": "kubernetes.io/os",
                                "operator": "In",
                                "values": ["linux"]
                            }]
                        },
                        {
                            "matchFields": [
                                { "key": "metadata.namespace", "operator": "In", "values": ["x"] },
                                { "key": "metadata.name", "operator": "In", "values": ["ip-10-0-1-156"] }
                            ]
                        },
                        {
                            "matchFields": [
                                { "key": "metadata.name", "operator": "In", "values": ["ip-10-0-9-9"] }
                            ]
                        }
                    ]
                }
            }
        }));

        assert_eq!(scheduled_node(&pod).unwrap(), "ip-10-0-1-156");
    }

    #[test]
    fn test_clause_without_values_is_skipped() {
        let pod = pod(json!({
            "nodeAffinity": {
                "requiredDuringSchedulingIgnoredDuringExecution": {
                    "nodeSelectorTerms": [
                        { "matchFields": [{ "key": "metadata.name", "operator": "Exists" }] },
                        { "matchFields": [{ "key": "metadata.name", "operator": "In", "values": [] }] },
                        { "matchFields": [{ "key": "metadata.name", "operator": "In", "values": ["node-c"] }] }
                    ]
                }
            }
        }));

        assert_eq!(scheduled_node(&pod).unwrap(), "node-c");
    }

    #[test]
    fn test_missing_affinity_is_not_found() {
        let pod = pod(serde_json::Value::Null);
        assert_eq!(scheduled_node(&pod), Err(ResolveError::NodeNotFound));

        assert_eq!(scheduled_node(&Pod::default()), Err(ResolveError::NodeNotFound));
    }

    #[test]
    fn test_absent_at_any_level_is_not_found() {
        for affinity in [
            json!({}),
            json!({ "nodeAffinity": {} }),
            json!({ "nodeAffinity": { "requiredDuringSchedulingIgnoredDuringExecution": { "nodeSelectorTerms": [] } } }),
            json!({ "nodeAffinity": { "requiredDuringSchedulingIgnoredDuringExecution": { "nodeSelectorTerms": [{}] } } }),
        ] {
            assert_eq!(
                scheduled_node(&pod(affinity.clone())),
                Err(ResolveError::NodeNotFound),
                "affinity: {affinity}"
            );
        }
    }

    #[test]
    fn test_other_field_keys_are_ignored() {
        let pod = pod(json!({
            "nodeAffinity": {
                "requiredDuringSchedulingIgnoredDuringExecution": {
                    "nodeSelectorTerms": [{
                        "matchFields": [{ "key": "metadata.uid", "operator": "In", "values": ["node-a"] }]
                    }]
                }
            }
        }));

        assert_eq!(scheduled_node(&pod), Err(ResolveError::NodeNotFound));
    }
}
