//! Builders for common resource documents

use serde_json::json;
use slice_core::Resource;

/// An apps/v1 Deployment with the given replica counts.
pub fn deployment(name: &str, namespace: &str, replicas: i64, ready_replicas: i64) -> Resource {
    Resource(json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "labels": {"app": name},
        },
        "spec": {"replicas": replicas},
        "status": {"readyReplicas": ready_replicas},
    }))
}

/// A v1 Service.
pub fn service(name: &str, namespace: &str) -> Resource {
    Resource(json!({
        "apiVersion": "v1",
        "kind": "Service",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "labels": {"app": name},
        },
        "spec": {"type": "ClusterIP", "ports": [{"port": 80}]},
    }))
}

/// A v1 Pod in the given phase.
pub fn pod(name: &str, namespace: &str, phase: &str) -> Resource {
    Resource(json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": {"name": name, "namespace": namespace},
        "status": {"phase": phase},
    }))
}

/// A v1 ConfigMap with one data entry.
pub fn config_map(name: &str, namespace: &str, key: &str, value: &str) -> Resource {
    Resource(json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": {"name": name, "namespace": namespace},
        "data": {key: value},
    }))
}
