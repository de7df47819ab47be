//! Configuration drift detection
//!
//! Compares the Git-declared resources of every package assigned to a
//! cluster against what the cluster actually holds. Fields the cluster
//! itself manages are excluded, along with any paths from the configured
//! ignore list. Drift findings are soft: the engine surfaces them as
//! warnings, and remediation is an external concern.

use serde_json::Value;
use slice_core::{ClusterHandle, DesiredStateRepository, Resource};

use crate::Result;

/// Field paths owned by the cluster, never compared.
pub const CLUSTER_MANAGED_PATHS: &[&str] = &[
    "metadata.resourceVersion",
    "metadata.uid",
    "metadata.generation",
    "metadata.creationTimestamp",
    "metadata.managedFields",
    "status",
];

/// One drifted or missing resource field.
#[derive(Debug, Clone)]
pub struct DriftItem {
    /// Package that declared the resource
    pub package: String,
    /// Resource kind
    pub kind: String,
    /// Resource name
    pub name: String,
    /// Resource namespace, if namespaced
    pub namespace: Option<String>,
    /// Dot-path of the drifted field; empty for whole-resource findings
    pub path: String,
    /// Human-readable description of the divergence
    pub description: String,
}

/// Report from one drift scan of one cluster.
#[derive(Debug, Clone, Default)]
pub struct DriftReport {
    /// Declared resources absent from the cluster
    pub missing: Vec<DriftItem>,
    /// Declared fields diverging from observed values
    pub drifted: Vec<DriftItem>,
}

impl DriftReport {
    /// True iff nothing is missing or drifted.
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.drifted.is_empty()
    }
}

/// Scan one cluster for drift across the given packages.
///
/// Unreadable resources are reported as missing rather than failing the
/// scan; only Git access failure aborts.
pub async fn detect_drift(
    handle: &dyn ClusterHandle,
    git: &dyn DesiredStateRepository,
    packages: &[String],
    ignore_fields: &[String],
) -> Result<DriftReport> {
    let mut report = DriftReport::default();

    for package in packages {
        let desired = git.package_content(package).await?;
        for resource in &desired {
            scan_resource(handle, package, resource, ignore_fields, &mut report).await;
        }
    }

    Ok(report)
}

async fn scan_resource(
    handle: &dyn ClusterHandle,
    package: &str,
    desired: &Resource,
    ignore_fields: &[String],
    report: &mut DriftReport,
) {
    let kind = desired.kind().unwrap_or("<unknown>").to_string();
    let name = desired.name().unwrap_or("<unnamed>").to_string();
    let namespace = desired.namespace().map(str::to_string);

    let item = |path: String, description: String| DriftItem {
        package: package.to_string(),
        kind: kind.clone(),
        name: name.clone(),
        namespace: namespace.clone(),
        path,
        description,
    };

    let gvr = match handle
        .resolve_gvr(desired.api_version().unwrap_or(""), &kind)
        .await
    {
        Ok(gvr) => gvr,
        Err(e) => {
            report
                .missing
                .push(item(String::new(), format!("GVR resolution failed: {}", e)));
            return;
        }
    };

    let observed = match handle.get(&gvr, namespace.as_deref(), &name).await {
        Ok(observed) => observed,
        Err(e) if e.is_not_found() => {
            report
                .missing
                .push(item(String::new(), "declared in Git, absent from cluster".to_string()));
            return;
        }
        Err(e) => {
            report
                .missing
                .push(item(String::new(), format!("failed to read: {}", e)));
            return;
        }
    };

    let mut diffs = Vec::new();
    diff_declared(&desired.0, &observed.0, "", ignore_fields, &mut diffs);
    for (path, description) in diffs {
        report.drifted.push(item(path, description));
    }
}

/// Recursively compare declared fields against observed values.
///
/// Only fields present in the declared document are compared; fields the
/// API server adds on its own are not drift. Ignored paths are skipped by
/// prefix match.
fn diff_declared(
    desired: &Value,
    observed: &Value,
    path: &str,
    ignore_fields: &[String],
    diffs: &mut Vec<(String, String)>,
) {
    if is_ignored(path, ignore_fields) {
        return;
    }

    match (desired, observed) {
        (Value::Object(want), Value::Object(have)) => {
            for (key, want_value) in want {
                let child = join_path(path, key);
                match have.get(key) {
                    Some(have_value) => {
                        diff_declared(want_value, have_value, &child, ignore_fields, diffs);
                    }
                    None => {
                        if !is_ignored(&child, ignore_fields) {
                            diffs.push((child, "declared field absent".to_string()));
                        }
                    }
                }
            }
        }
        (Value::Array(want), Value::Array(have)) => {
            if want.len() != have.len() {
                diffs.push((
                    path.to_string(),
                    format!("declared {} elements, observed {}", want.len(), have.len()),
                ));
                return;
            }
            for (i, (want_value, have_value)) in want.iter().zip(have).enumerate() {
                let child = join_path(path, &i.to_string());
                diff_declared(want_value, have_value, &child, ignore_fields, diffs);
            }
        }
        (want, have) => {
            if want != have {
                diffs.push((
                    path.to_string(),
                    format!("declared {}, observed {}", want, have),
                ));
            }
        }
    }
}

fn is_ignored(path: &str, ignore_fields: &[String]) -> bool {
    if path.is_empty() {
        return false;
    }
    CLUSTER_MANAGED_PATHS
        .iter()
        .any(|p| path == *p || path.starts_with(&format!("{}.", p)))
        || ignore_fields
            .iter()
            .any(|p| path == p.as_str() || path.starts_with(&format!("{}.", p)))
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}
