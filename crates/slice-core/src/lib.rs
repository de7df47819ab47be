//! Shared foundation for the slice-manager reconciliation core
//!
//! This crate provides everything the two engines have in common:
//!
//! - **Resource model**: schemaless [`Resource`] documents and [`Gvr`]
//!   typing for dynamic cluster access
//! - **Collaborator seams**: [`ClusterHandle`], [`DesiredStateRepository`],
//!   [`PackageValidator`], and [`MetricsCollector`] traits behind which the
//!   cluster clients, Git access, package rendering, and measurement live
//! - **Configuration schema**: the platform and sync YAML documents
//!
//! # Architecture
//!
//! `slice-core` sits below the engine crates:
//!
//! ```text
//!   slice-validation   slice-sync
//!            \             /
//!             \           /
//!              slice-core
//! ```

pub mod cluster;
pub mod config;
pub mod error;
pub mod git;
pub mod ports;
pub mod resource;

pub use cluster::{ClusterDescriptor, ClusterHandle, ClusterType};
pub use config::{
    ConflictStrategy, DriftDetectionConfig, DriftTolerance, FieldAssertion, FieldCondition,
    GitConfig, HealthCheck, MonitoringConfig, NephioConfig, PackageDependency, PackageGroup,
    PerformanceThresholds, PlatformConfig, RemediationAction, ResourceRule, RollbackConfig,
    SyncSettings, ValidationSettings,
};
pub use error::{Error, Result};
pub use git::{DesiredStateRepository, GitSyncStatus};
pub use ports::{MetricsCollector, PackageValidator, PerformanceSample};
pub use resource::{Gvr, Resource};

/// Parse a `k=v,k2=v2` label selector into key/value pairs.
///
/// Empty selectors yield an empty list. Whitespace around keys and values
/// is trimmed; entries without `=` are ignored.
pub fn parse_label_selector(selector: &str) -> Vec<(String, String)> {
    selector
        .split(',')
        .filter_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            let (k, v) = (k.trim(), v.trim());
            if k.is_empty() {
                return None;
            }
            Some((k.to_string(), v.to_string()))
        })
        .collect()
}

/// Whether a resource's labels satisfy a parsed selector.
pub fn selector_matches(resource: &Resource, selector: &[(String, String)]) -> bool {
    selector.iter().all(|(k, v)| {
        resource
            .labels()
            .and_then(|labels| labels.get(k))
            .and_then(serde_json::Value::as_str)
            == Some(v.as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn selector_parsing_trims_and_skips_malformed() {
        assert_eq!(
            parse_label_selector("app=upf, tier = ran,malformed"),
            vec![
                ("app".to_string(), "upf".to_string()),
                ("tier".to_string(), "ran".to_string()),
            ]
        );
        assert!(parse_label_selector("").is_empty());
    }

    #[test]
    fn selector_matching_requires_all_pairs() {
        let resource = Resource(json!({
            "metadata": {"labels": {"app": "upf", "tier": "ran"}}
        }));
        let both = parse_label_selector("app=upf,tier=ran");
        let wrong = parse_label_selector("app=upf,tier=core");
        assert!(selector_matches(&resource, &both));
        assert!(!selector_matches(&resource, &wrong));
        assert!(selector_matches(&resource, &[]));
    }
}
