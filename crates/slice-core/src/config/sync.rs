//! Synchronization settings: package groups, dependencies, conflict policy

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

fn default_sync_interval_secs() -> u64 {
    300
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff_secs() -> u64 {
    30
}

fn default_max_concurrent_packages() -> usize {
    4
}

fn default_dependency_wait_timeout_secs() -> u64 {
    300
}

fn default_wait_timeout_secs() -> u64 {
    default_dependency_wait_timeout_secs()
}

/// Top-level synchronization settings document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSettings {
    /// Master switch; `SynchronizeAll` fails fast when disabled
    #[serde(default)]
    pub enabled: bool,
    /// Interval between sync runs, for the external scheduler
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,
    /// Maximum retry count recorded per (package, cluster)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base backoff between retries, seconds; grows exponentially with the
    /// retry count
    #[serde(default = "default_retry_backoff_secs")]
    pub retry_backoff_secs: u64,
    /// Divergence resolution policy
    #[serde(default)]
    pub conflict_strategy: ConflictStrategy,
    /// Concurrency cap for the per-group package fan-out
    #[serde(default = "default_max_concurrent_packages")]
    pub max_concurrent_packages: usize,
    /// Timeout for group-level dependency gates, seconds
    #[serde(default = "default_dependency_wait_timeout_secs")]
    pub dependency_wait_timeout_secs: u64,
    /// Annotation prefixes treated as system-managed during update
    /// comparison, in addition to the built-ins
    #[serde(default)]
    pub ignored_annotation_prefixes: Vec<String>,
    /// Ordered/prioritized package groups
    #[serde(default)]
    pub package_groups: Vec<PackageGroup>,
    /// Package-level dependency declarations
    #[serde(default)]
    pub dependencies: Vec<PackageDependency>,
    /// Health checks evaluated by the external monitor
    #[serde(default)]
    pub health_checks: Vec<HealthCheck>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            sync_interval_secs: default_sync_interval_secs(),
            max_retries: default_max_retries(),
            retry_backoff_secs: default_retry_backoff_secs(),
            conflict_strategy: ConflictStrategy::default(),
            max_concurrent_packages: default_max_concurrent_packages(),
            dependency_wait_timeout_secs: default_dependency_wait_timeout_secs(),
            ignored_annotation_prefixes: Vec::new(),
            package_groups: Vec::new(),
            dependencies: Vec::new(),
            health_checks: Vec::new(),
        }
    }
}

impl SyncSettings {
    /// Parse sync settings from YAML content.
    pub fn parse(content: &str) -> Result<SyncSettings> {
        let settings: SyncSettings = serde_yaml::from_str(content)?;
        settings.validate()?;
        tracing::debug!(
            enabled = settings.enabled,
            groups = settings.package_groups.len(),
            strategy = ?settings.conflict_strategy,
            "parsed sync settings"
        );
        Ok(settings)
    }

    /// Load sync settings from a YAML file.
    pub fn load(path: &Path) -> Result<SyncSettings> {
        tracing::debug!(path = %path.display(), "loading sync settings");
        let content = std::fs::read_to_string(path)?;
        SyncSettings::parse(&content)
    }

    /// Fail fast on settings the sync engine cannot act on.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_packages == 0 {
            return Err(Error::Config {
                message: "maxConcurrentPackages must be at least 1".to_string(),
            });
        }
        let mut seen = std::collections::HashSet::new();
        for group in &self.package_groups {
            if !seen.insert(group.name.as_str()) {
                return Err(Error::Config {
                    message: format!("duplicate package group: {}", group.name),
                });
            }
        }
        for group in &self.package_groups {
            for dep in &group.dependencies {
                if !seen.contains(dep.as_str()) {
                    return Err(Error::Config {
                        message: format!(
                            "group {} depends on unknown group {}",
                            group.name, dep
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    /// Dependency declaration for a package, if any.
    pub fn dependency_for(&self, package: &str) -> Option<&PackageDependency> {
        self.dependencies.iter().find(|d| d.package == package)
    }
}

/// A set of packages sharing priority, ordering, and dependency treatment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageGroup {
    /// Group name; referenced by other groups' dependencies
    pub name: String,
    /// Member package names
    #[serde(default)]
    pub packages: Vec<String>,
    /// Target cluster names
    #[serde(default)]
    pub clusters: Vec<String>,
    /// Higher priority synchronizes earlier
    #[serde(default)]
    pub priority: i32,
    /// Synchronize members strictly in listed order
    #[serde(default)]
    pub sequential: bool,
    /// Group names that must be fully synced first
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// Declares that one package waits for others, independent of grouping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageDependency {
    /// The dependent package
    pub package: String,
    /// Packages that must be synced before it
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// How long to wait for the dependencies, seconds
    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,
}

/// Health check evaluated by the external monitoring collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    pub name: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub interval_secs: u64,
}

/// How divergence between a Git-declared and a cluster-observed resource
/// is resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictStrategy {
    /// Take the Git-declared state (default)
    #[default]
    #[serde(rename = "git-wins")]
    GitWins,
    /// Keep the cluster-observed state, discard the update
    #[serde(rename = "cluster-wins")]
    ClusterWins,
    /// Take the Git-declared content but keep cluster identity fields and
    /// generation
    #[serde(rename = "merge")]
    Merge,
    /// No automatic resolution; the conflict is a hard failure
    #[serde(rename = "manual")]
    Manual,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_documented_values() {
        let settings = SyncSettings::parse("{}").unwrap();
        assert!(!settings.enabled);
        assert_eq!(settings.sync_interval_secs, 300);
        assert_eq!(settings.max_retries, 3);
        assert_eq!(settings.retry_backoff_secs, 30);
        assert_eq!(settings.conflict_strategy, ConflictStrategy::GitWins);
        assert_eq!(settings.max_concurrent_packages, 4);
    }

    #[test]
    fn parse_full_document() {
        let yaml = r#"
enabled: true
conflictStrategy: merge
packageGroups:
  - name: core
    packages: [amf, smf]
    clusters: [central01]
    priority: 20
    sequential: true
  - name: ran
    packages: [upf]
    clusters: [edge01]
    priority: 10
    dependencies: [core]
dependencies:
  - package: upf
    dependsOn: [smf]
    waitTimeoutSecs: 60
"#;
        let settings = SyncSettings::parse(yaml).unwrap();
        assert_eq!(settings.conflict_strategy, ConflictStrategy::Merge);
        assert_eq!(settings.package_groups.len(), 2);
        assert!(settings.package_groups[0].sequential);
        assert_eq!(settings.package_groups[1].dependencies, vec!["core"]);
        let dep = settings.dependency_for("upf").unwrap();
        assert_eq!(dep.depends_on, vec!["smf"]);
        assert_eq!(dep.wait_timeout_secs, 60);
    }

    #[test]
    fn unknown_group_dependency_rejected() {
        let yaml = r#"
packageGroups:
  - name: ran
    dependencies: [missing]
"#;
        let err = SyncSettings::parse(yaml).unwrap_err();
        assert!(format!("{}", err).contains("unknown group"));
    }

    #[rstest::rstest]
    #[case("git-wins", ConflictStrategy::GitWins)]
    #[case("cluster-wins", ConflictStrategy::ClusterWins)]
    #[case("merge", ConflictStrategy::Merge)]
    #[case("manual", ConflictStrategy::Manual)]
    fn conflict_strategy_wire_names(#[case] wire: &str, #[case] expected: ConflictStrategy) {
        let parsed: ConflictStrategy = serde_yaml::from_str(wire).unwrap();
        assert_eq!(parsed, expected);
    }
}
