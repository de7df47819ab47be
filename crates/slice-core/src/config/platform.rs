//! Platform configuration: clusters, Git source, validation rules

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cluster::ClusterDescriptor;
use crate::{Error, Result};

fn default_readiness_timeout_secs() -> u64 {
    600
}

fn default_render_timeout_secs() -> u64 {
    300
}

fn default_drift_check_interval_secs() -> u64 {
    30
}

/// Top-level platform configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformConfig {
    /// Target clusters
    #[serde(default)]
    pub clusters: Vec<ClusterDescriptor>,
    /// Desired-state repository settings
    #[serde(default)]
    pub git: GitConfig,
    /// Nephio/Porch package pipeline settings
    #[serde(default)]
    pub nephio: NephioConfig,
    /// Validation rules and thresholds
    #[serde(default)]
    pub validation: ValidationSettings,
    /// Monitoring section (consumed by the presentation layer)
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    /// Rollback section (execution external; parsed for completeness)
    #[serde(default)]
    pub rollback: RollbackConfig,
    /// Configuration-drift detection settings
    #[serde(default)]
    pub drift_detection: DriftDetectionConfig,
    /// Free-form performance section passed through to collectors
    #[serde(default)]
    pub performance: HashMap<String, Value>,
}

impl PlatformConfig {
    /// Parse a platform configuration from YAML content.
    pub fn parse(content: &str) -> Result<PlatformConfig> {
        let config: PlatformConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        tracing::debug!(
            clusters = config.clusters.len(),
            rules = config.validation.required_resources.len(),
            drift_detection = config.drift_detection.enabled,
            "parsed platform configuration"
        );
        Ok(config)
    }

    /// Load a platform configuration from a YAML file.
    pub fn load(path: &Path) -> Result<PlatformConfig> {
        tracing::debug!(path = %path.display(), "loading platform configuration");
        let content = std::fs::read_to_string(path)?;
        PlatformConfig::parse(&content)
    }

    /// Fail fast on configuration the engines cannot act on.
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for cluster in &self.clusters {
            if cluster.name.is_empty() {
                return Err(Error::Config {
                    message: "cluster with empty name".to_string(),
                });
            }
            if !seen.insert(cluster.name.as_str()) {
                return Err(Error::Config {
                    message: format!("duplicate cluster name: {}", cluster.name),
                });
            }
        }
        Ok(())
    }

    /// Descriptor for a named cluster, if configured.
    pub fn cluster(&self, name: &str) -> Option<&ClusterDescriptor> {
        self.clusters.iter().find(|c| c.name == name)
    }
}

/// Desired-state repository settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitConfig {
    /// Repository URL
    #[serde(default)]
    pub repo_url: String,
    /// Branch holding rendered packages
    #[serde(default)]
    pub branch: String,
    /// Path within the repository
    #[serde(default)]
    pub path: String,
    /// Reference to authentication material (secret name, credential helper)
    #[serde(default)]
    pub auth: String,
}

/// Nephio/Porch package pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NephioConfig {
    /// Porch server reference
    #[serde(default)]
    pub server: String,
    /// Package repositories registered with the server
    #[serde(default)]
    pub repositories: Vec<String>,
    /// Package name → path overrides
    #[serde(default)]
    pub package_paths: HashMap<String, String>,
    /// Render timeout in seconds
    #[serde(default = "default_render_timeout_secs")]
    pub render_timeout_secs: u64,
}

impl Default for NephioConfig {
    fn default() -> Self {
        Self {
            server: String::new(),
            repositories: Vec::new(),
            package_paths: HashMap::new(),
            render_timeout_secs: default_render_timeout_secs(),
        }
    }
}

/// Validation rules and thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSettings {
    /// Resources that must exist and be checked per cluster
    #[serde(default)]
    pub required_resources: Vec<ResourceRule>,
    /// Readiness timeout in seconds
    #[serde(default = "default_readiness_timeout_secs")]
    pub readiness_timeout_secs: u64,
    /// Drift tolerance band
    #[serde(default)]
    pub drift_tolerance: DriftTolerance,
    /// Performance ceilings and targets
    #[serde(default)]
    pub performance_thresholds: PerformanceThresholds,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            required_resources: Vec::new(),
            readiness_timeout_secs: default_readiness_timeout_secs(),
            drift_tolerance: DriftTolerance::default(),
            performance_thresholds: PerformanceThresholds::default(),
        }
    }
}

/// Declares which resources must exist in a cluster and what to assert on
/// them. Static configuration; evaluated by the validation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRule {
    /// Target apiVersion, e.g. "apps/v1"
    pub api_version: String,
    /// Target kind, e.g. "Deployment"
    pub kind: String,
    /// Restrict to a single resource name
    #[serde(default)]
    pub name: Option<String>,
    /// Restrict to a namespace
    #[serde(default)]
    pub namespace: Option<String>,
    /// `k=v,k2=v2` label selector
    #[serde(default)]
    pub label_selector: Option<String>,
    /// Field-level assertions evaluated against each matched resource
    #[serde(default)]
    pub field_assertions: Vec<FieldAssertion>,
}

/// One field-level assertion within a [`ResourceRule`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldAssertion {
    /// Dot-separated field path, e.g. "spec.replicas"
    pub path: String,
    /// Expected value (unused for `exists`)
    #[serde(default)]
    pub value: Option<Value>,
    /// Comparison applied at the path
    pub condition: FieldCondition,
}

/// Comparison kind for a [`FieldAssertion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldCondition {
    /// Field must be present
    Exists,
    /// Field must deep-equal the expected value
    Equals,
    /// String field must contain the expected substring
    Contains,
    /// String field must match the expected regular expression
    Matches,
}

/// Configured tolerance band for configuration drift.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftTolerance {
    /// Maximum tolerated drift percentage before a finding is raised
    #[serde(default)]
    pub max_drift_percentage: f64,
    /// Check interval in seconds
    #[serde(default = "default_drift_check_interval_secs")]
    pub check_interval_secs: u64,
    /// Whether drift should be auto-corrected (execution external)
    #[serde(default)]
    pub auto_correct: bool,
}

impl Default for DriftTolerance {
    fn default() -> Self {
        Self {
            max_drift_percentage: 0.0,
            check_interval_secs: default_drift_check_interval_secs(),
            auto_correct: false,
        }
    }
}

/// Performance ceilings and targets compared against measured samples.
///
/// Tolerance bands: each measured throughput element may undershoot its
/// target by up to 10%; each measured RTT element may overshoot by up to
/// 10%. Deployment time and utilization ceilings are strict.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceThresholds {
    /// Maximum deployment time in seconds
    #[serde(default)]
    pub deployment_time_secs: f64,
    /// Per-position throughput targets, Mbps
    #[serde(default)]
    pub throughput_mbps: Vec<f64>,
    /// Per-position RTT targets, milliseconds
    #[serde(default)]
    pub ping_rtt_ms: Vec<f64>,
    /// Maximum CPU utilization percentage
    #[serde(default)]
    pub cpu_utilization: f64,
    /// Maximum memory utilization percentage
    #[serde(default)]
    pub memory_utilization: f64,
}

/// Monitoring section; consumed by the external presentation layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub interval_secs: u64,
    #[serde(default)]
    pub endpoints: Vec<String>,
}

/// Rollback section; execution is external to the engines.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub auto_rollback: bool,
    #[serde(default)]
    pub max_history: u32,
}

/// Configuration-drift detection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftDetectionConfig {
    /// Whether drift detection runs during validation
    #[serde(default)]
    pub enabled: bool,
    /// Scan interval in seconds
    #[serde(default = "default_drift_check_interval_secs")]
    pub scan_interval_secs: u64,
    /// What to do when drift is found
    #[serde(default)]
    pub remediation: RemediationAction,
    /// Field paths excluded from the comparison, in addition to the
    /// built-in cluster-managed paths
    #[serde(default)]
    pub ignore_fields: Vec<String>,
}

/// Remediation applied when drift is detected. Only `alert` has in-engine
/// behavior (a warning on the validation result); the others are executed
/// by external collaborators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemediationAction {
    #[default]
    Alert,
    Correct,
    Rollback,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_applies_defaults() {
        let config = PlatformConfig::parse("{}").unwrap();
        assert_eq!(config.validation.readiness_timeout_secs, 600);
        assert_eq!(config.nephio.render_timeout_secs, 300);
        assert_eq!(config.validation.drift_tolerance.check_interval_secs, 30);
        assert!(!config.drift_detection.enabled);
        assert_eq!(config.drift_detection.remediation, RemediationAction::Alert);
    }

    #[test]
    fn parse_full_document() {
        let yaml = r#"
clusters:
  - name: edge01
    type: edge
    packages: [ran-slice-a]
git:
  repoUrl: https://git.example.com/deploy.git
  branch: main
validation:
  requiredResources:
    - apiVersion: apps/v1
      kind: Deployment
      namespace: ran
      labelSelector: app=upf
      fieldAssertions:
        - path: spec.replicas
          value: 3
          condition: equals
  performanceThresholds:
    deploymentTimeSecs: 120
    throughputMbps: [1000, 500]
    pingRttMs: [10, 20]
    cpuUtilization: 80
    memoryUtilization: 85
driftDetection:
  enabled: true
  remediation: correct
  ignoreFields: [metadata.annotations]
"#;
        let config = PlatformConfig::parse(yaml).unwrap();
        assert_eq!(config.clusters.len(), 1);
        let rule = &config.validation.required_resources[0];
        assert_eq!(rule.kind, "Deployment");
        assert_eq!(rule.field_assertions[0].condition, FieldCondition::Equals);
        assert_eq!(
            config.drift_detection.remediation,
            RemediationAction::Correct
        );
        assert_eq!(config.validation.performance_thresholds.throughput_mbps.len(), 2);
    }

    #[test]
    fn duplicate_cluster_names_rejected() {
        let yaml = r#"
clusters:
  - {name: c1, type: edge}
  - {name: c1, type: central}
"#;
        let err = PlatformConfig::parse(yaml).unwrap_err();
        assert!(format!("{}", err).contains("duplicate cluster name"));
    }
}
