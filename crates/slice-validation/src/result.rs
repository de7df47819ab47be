//! Validation result types
//!
//! All result objects are produced fresh on every run and never mutated
//! after the run completes; they are the stable contract consumed by the
//! presentation layer.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use slice_core::{PerformanceSample, PerformanceThresholds};

/// Outcome of validating one cluster in one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// When the run started
    pub timestamp: DateTime<Utc>,
    /// Cluster this result describes
    pub cluster: String,
    /// False iff any hard error was recorded
    pub success: bool,
    /// Hard findings (Git failure, invalid package, listing failure,
    /// failed field assertion)
    pub errors: Vec<String>,
    /// Soft findings (performance breaches, drift, empty rule matches)
    pub warnings: Vec<String>,
    /// Per-resource readiness classification
    pub resources: Vec<ResourceValidationResult>,
    /// Performance comparison, when metrics collection succeeded
    pub performance: Option<PerformanceResult>,
    /// Git state snapshot, when the repository was reachable
    pub git: Option<GitValidationResult>,
    /// End-to-end duration, recorded even on failure
    pub duration: Duration,
}

impl ValidationResult {
    /// Start an empty, successful result for a cluster.
    pub fn new(cluster: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            cluster: cluster.to_string(),
            success: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            resources: Vec::new(),
            performance: None,
            git: None,
            duration: Duration::ZERO,
        }
    }

    /// A failed result carrying a single error, used when a per-cluster
    /// validation task cannot even start.
    pub fn failure(cluster: &str, error: String) -> Self {
        Self {
            success: false,
            errors: vec![error],
            ..Self::new(cluster)
        }
    }

    /// Record a hard finding and flip success.
    pub fn record_error(&mut self, error: String) {
        self.errors.push(error);
        self.success = false;
    }

    /// Record a soft finding; success is unaffected.
    pub fn record_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }
}

/// Read-only readiness view of one live cluster resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceValidationResult {
    pub name: String,
    pub namespace: Option<String>,
    pub kind: String,
    /// Kind-specific readiness classification
    pub ready: bool,
    /// Human status string, e.g. "Ready", "NotReady", "Running"
    pub status: String,
    /// Flattened `"type=status"` condition strings
    pub conditions: Vec<String>,
    /// When this view was taken
    pub last_updated: DateTime<Utc>,
}

/// Git repository state observed during validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitValidationResult {
    pub branch: String,
    pub commit: String,
    pub clean: bool,
    pub sync_status: String,
    pub last_sync: Option<DateTime<Utc>>,
}

/// Measured sample vs. configured thresholds, with the derived verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceResult {
    pub measured: PerformanceSample,
    pub thresholds: PerformanceThresholds,
    /// True iff no tolerance band was breached
    pub within_thresholds: bool,
}
