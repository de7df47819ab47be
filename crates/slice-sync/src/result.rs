//! Synchronization result types

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use slice_core::{ConflictStrategy, Resource};
use uuid::Uuid;

/// Outcome of one `synchronize_all` invocation. Immutable once returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOperationResult {
    /// Generated operation id
    pub id: Uuid,
    /// When the run started
    pub timestamp: DateTime<Utc>,
    /// End-to-end duration of the run
    pub duration: Duration,
    /// True iff `packages_failed == 0`
    pub success: bool,
    /// Count of successful (package, cluster) outcomes
    pub packages_synced: u32,
    /// Count of failed (package, cluster) outcomes
    pub packages_failed: u32,
    /// One entry per (package, cluster) attempt, in processing order
    pub results: Vec<PackageSyncResult>,
    /// Conflicts encountered during the run, resolved or not
    pub conflicts: Vec<SyncConflict>,
}

/// Outcome of one sync attempt for one (package, cluster) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageSyncResult {
    pub package: String,
    pub cluster: String,
    pub success: bool,
    pub duration: Duration,
    /// Version deployed by this attempt (Git head commit)
    pub version: Option<String>,
    /// Per-resource actions in processing order
    pub actions: Vec<SyncAction>,
    /// Errors encountered for this pair
    pub errors: Vec<String>,
}

impl PackageSyncResult {
    /// A failed result carrying a single error and no actions.
    pub fn failure(package: &str, cluster: &str, error: String) -> Self {
        Self {
            package: package.to_string(),
            cluster: cluster.to_string(),
            success: false,
            duration: Duration::ZERO,
            version: None,
            actions: Vec::new(),
            errors: vec![error],
        }
    }
}

/// What was done with one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncActionKind {
    Create,
    Update,
    Skip,
}

/// One per-resource action taken during a package sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncAction {
    pub action: SyncActionKind,
    pub kind: String,
    pub name: String,
    pub namespace: Option<String>,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

impl SyncAction {
    /// Build an action for a resource, stamped now.
    pub fn new(action: SyncActionKind, resource: &Resource, reason: &str) -> Self {
        Self {
            action,
            kind: resource.kind().unwrap_or("<unknown>").to_string(),
            name: resource.name().unwrap_or("<unnamed>").to_string(),
            namespace: resource.namespace().map(str::to_string),
            reason: reason.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// How the declared and observed versions of a resource diverge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// The `spec` sections differ (or one side lacks a spec)
    SpecDivergence,
    /// Labels or non-system annotations differ
    MetadataDivergence,
}

/// A detected divergence between Git-declared and cluster-observed state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConflict {
    pub package: String,
    pub cluster: String,
    pub kind: String,
    pub name: String,
    pub namespace: Option<String>,
    pub conflict: ConflictKind,
    /// Snapshot of the Git-declared resource
    pub desired: Resource,
    /// Snapshot of the cluster-observed resource
    pub observed: Resource,
    /// Strategy applied, or `None` when resolution was refused (`manual`)
    pub resolution: Option<ConflictStrategy>,
}
