//! Configuration schema for the reconciliation core
//!
//! Two documents drive the engines: the platform configuration (clusters,
//! Git source, validation rules, drift detection) consumed by the
//! validation engine, and the sync settings (package groups, dependencies,
//! conflict strategy) consumed by the sync engine. Both are YAML with
//! camelCase field names and serde-applied defaults.

mod platform;
mod sync;

pub use platform::{
    DriftDetectionConfig, DriftTolerance, FieldAssertion, FieldCondition, GitConfig,
    MonitoringConfig, NephioConfig, PerformanceThresholds, PlatformConfig, RemediationAction,
    ResourceRule, RollbackConfig, ValidationSettings,
};
pub use sync::{
    ConflictStrategy, HealthCheck, PackageDependency, PackageGroup, SyncSettings,
};
