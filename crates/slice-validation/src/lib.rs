//! Validation engine for the slice-manager reconciliation core
//!
//! Checks, per cluster and concurrently across clusters, whether actual
//! state matches desired state:
//!
//! - **Git state**: branch, head commit, clean flag, remote sync status
//! - **Packages**: well-formedness of every package assigned to the cluster
//! - **Resources**: existence and kind-specific readiness per configured rule
//! - **Performance**: measured sample vs. configured thresholds (advisory)
//! - **Drift**: field-level divergence between declared and observed state
//!   (advisory)
//!
//! No single cluster failure prevents results for the others; every run
//! yields exactly one [`ValidationResult`] per registered cluster.

pub mod drift;
pub mod engine;
pub mod error;
pub mod performance;
pub mod result;
pub mod rules;

pub use drift::{DriftItem, DriftReport, CLUSTER_MANAGED_PATHS};
pub use engine::ValidationEngine;
pub use error::{Error, Result};
pub use result::{
    GitValidationResult, PerformanceResult, ResourceValidationResult, ValidationResult,
};
pub use rules::RuleOutcome;
