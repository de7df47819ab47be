//! Error types for slice-sync

use std::time::Duration;

/// Result type for slice-sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in slice-sync operations
///
/// Per-(package, cluster) sync failures are recorded in result objects and
/// the status table rather than surfaced here; this type covers caller
/// mistakes, dependency timeouts, and unresolvable conflicts.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `synchronize_all` invoked while synchronization is disabled
    #[error("Synchronization is disabled in configuration")]
    SyncDisabled,

    /// Referenced cluster is not registered with the engine
    #[error("Cluster not found: {name}")]
    ClusterNotFound { name: String },

    /// A declared dependency did not reach the synced state in time
    #[error("Timed out after {waited:?} waiting for dependency {dependency}")]
    DependencyTimeout {
        dependency: String,
        waited: Duration,
    },

    /// Conflict strategy is `manual`; no automatic resolution permitted
    #[error("Manual conflict resolution required for {kind}/{name}")]
    ManualResolutionRequired { kind: String, name: String },

    /// Core-layer error
    #[error(transparent)]
    Core(#[from] slice_core::Error),
}

impl Error {
    /// Whether this error requires an operator to resolve a conflict.
    pub fn is_manual_conflict(&self) -> bool {
        matches!(self, Error::ManualResolutionRequired { .. })
    }
}
