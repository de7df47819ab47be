//! Error types for slice-validation

/// Result type for slice-validation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in slice-validation operations
///
/// Per-cluster validation findings are not errors at this level; they are
/// recorded inside the `ValidationResult`. Only caller mistakes (unknown
/// cluster) and lower-layer failures surface here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Referenced cluster is not registered with the engine
    #[error("Cluster not found: {name}")]
    ClusterNotFound { name: String },

    /// Core-layer error
    #[error(transparent)]
    Core(#[from] slice_core::Error),
}
