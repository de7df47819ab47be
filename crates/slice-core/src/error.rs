//! Error types for slice-core

/// Result type for slice-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in slice-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Referenced cluster is not registered with the engine
    #[error("Cluster not found: {name}")]
    ClusterNotFound { name: String },

    /// Resource does not exist in the target cluster
    #[error("Resource not found: {kind}/{name}")]
    ResourceNotFound { kind: String, name: String },

    /// Cluster API call failed
    #[error("Cluster API error: {message}")]
    ClusterApi { message: String },

    /// Desired-state repository (Git) access failed
    #[error("Git state error: {message}")]
    Git { message: String },

    /// Package failed validation
    #[error("Package {package} is invalid: {reason}")]
    PackageInvalid { package: String, reason: String },

    /// Metrics collection failed for a cluster
    #[error("Metrics collection failed for {cluster}: {message}")]
    Metrics { cluster: String, message: String },

    /// Invalid or missing configuration
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Resource payload is malformed (missing apiVersion/kind/name)
    #[error("Malformed resource: {message}")]
    MalformedResource { message: String },

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML deserialization error
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error is a not-found signal from a cluster `get`.
    ///
    /// Callers use this to branch create-vs-update during reconciliation.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::ResourceNotFound { .. })
    }
}
