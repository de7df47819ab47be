//! Cluster descriptors and the cluster access seam

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::resource::{Gvr, Resource};
use crate::Result;

/// Role of a cluster within the slice topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterType {
    /// Far-edge cluster close to the radio access network
    Edge,
    /// Regional aggregation cluster
    Regional,
    /// Central/core cluster
    Central,
}

/// Static description of one target cluster.
///
/// Descriptors are loaded from configuration and never mutated afterwards;
/// the live API connection they reference is a separate [`ClusterHandle`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDescriptor {
    /// Unique cluster name; key into the engine's handle map
    pub name: String,
    /// Cluster role
    #[serde(rename = "type")]
    pub cluster_type: ClusterType,
    /// Reference to the connection credentials (kubeconfig context, secret ref)
    #[serde(default)]
    pub connection: String,
    /// Optional kubeconfig context override
    #[serde(default)]
    pub context: Option<String>,
    /// Packages assigned to this cluster
    #[serde(default)]
    pub packages: Vec<String>,
    /// Capability tags (e.g. "sr-iov", "gpu")
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Free-form labels
    #[serde(default)]
    pub labels: HashMap<String, String>,
    /// Deployment environment tag (e.g. "production")
    #[serde(default)]
    pub environment: String,
}

/// Per-cluster capability bundle for reading and writing arbitrary
/// resources.
///
/// Implementations wrap a dynamic API client for one cluster. Construction
/// and authentication are the caller's concern; the engines only consume
/// the trait.
#[async_trait]
pub trait ClusterHandle: Send + Sync {
    /// List resources of a type, optionally narrowed by namespace and a
    /// `k=v,k2=v2` label selector.
    async fn list(
        &self,
        gvr: &Gvr,
        namespace: Option<&str>,
        selector: Option<&str>,
    ) -> Result<Vec<Resource>>;

    /// Fetch one resource by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceNotFound`](crate::Error::ResourceNotFound)
    /// when the resource does not exist; callers branch on
    /// [`Error::is_not_found`](crate::Error::is_not_found).
    async fn get(&self, gvr: &Gvr, namespace: Option<&str>, name: &str) -> Result<Resource>;

    /// Create a resource, returning the object as stored by the cluster.
    async fn create(
        &self,
        gvr: &Gvr,
        namespace: Option<&str>,
        resource: &Resource,
    ) -> Result<Resource>;

    /// Update an existing resource, returning the stored object.
    async fn update(
        &self,
        gvr: &Gvr,
        namespace: Option<&str>,
        resource: &Resource,
    ) -> Result<Resource>;

    /// Resolve the GVR for an (apiVersion, kind) pair via the cluster's
    /// API discovery.
    async fn resolve_gvr(&self, api_version: &str, kind: &str) -> Result<Gvr>;
}
