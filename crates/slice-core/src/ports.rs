//! Package validation and metrics collection seams

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Validates the well-formedness of a rendered package (Porch/Nephio
/// render output). The rendering pipeline itself is out of scope; the
/// engines only ask pass/fail.
#[async_trait]
pub trait PackageValidator: Send + Sync {
    /// Validate a named package.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PackageInvalid`](crate::Error::PackageInvalid) with
    /// the failure detail when the package is malformed.
    async fn validate(&self, package: &str) -> Result<()>;
}

/// One performance sample for a cluster.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSample {
    /// Measured deployment time in seconds
    pub deployment_time_secs: f64,
    /// Measured throughput series, Mbps
    pub throughput_mbps: Vec<f64>,
    /// Measured round-trip-time series, milliseconds
    pub ping_rtt_ms: Vec<f64>,
    /// CPU utilization percentage (0-100)
    pub cpu_utilization: f64,
    /// Memory utilization percentage (0-100)
    pub memory_utilization: f64,
}

/// Collects a performance sample for a cluster. Actual network measurement
/// is external; only threshold comparison happens in the engines.
#[async_trait]
pub trait MetricsCollector: Send + Sync {
    /// Collect the current sample for the named cluster.
    async fn collect(&self, cluster: &str) -> Result<PerformanceSample>;
}
