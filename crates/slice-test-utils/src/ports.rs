//! Fake package validator and metrics collector

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use slice_core::{Error, MetricsCollector, PackageValidator, PerformanceSample, Result};

/// A package validator with a configurable set of invalid packages.
#[derive(Default)]
pub struct FakeValidator {
    invalid: Mutex<HashMap<String, String>>,
}

impl FakeValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: mark a package invalid with the given reason.
    pub fn with_invalid(self, package: &str, reason: &str) -> Self {
        self.invalid
            .lock()
            .unwrap()
            .insert(package.to_string(), reason.to_string());
        self
    }
}

#[async_trait]
impl PackageValidator for FakeValidator {
    async fn validate(&self, package: &str) -> Result<()> {
        match self.invalid.lock().unwrap().get(package) {
            Some(reason) => Err(Error::PackageInvalid {
                package: package.to_string(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// A metrics collector returning canned samples per cluster.
#[derive(Default)]
pub struct FakeMetrics {
    samples: Mutex<HashMap<String, PerformanceSample>>,
}

impl FakeMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: register a sample for a cluster.
    pub fn with_sample(self, cluster: &str, sample: PerformanceSample) -> Self {
        self.samples
            .lock()
            .unwrap()
            .insert(cluster.to_string(), sample);
        self
    }
}

#[async_trait]
impl MetricsCollector for FakeMetrics {
    async fn collect(&self, cluster: &str) -> Result<PerformanceSample> {
        self.samples
            .lock()
            .unwrap()
            .get(cluster)
            .cloned()
            .ok_or_else(|| Error::Metrics {
                cluster: cluster.to_string(),
                message: "no sample available".to_string(),
            })
    }
}
