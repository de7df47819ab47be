//! ValidationEngine implementation
//!
//! Fans out one validation task per cluster and merges four independent
//! checks per cluster: Git state, package well-formedness, resource
//! readiness, and performance thresholds. Git/package/resource failures
//! are hard; performance and drift findings are soft.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinSet;

use slice_core::{
    ClusterHandle, DesiredStateRepository, MetricsCollector, PackageValidator, PlatformConfig,
};

use crate::drift::detect_drift;
use crate::performance;
use crate::result::{GitValidationResult, ValidationResult};
use crate::rules::evaluate_rule;
use crate::{Error, Result};

/// Concurrently validates actual cluster state against desired state.
///
/// Cheap to clone; all owned state is behind `Arc`.
#[derive(Clone)]
pub struct ValidationEngine {
    config: Arc<PlatformConfig>,
    clusters: Arc<RwLock<HashMap<String, Arc<dyn ClusterHandle>>>>,
    git: Arc<dyn DesiredStateRepository>,
    validator: Arc<dyn PackageValidator>,
    metrics: Arc<dyn MetricsCollector>,
}

impl ValidationEngine {
    /// Create an engine over the given collaborators. Cluster handles are
    /// registered separately via [`add_cluster`](Self::add_cluster).
    pub fn new(
        config: PlatformConfig,
        git: Arc<dyn DesiredStateRepository>,
        validator: Arc<dyn PackageValidator>,
        metrics: Arc<dyn MetricsCollector>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            clusters: Arc::new(RwLock::new(HashMap::new())),
            git,
            validator,
            metrics,
        }
    }

    /// Register a cluster handle under its name.
    pub async fn add_cluster(&self, name: &str, handle: Arc<dyn ClusterHandle>) {
        self.clusters.write().await.insert(name.to_string(), handle);
    }

    /// Remove a cluster handle. Validation runs already in flight keep
    /// their snapshot of the name set.
    pub async fn remove_cluster(&self, name: &str) {
        self.clusters.write().await.remove(name);
    }

    /// Validate every registered cluster concurrently.
    ///
    /// Always returns exactly one entry per registered cluster: a
    /// per-cluster failure is captured in that cluster's result instead of
    /// aborting the batch.
    pub async fn validate_all(&self) -> HashMap<String, ValidationResult> {
        let names: Vec<String> = self.clusters.read().await.keys().cloned().collect();
        tracing::info!(clusters = names.len(), "starting validation run");

        let results: Arc<Mutex<HashMap<String, ValidationResult>>> =
            Arc::new(Mutex::new(HashMap::new()));
        let mut tasks = JoinSet::new();

        for name in &names {
            let engine = self.clone();
            let results = Arc::clone(&results);
            let name = name.clone();
            tasks.spawn(async move {
                let result = match engine.validate_cluster(&name).await {
                    Ok(result) => result,
                    Err(e) => ValidationResult::failure(&name, e.to_string()),
                };
                results.lock().await.insert(name, result);
            });
        }
        while tasks.join_next().await.is_some() {}

        let mut results = std::mem::take(&mut *results.lock().await);
        // A panicked task leaves a hole; the contract is one entry per cluster.
        for name in names {
            results
                .entry(name.clone())
                .or_insert_with(|| ValidationResult::failure(&name, "validation task aborted".to_string()));
        }
        results
    }

    /// Validate a single cluster.
    ///
    /// # Errors
    ///
    /// Fails immediately when the cluster is not registered. All other
    /// failures are recorded inside the returned result.
    pub async fn validate_cluster(&self, name: &str) -> Result<ValidationResult> {
        let handle = self
            .clusters
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| Error::ClusterNotFound {
                name: name.to_string(),
            })?;

        let started = Instant::now();
        let mut result = ValidationResult::new(name);

        self.check_git_state(&mut result).await;
        self.check_packages(name, &mut result).await;
        self.check_resources(&*handle, &mut result).await;
        self.check_performance(name, &mut result).await;
        if self.config.drift_detection.enabled {
            self.check_drift(name, &*handle, &mut result).await;
        }

        result.duration = started.elapsed();
        tracing::info!(
            cluster = %name,
            success = result.success,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "cluster validation finished"
        );
        Ok(result)
    }

    /// Git state check. Unreachable repository is a hard error.
    async fn check_git_state(&self, result: &mut ValidationResult) {
        let state = async {
            let branch = self.git.current_branch().await?;
            let commit = self.git.last_commit().await?;
            let clean = self.git.is_clean().await?;
            let sync = self.git.sync_status().await?;
            Ok::<_, slice_core::Error>(GitValidationResult {
                branch,
                commit,
                clean,
                sync_status: sync.status,
                last_sync: sync.last_sync,
            })
        }
        .await;

        match state {
            Ok(git) => {
                if !git.clean {
                    result.record_warning("git working tree is dirty".to_string());
                }
                result.git = Some(git);
            }
            Err(e) => result.record_error(format!("git state: {}", e)),
        }
    }

    /// Package well-formedness check for every package assigned to the
    /// cluster. Any invalid package is a hard error.
    async fn check_packages(&self, cluster: &str, result: &mut ValidationResult) {
        let packages = self
            .config
            .cluster(cluster)
            .map(|d| d.packages.clone())
            .unwrap_or_default();

        for package in packages {
            if let Err(e) = self.validator.validate(&package).await {
                result.record_error(format!("package {}: {}", package, e));
            }
        }
    }

    /// Evaluate every configured resource rule. Listing failure is hard;
    /// an empty match is only a warning.
    async fn check_resources(&self, handle: &dyn ClusterHandle, result: &mut ValidationResult) {
        for rule in &self.config.validation.required_resources {
            match evaluate_rule(handle, rule).await {
                Ok(outcome) => {
                    result.resources.extend(outcome.resources);
                    for error in outcome.errors {
                        result.record_error(error);
                    }
                    for warning in outcome.warnings {
                        result.record_warning(warning);
                    }
                }
                Err(e) => result.record_error(format!(
                    "listing {}/{} resources: {}",
                    rule.api_version, rule.kind, e
                )),
            }
        }
    }

    /// Performance check. Advisory only: collection failure and threshold
    /// breaches are warnings, never errors.
    async fn check_performance(&self, cluster: &str, result: &mut ValidationResult) {
        match self.metrics.collect(cluster).await {
            Ok(sample) => {
                let thresholds = self.config.validation.performance_thresholds.clone();
                for breach in performance::check_thresholds(&sample, &thresholds) {
                    result.record_warning(breach);
                }
                result.performance = Some(performance::compare(sample, thresholds));
            }
            Err(e) => result.record_warning(format!("performance metrics unavailable: {}", e)),
        }
    }

    /// Drift check. Soft: findings and scan failures are warnings.
    async fn check_drift(
        &self,
        cluster: &str,
        handle: &dyn ClusterHandle,
        result: &mut ValidationResult,
    ) {
        let packages = self
            .config
            .cluster(cluster)
            .map(|d| d.packages.clone())
            .unwrap_or_default();

        match detect_drift(
            handle,
            &*self.git,
            &packages,
            &self.config.drift_detection.ignore_fields,
        )
        .await
        {
            Ok(report) => {
                for item in &report.missing {
                    result.record_warning(format!(
                        "drift: {} {}/{} missing ({})",
                        item.package, item.kind, item.name, item.description
                    ));
                }
                for item in &report.drifted {
                    result.record_warning(format!(
                        "drift: {} {}/{} at {}: {}",
                        item.package, item.kind, item.name, item.path, item.description
                    ));
                }
            }
            Err(e) => result.record_warning(format!("drift detection failed: {}", e)),
        }
    }
}
