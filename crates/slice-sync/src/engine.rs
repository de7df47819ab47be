//! SyncEngine implementation
//!
//! Walks configured package groups in descending priority, gates each
//! group on its declared dependencies, and reconciles every member
//! package into its target clusters. Failures are isolated: a package or
//! cluster failure never aborts its siblings, and the aggregate result is
//! successful iff nothing failed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::{mpsc, RwLock, Semaphore};
use tokio::task::JoinSet;
use uuid::Uuid;

use slice_core::{
    ClusterHandle, DesiredStateRepository, PackageGroup, PackageValidator, Resource, SyncSettings,
};

use crate::conflict::{resolve, resource_needs_update, Resolution};
use crate::result::{
    PackageSyncResult, SyncAction, SyncActionKind, SyncConflict, SyncOperationResult,
};
use crate::status::{StatusTable, SyncState};
use crate::wait::{wait_for_group, wait_for_package, DEFAULT_POLL_INTERVAL};
use crate::{Error, Result};

/// Reconciles packages into clusters under priority and dependency
/// ordering.
///
/// Cheap to clone; all owned state is behind `Arc`.
#[derive(Clone)]
pub struct SyncEngine {
    settings: Arc<SyncSettings>,
    clusters: Arc<RwLock<HashMap<String, Arc<dyn ClusterHandle>>>>,
    git: Arc<dyn DesiredStateRepository>,
    validator: Option<Arc<dyn PackageValidator>>,
    status: Arc<StatusTable>,
    poll_interval: Duration,
}

impl SyncEngine {
    /// Create an engine over the given collaborators. Cluster handles are
    /// registered separately via [`add_cluster`](Self::add_cluster);
    /// passing no validator skips pre-sync package validation.
    pub fn new(
        settings: SyncSettings,
        git: Arc<dyn DesiredStateRepository>,
        validator: Option<Arc<dyn PackageValidator>>,
    ) -> Self {
        let status = Arc::new(StatusTable::new(Duration::from_secs(
            settings.retry_backoff_secs,
        )));
        Self {
            settings: Arc::new(settings),
            clusters: Arc::new(RwLock::new(HashMap::new())),
            git,
            validator,
            status,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override the dependency polling interval (test hooks, tighter
    /// control loops).
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Register a cluster handle under its name.
    pub async fn add_cluster(&self, name: &str, handle: Arc<dyn ClusterHandle>) {
        self.clusters.write().await.insert(name.to_string(), handle);
    }

    /// Remove a cluster handle.
    pub async fn remove_cluster(&self, name: &str) {
        self.clusters.write().await.remove(name);
    }

    /// The shared status table, for status queries by the caller.
    pub fn status(&self) -> Arc<StatusTable> {
        Arc::clone(&self.status)
    }

    /// Synchronize every configured package group.
    ///
    /// Groups are processed sequentially in descending priority order
    /// (name as the deterministic tie-break). Within a group, packages run
    /// either strictly in listed order (`sequential`) or as a bounded
    /// fan-out capped by `maxConcurrentPackages`.
    ///
    /// # Errors
    ///
    /// [`Error::SyncDisabled`] when synchronization is disabled; all other
    /// failures are recorded in the returned result.
    pub async fn synchronize_all(&self) -> Result<SyncOperationResult> {
        if !self.settings.enabled {
            return Err(Error::SyncDisabled);
        }

        let started = Instant::now();
        let timestamp = Utc::now();
        let id = Uuid::new_v4();
        tracing::info!(operation = %id, groups = self.settings.package_groups.len(), "starting sync run");

        let mut groups = self.settings.package_groups.clone();
        groups.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.name.cmp(&b.name)));

        let mut results: Vec<PackageSyncResult> = Vec::new();
        let mut conflicts: Vec<SyncConflict> = Vec::new();

        for group in &groups {
            self.synchronize_group(group, &mut results, &mut conflicts)
                .await;
        }

        let packages_synced = results.iter().filter(|r| r.success).count() as u32;
        let packages_failed = results.len() as u32 - packages_synced;
        let result = SyncOperationResult {
            id,
            timestamp,
            duration: started.elapsed(),
            success: packages_failed == 0,
            packages_synced,
            packages_failed,
            results,
            conflicts,
        };
        tracing::info!(
            operation = %id,
            synced = result.packages_synced,
            failed = result.packages_failed,
            "sync run finished"
        );
        Ok(result)
    }

    /// Process one group: dependency gate, then members.
    async fn synchronize_group(
        &self,
        group: &PackageGroup,
        results: &mut Vec<PackageSyncResult>,
        conflicts: &mut Vec<SyncConflict>,
    ) {
        tracing::info!(group = %group.name, priority = group.priority, "synchronizing group");

        if let Err(e) = self.await_group_dependencies(group).await {
            tracing::warn!(group = %group.name, error = %e, "group dependency gate failed, skipping group");
            let message = e.to_string();
            for package in &group.packages {
                for cluster in &group.clusters {
                    self.status
                        .update(package, cluster, SyncState::Failed, Some(&message), None);
                    results.push(PackageSyncResult::failure(package, cluster, message.clone()));
                }
            }
            return;
        }

        if group.sequential {
            for package in &group.packages {
                let (package_results, package_conflicts) =
                    self.synchronize_package(package, &group.clusters).await;
                results.extend(package_results);
                conflicts.extend(package_conflicts);
            }
        } else {
            self.synchronize_group_concurrent(group, results, conflicts)
                .await;
        }
    }

    /// Bounded fan-out over a group's packages, fan-in over a channel
    /// sized to the package count.
    async fn synchronize_group_concurrent(
        &self,
        group: &PackageGroup,
        results: &mut Vec<PackageSyncResult>,
        conflicts: &mut Vec<SyncConflict>,
    ) {
        let capacity = group.packages.len().max(1);
        let (tx, mut rx) = mpsc::channel(capacity);
        let limit = Arc::new(Semaphore::new(self.settings.max_concurrent_packages));
        let mut tasks = JoinSet::new();

        for package in group.packages.clone() {
            let engine = self.clone();
            let clusters = group.clusters.clone();
            let tx = tx.clone();
            let limit = Arc::clone(&limit);
            tasks.spawn(async move {
                let _permit = match limit.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => return, // semaphore closed: engine dropped
                };
                let outcome = engine.synchronize_package(&package, &clusters).await;
                let _ = tx.send(outcome).await;
            });
        }
        drop(tx);

        while let Some((package_results, package_conflicts)) = rx.recv().await {
            results.extend(package_results);
            conflicts.extend(package_conflicts);
        }
        while tasks.join_next().await.is_some() {}
    }

    /// Wait for every group-level dependency to be fully synced.
    async fn await_group_dependencies(&self, group: &PackageGroup) -> Result<()> {
        let timeout = Duration::from_secs(self.settings.dependency_wait_timeout_secs);
        for dependency in &group.dependencies {
            let packages = self
                .settings
                .package_groups
                .iter()
                .find(|g| g.name == *dependency)
                .map(|g| g.packages.clone())
                .unwrap_or_default();
            wait_for_group(&self.status, dependency, &packages, timeout, self.poll_interval)
                .await?;
        }
        Ok(())
    }

    /// Synchronize one package into its target clusters.
    ///
    /// Blocks on the package's declared dependencies first. Cluster
    /// outcomes are independent; one cluster failing does not stop the
    /// others.
    pub async fn synchronize_package(
        &self,
        package: &str,
        clusters: &[String],
    ) -> (Vec<PackageSyncResult>, Vec<SyncConflict>) {
        if let Err(e) = self.await_package_dependencies(package, clusters).await {
            let message = e.to_string();
            let results = clusters
                .iter()
                .map(|cluster| {
                    self.status
                        .update(package, cluster, SyncState::Failed, Some(&message), None);
                    PackageSyncResult::failure(package, cluster, message.clone())
                })
                .collect();
            return (results, Vec::new());
        }

        for cluster in clusters {
            self.status
                .update(package, cluster, SyncState::Pending, None, None);
        }

        let resources = match self.fetch_and_validate(package).await {
            Ok(resources) => resources,
            Err(e) => {
                let message = e.to_string();
                let results = clusters
                    .iter()
                    .map(|cluster| {
                        self.status
                            .update(package, cluster, SyncState::Failed, Some(&message), None);
                        PackageSyncResult::failure(package, cluster, message.clone())
                    })
                    .collect();
                return (results, Vec::new());
            }
        };
        let version = self.git.last_commit().await.ok();

        let mut results = Vec::new();
        let mut conflicts = Vec::new();
        for cluster in clusters {
            self.status
                .update(package, cluster, SyncState::InProgress, None, None);
            let (result, manual_conflict) = self
                .sync_package_to_cluster(package, cluster, &resources, version.clone(), &mut conflicts)
                .await;

            let state = if result.success {
                SyncState::Synced
            } else if manual_conflict {
                SyncState::Conflict
            } else {
                SyncState::Failed
            };
            let message = result.errors.first().map(String::as_str);
            self.status
                .update(package, cluster, state, message, version.as_deref());
            results.push(result);
        }
        (results, conflicts)
    }

    /// Wait for the package's declared upstream packages, flagging the
    /// pair `waiting` while blocked.
    async fn await_package_dependencies(&self, package: &str, clusters: &[String]) -> Result<()> {
        let Some(dependency) = self.settings.dependency_for(package) else {
            return Ok(());
        };
        if dependency.depends_on.is_empty() {
            return Ok(());
        }

        for cluster in clusters {
            self.status
                .update(package, cluster, SyncState::Waiting, None, None);
        }
        let timeout = Duration::from_secs(dependency.wait_timeout_secs);
        for upstream in &dependency.depends_on {
            wait_for_package(&self.status, upstream, timeout, self.poll_interval).await?;
        }
        Ok(())
    }

    /// Pull the package's rendered resources from Git and validate it.
    async fn fetch_and_validate(&self, package: &str) -> Result<Vec<Resource>> {
        let resources = self.git.package_content(package).await?;
        if let Some(validator) = &self.validator {
            validator.validate(package).await?;
        }
        Ok(resources)
    }

    /// Sync the full resource set into one cluster. Per-resource failures
    /// are collected; the remaining resources are still attempted. The
    /// second return value flags an unresolved manual conflict.
    async fn sync_package_to_cluster(
        &self,
        package: &str,
        cluster: &str,
        resources: &[Resource],
        version: Option<String>,
        conflicts: &mut Vec<SyncConflict>,
    ) -> (PackageSyncResult, bool) {
        let started = Instant::now();
        let mut actions = Vec::new();
        let mut errors = Vec::new();
        let mut manual_conflict = false;

        let handle = self.clusters.read().await.get(cluster).cloned();
        match handle {
            None => errors.push(
                Error::ClusterNotFound {
                    name: cluster.to_string(),
                }
                .to_string(),
            ),
            Some(handle) => {
                for resource in resources {
                    match self
                        .sync_resource(&*handle, resource, package, cluster, conflicts)
                        .await
                    {
                        Ok(action) => actions.push(action),
                        Err(e) => {
                            manual_conflict |= e.is_manual_conflict();
                            errors.push(e.to_string());
                        }
                    }
                }
            }
        }

        let result = PackageSyncResult {
            package: package.to_string(),
            cluster: cluster.to_string(),
            success: errors.is_empty(),
            duration: started.elapsed(),
            version,
            actions,
            errors,
        };
        (result, manual_conflict)
    }

    /// Reconcile one resource into one cluster: create it if absent, skip
    /// it if already in sync, otherwise resolve the conflict and update.
    pub async fn sync_resource(
        &self,
        handle: &dyn ClusterHandle,
        resource: &Resource,
        package: &str,
        cluster: &str,
        conflicts: &mut Vec<SyncConflict>,
    ) -> Result<SyncAction> {
        let api_version = resource.api_version().unwrap_or("");
        let kind = resource.kind().ok_or_else(|| slice_core::Error::MalformedResource {
            message: "missing kind".to_string(),
        })?;
        let name = resource.name().ok_or_else(|| slice_core::Error::MalformedResource {
            message: "missing metadata.name".to_string(),
        })?;
        let namespace = resource.namespace();

        let gvr = handle.resolve_gvr(api_version, kind).await?;

        let existing = match handle.get(&gvr, namespace, name).await {
            Ok(existing) => existing,
            Err(e) if e.is_not_found() => {
                handle.create(&gvr, namespace, resource).await?;
                tracing::debug!(cluster = %cluster, kind = %kind, name = %name, "created resource");
                return Ok(SyncAction::new(
                    SyncActionKind::Create,
                    resource,
                    "resource absent from cluster",
                ));
            }
            Err(e) => return Err(e.into()),
        };

        let Some(divergence) = resource_needs_update(
            &existing,
            resource,
            &self.settings.ignored_annotation_prefixes,
        ) else {
            return Ok(SyncAction::new(
                SyncActionKind::Skip,
                resource,
                "already in sync",
            ));
        };

        let mut conflict = SyncConflict {
            package: package.to_string(),
            cluster: cluster.to_string(),
            kind: kind.to_string(),
            name: name.to_string(),
            namespace: namespace.map(str::to_string),
            conflict: divergence,
            desired: resource.clone(),
            observed: existing.clone(),
            resolution: None,
        };

        match resolve(self.settings.conflict_strategy, resource, &existing) {
            Ok(Resolution::Write(resolved)) => {
                handle.update(&gvr, namespace, &resolved).await?;
                conflict.resolution = Some(self.settings.conflict_strategy);
                conflicts.push(conflict);
                tracing::debug!(cluster = %cluster, kind = %kind, name = %name, "updated resource");
                Ok(SyncAction::new(
                    SyncActionKind::Update,
                    resource,
                    "declared state diverged from cluster",
                ))
            }
            Ok(Resolution::Keep) => {
                conflict.resolution = Some(self.settings.conflict_strategy);
                conflicts.push(conflict);
                Ok(SyncAction::new(
                    SyncActionKind::Skip,
                    resource,
                    "cluster-wins retained existing state",
                ))
            }
            Err(e) => {
                conflicts.push(conflict);
                Err(e)
            }
        }
    }
}
