//! End-to-end integration test for the reconciliation core
//!
//! Exercises the complete flow: config loading -> sync -> validation.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use slice_core::{ClusterHandle, PlatformConfig, SyncSettings};
use slice_sync::{SyncActionKind, SyncEngine, SyncState};
use slice_test_utils::{resource, FakeCluster, FakeGit, FakeMetrics, FakeValidator};
use slice_validation::ValidationEngine;

/// Write platform and sync configuration files the way a deployment would
/// ship them.
fn setup_config_dir() -> TempDir {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let temp = TempDir::new().unwrap();

    fs::write(
        temp.path().join("platform.yaml"),
        r#"
clusters:
  - name: edge01
    type: edge
    packages: [ran-slice-a]
  - name: central01
    type: central
    packages: []
git:
  repoUrl: https://git.example.com/deployments.git
  branch: main
validation:
  requiredResources:
    - apiVersion: apps/v1
      kind: Deployment
      namespace: ran
driftDetection:
  enabled: true
"#,
    )
    .unwrap();

    fs::write(
        temp.path().join("sync.yaml"),
        r#"
enabled: true
conflictStrategy: git-wins
packageGroups:
  - name: ran
    packages: [ran-slice-a]
    clusters: [edge01]
    priority: 10
"#,
    )
    .unwrap();

    temp
}

#[test]
fn load_configuration_files() {
    let temp = setup_config_dir();

    let platform = PlatformConfig::load(&temp.path().join("platform.yaml")).unwrap();
    assert_eq!(platform.clusters.len(), 2);
    assert_eq!(platform.cluster("edge01").unwrap().packages, vec!["ran-slice-a"]);
    assert!(platform.drift_detection.enabled);

    let sync = SyncSettings::load(&temp.path().join("sync.yaml")).unwrap();
    assert!(sync.enabled);
    assert_eq!(sync.package_groups.len(), 1);
}

#[tokio::test]
async fn sync_then_validate_round_trip() {
    let temp = setup_config_dir();
    let platform = PlatformConfig::load(&temp.path().join("platform.yaml")).unwrap();
    let sync_settings = SyncSettings::load(&temp.path().join("sync.yaml")).unwrap();

    let git = Arc::new(FakeGit::new().with_package(
        "ran-slice-a",
        vec![
            resource::deployment("upf", "ran", 3, 3),
            resource::service("upf", "ran"),
        ],
    ));
    let edge = Arc::new(FakeCluster::new());

    let sync_engine = SyncEngine::new(
        sync_settings,
        Arc::clone(&git) as Arc<dyn slice_core::DesiredStateRepository>,
        Some(Arc::new(FakeValidator::new())),
    )
    .with_poll_interval(Duration::from_millis(10));
    sync_engine
        .add_cluster("edge01", Arc::clone(&edge) as Arc<dyn ClusterHandle>)
        .await;

    let sync_result = sync_engine.synchronize_all().await.unwrap();
    assert!(sync_result.success);
    assert_eq!(sync_result.packages_synced, 1);
    assert!(sync_result
        .results
        .iter()
        .flat_map(|r| &r.actions)
        .all(|a| a.action == SyncActionKind::Create));

    let status = sync_engine.status();
    assert!(status.package_synced("ran-slice-a"));
    assert_eq!(
        status.get("ran-slice-a", "edge01").unwrap().state,
        SyncState::Synced
    );

    // validate the freshly synced cluster
    let validation_engine = ValidationEngine::new(
        platform,
        git,
        Arc::new(FakeValidator::new()),
        Arc::new(FakeMetrics::new()),
    );
    validation_engine.add_cluster("edge01", edge).await;

    let result = validation_engine.validate_cluster("edge01").await.unwrap();
    assert!(result.success, "errors: {:?}", result.errors);
    assert!(
        !result.warnings.iter().any(|w| w.contains("drift")),
        "freshly synced cluster must be drift-free: {:?}",
        result.warnings
    );
    assert!(result.resources.iter().any(|r| r.name == "upf" && r.ready));
    assert_eq!(result.git.as_ref().unwrap().commit, "abc1234");
}
