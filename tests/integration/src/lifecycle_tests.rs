//! Cross-engine lifecycle scenarios
//!
//! Sync and validation share the same cluster and Git fakes here, so each
//! test observes the interplay between the two engines the way an operator
//! loop would: reconcile, mutate, detect, reconcile again.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use slice_core::{ClusterHandle, DesiredStateRepository, PlatformConfig, SyncSettings};
use slice_sync::{SyncActionKind, SyncEngine, SyncState};
use slice_test_utils::{resource, FakeCluster, FakeGit, FakeMetrics, FakeValidator};
use slice_validation::ValidationEngine;

const PLATFORM_YAML: &str = r#"
clusters:
  - name: edge01
    type: edge
    packages: [ran-slice-a]
validation:
  requiredResources:
    - apiVersion: apps/v1
      kind: Deployment
      namespace: ran
driftDetection:
  enabled: true
"#;

const SYNC_YAML: &str = r#"
enabled: true
conflictStrategy: git-wins
packageGroups:
  - name: ran
    packages: [ran-slice-a]
    clusters: [edge01]
"#;

struct Harness {
    cluster: Arc<FakeCluster>,
    sync: SyncEngine,
    validation: ValidationEngine,
}

async fn harness() -> Harness {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let git = Arc::new(
        FakeGit::new().with_package("ran-slice-a", vec![resource::deployment("upf", "ran", 3, 3)]),
    );
    let cluster = Arc::new(FakeCluster::new());

    let sync = SyncEngine::new(
        SyncSettings::parse(SYNC_YAML).unwrap(),
        Arc::clone(&git) as Arc<dyn DesiredStateRepository>,
        Some(Arc::new(FakeValidator::new())),
    )
    .with_poll_interval(Duration::from_millis(10));
    sync.add_cluster("edge01", Arc::clone(&cluster) as Arc<dyn ClusterHandle>)
        .await;

    let validation = ValidationEngine::new(
        PlatformConfig::parse(PLATFORM_YAML).unwrap(),
        git,
        Arc::new(FakeValidator::new()),
        Arc::new(FakeMetrics::new()),
    );
    validation
        .add_cluster("edge01", Arc::clone(&cluster) as Arc<dyn ClusterHandle>)
        .await;

    Harness {
        cluster,
        sync,
        validation,
    }
}

#[tokio::test]
async fn out_of_band_mutation_is_detected_and_corrected() {
    let h = harness().await;

    let first = h.sync.synchronize_all().await.unwrap();
    assert!(first.success);

    // someone scales the deployment behind the platform's back
    let mut mutated = h.cluster.resources().into_iter().next().unwrap();
    mutated.0["spec"]["replicas"] = json!(7);
    h.cluster.seed(mutated);

    let drifted = h.validation.validate_cluster("edge01").await.unwrap();
    assert!(drifted.success, "drift is advisory");
    assert!(
        drifted
            .warnings
            .iter()
            .any(|w| w.contains("drift") && w.contains("spec.replicas")),
        "warnings: {:?}",
        drifted.warnings
    );

    // git-wins resync restores the declared replica count
    let second = h.sync.synchronize_all().await.unwrap();
    assert!(second.success);
    assert_eq!(second.conflicts.len(), 1);
    assert!(second
        .results
        .iter()
        .flat_map(|r| &r.actions)
        .any(|a| a.action == SyncActionKind::Update));

    let stored = &h.cluster.resources()[0];
    assert_eq!(stored.field("spec.replicas"), Some(&json!(3)));

    let clean = h.validation.validate_cluster("edge01").await.unwrap();
    assert!(
        !clean.warnings.iter().any(|w| w.contains("drift")),
        "warnings: {:?}",
        clean.warnings
    );
}

#[tokio::test]
async fn deleted_resource_reappears_as_missing_then_recreated() {
    let h = harness().await;
    h.sync.synchronize_all().await.unwrap();

    // wipe the cluster by replacing the handle with a fresh store
    let empty = Arc::new(FakeCluster::new());
    h.sync
        .add_cluster("edge01", Arc::clone(&empty) as Arc<dyn ClusterHandle>)
        .await;
    h.validation
        .add_cluster("edge01", Arc::clone(&empty) as Arc<dyn ClusterHandle>)
        .await;

    let report = h.validation.validate_cluster("edge01").await.unwrap();
    assert!(
        report
            .warnings
            .iter()
            .any(|w| w.contains("drift") && w.contains("missing")),
        "warnings: {:?}",
        report.warnings
    );

    let resync = h.sync.synchronize_all().await.unwrap();
    assert!(resync.success);
    assert_eq!(empty.resources().len(), 1);
}

#[tokio::test]
async fn failed_sync_records_retry_bookkeeping() {
    // Git knows nothing about the configured package
    let git = Arc::new(FakeGit::new());
    let sync = SyncEngine::new(
        SyncSettings::parse(SYNC_YAML).unwrap(),
        git as Arc<dyn DesiredStateRepository>,
        None,
    )
    .with_poll_interval(Duration::from_millis(10));
    sync.add_cluster("edge01", Arc::new(FakeCluster::new())).await;

    let result = sync.synchronize_all().await.unwrap();
    assert!(!result.success);

    let status = sync.status().get("ran-slice-a", "edge01").unwrap();
    assert_eq!(status.state, SyncState::Failed);
    assert_eq!(status.retry_count, 1);
    assert!(status.next_retry.is_some());
    assert!(!status.errors.is_empty());

    // a second failed run keeps counting
    sync.synchronize_all().await.unwrap();
    let status = sync.status().get("ran-slice-a", "edge01").unwrap();
    assert_eq!(status.retry_count, 2);
}

#[tokio::test]
async fn validate_all_covers_every_registered_cluster() {
    let h = harness().await;
    h.sync.synchronize_all().await.unwrap();

    let extra = Arc::new(FakeCluster::new());
    extra.set_unreachable(true);
    h.validation.add_cluster("edge99", extra).await;

    let results = h.validation.validate_all().await;
    assert_eq!(results.len(), 2);
    assert!(results["edge01"].success, "errors: {:?}", results["edge01"].errors);
    assert!(!results["edge99"].success);
}
