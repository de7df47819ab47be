//! ValidationEngine behavior against in-memory collaborators

use std::sync::Arc;

use serde_json::json;

use slice_core::{PerformanceSample, PlatformConfig};
use slice_test_utils::{resource, FakeCluster, FakeGit, FakeMetrics, FakeValidator};
use slice_validation::ValidationEngine;

fn config(yaml: &str) -> PlatformConfig {
    PlatformConfig::parse(yaml).expect("test config must parse")
}

fn engine_with(
    config: PlatformConfig,
    git: FakeGit,
    validator: FakeValidator,
    metrics: FakeMetrics,
) -> ValidationEngine {
    ValidationEngine::new(config, Arc::new(git), Arc::new(validator), Arc::new(metrics))
}

fn nominal_sample() -> PerformanceSample {
    PerformanceSample {
        deployment_time_secs: 60.0,
        throughput_mbps: vec![1000.0],
        ping_rtt_ms: vec![10.0],
        cpu_utilization: 40.0,
        memory_utilization: 50.0,
    }
}

#[tokio::test]
async fn validate_all_returns_one_result_per_cluster() {
    let engine = engine_with(
        config("clusters: [{name: edge01, type: edge}, {name: edge02, type: edge}, {name: central01, type: central}]"),
        FakeGit::new(),
        FakeValidator::new(),
        FakeMetrics::new(),
    );
    engine.add_cluster("edge01", Arc::new(FakeCluster::new())).await;
    engine.add_cluster("edge02", Arc::new(FakeCluster::new())).await;
    engine.add_cluster("central01", Arc::new(FakeCluster::new())).await;

    let results = engine.validate_all().await;
    assert_eq!(results.len(), 3);
    for name in ["edge01", "edge02", "central01"] {
        assert!(results.contains_key(name), "missing result for {}", name);
    }
}

#[tokio::test]
async fn unreachable_cluster_does_not_affect_siblings() {
    let yaml = r#"
clusters:
  - {name: edge01, type: edge}
  - {name: edge02, type: edge}
validation:
  requiredResources:
    - {apiVersion: apps/v1, kind: Deployment}
"#;
    let engine = engine_with(
        config(yaml),
        FakeGit::new(),
        FakeValidator::new(),
        FakeMetrics::new(),
    );

    let broken = Arc::new(FakeCluster::new());
    broken.set_unreachable(true);
    let healthy = Arc::new(FakeCluster::new());
    healthy.seed(resource::deployment("upf", "ran", 3, 3));

    engine.add_cluster("edge01", broken).await;
    engine.add_cluster("edge02", healthy).await;

    let results = engine.validate_all().await;
    assert_eq!(results.len(), 2);

    let broken_result = &results["edge01"];
    assert!(!broken_result.success);
    assert!(broken_result.errors.iter().any(|e| e.contains("Deployment")));

    let healthy_result = &results["edge02"];
    assert!(healthy_result.success, "errors: {:?}", healthy_result.errors);
    assert_eq!(healthy_result.resources.len(), 1);
    assert!(healthy_result.resources[0].ready);
}

#[tokio::test]
async fn unknown_cluster_fails_immediately() {
    let engine = engine_with(
        config("{}"),
        FakeGit::new(),
        FakeValidator::new(),
        FakeMetrics::new(),
    );
    let err = engine.validate_cluster("nowhere").await.unwrap_err();
    assert!(err.to_string().contains("nowhere"));
}

#[tokio::test]
async fn readiness_classification_for_deployments() {
    let yaml = r#"
clusters: [{name: edge01, type: edge}]
validation:
  requiredResources:
    - {apiVersion: apps/v1, kind: Deployment, namespace: ran}
"#;
    let engine = engine_with(
        config(yaml),
        FakeGit::new(),
        FakeValidator::new(),
        FakeMetrics::new(),
    );
    let cluster = Arc::new(FakeCluster::new());
    cluster.seed(resource::deployment("upf-ready", "ran", 3, 3));
    cluster.seed(resource::deployment("upf-degraded", "ran", 3, 1));
    engine.add_cluster("edge01", cluster).await;

    let result = engine.validate_cluster("edge01").await.unwrap();
    let ready = result
        .resources
        .iter()
        .find(|r| r.name == "upf-ready")
        .unwrap();
    assert!(ready.ready);
    assert_eq!(ready.status, "Ready");

    let degraded = result
        .resources
        .iter()
        .find(|r| r.name == "upf-degraded")
        .unwrap();
    assert!(!degraded.ready);
    assert_eq!(degraded.status, "NotReady");
}

#[tokio::test]
async fn git_failure_is_hard_but_duration_is_recorded() {
    let git = FakeGit::new();
    git.set_unreachable(true);
    let engine = engine_with(
        config("clusters: [{name: edge01, type: edge}]"),
        git,
        FakeValidator::new(),
        FakeMetrics::new(),
    );
    engine.add_cluster("edge01", Arc::new(FakeCluster::new())).await;

    let result = engine.validate_cluster("edge01").await.unwrap();
    assert!(!result.success);
    assert!(result.errors.iter().any(|e| e.contains("git state")));
    assert!(result.git.is_none());
}

#[tokio::test]
async fn invalid_package_is_hard_error() {
    let engine = engine_with(
        config("clusters: [{name: edge01, type: edge, packages: [ran-slice-a]}]"),
        FakeGit::new(),
        FakeValidator::new().with_invalid("ran-slice-a", "missing Kptfile"),
        FakeMetrics::new(),
    );
    engine.add_cluster("edge01", Arc::new(FakeCluster::new())).await;

    let result = engine.validate_cluster("edge01").await.unwrap();
    assert!(!result.success);
    assert!(result
        .errors
        .iter()
        .any(|e| e.contains("ran-slice-a") && e.contains("missing Kptfile")));
}

#[tokio::test]
async fn performance_breaches_are_warnings_not_errors() {
    let yaml = r#"
clusters: [{name: edge01, type: edge}]
validation:
  performanceThresholds:
    deploymentTimeSecs: 120
    throughputMbps: [1000]
    pingRttMs: [10]
    cpuUtilization: 80
    memoryUtilization: 85
"#;
    let mut slow = nominal_sample();
    slow.cpu_utilization = 95.0;
    let engine = engine_with(
        config(yaml),
        FakeGit::new(),
        FakeValidator::new(),
        FakeMetrics::new().with_sample("edge01", slow),
    );
    engine.add_cluster("edge01", Arc::new(FakeCluster::new())).await;

    let result = engine.validate_cluster("edge01").await.unwrap();
    assert!(result.success, "performance is advisory: {:?}", result.errors);
    assert!(result.warnings.iter().any(|w| w.contains("CPU")));
    let perf = result.performance.unwrap();
    assert!(!perf.within_thresholds);
}

#[tokio::test]
async fn missing_metrics_collector_sample_is_a_warning() {
    let engine = engine_with(
        config("clusters: [{name: edge01, type: edge}]"),
        FakeGit::new(),
        FakeValidator::new(),
        FakeMetrics::new(), // no sample registered
    );
    engine.add_cluster("edge01", Arc::new(FakeCluster::new())).await;

    let result = engine.validate_cluster("edge01").await.unwrap();
    assert!(result.success);
    assert!(result
        .warnings
        .iter()
        .any(|w| w.contains("performance metrics unavailable")));
    assert!(result.performance.is_none());
}

#[tokio::test]
async fn drift_findings_are_warnings() {
    let yaml = r#"
clusters: [{name: edge01, type: edge, packages: [ran-slice-a]}]
driftDetection:
  enabled: true
"#;
    let declared = resource::deployment("upf", "ran", 3, 3);
    let git = FakeGit::new().with_package("ran-slice-a", vec![declared]);

    // cluster holds a diverged copy
    let cluster = Arc::new(FakeCluster::new());
    let mut observed = resource::deployment("upf", "ran", 3, 3);
    observed.0["spec"]["replicas"] = json!(5);
    cluster.seed(observed);

    let engine = engine_with(config(yaml), git, FakeValidator::new(), FakeMetrics::new());
    engine.add_cluster("edge01", cluster).await;

    let result = engine.validate_cluster("edge01").await.unwrap();
    assert!(result.success, "drift is advisory: {:?}", result.errors);
    assert!(
        result
            .warnings
            .iter()
            .any(|w| w.contains("drift") && w.contains("spec.replicas")),
        "warnings: {:?}",
        result.warnings
    );
}

#[tokio::test]
async fn field_assertion_failure_is_hard() {
    let yaml = r#"
clusters: [{name: edge01, type: edge}]
validation:
  requiredResources:
    - apiVersion: apps/v1
      kind: Deployment
      fieldAssertions:
        - {path: spec.replicas, value: 5, condition: equals}
"#;
    let cluster = Arc::new(FakeCluster::new());
    cluster.seed(resource::deployment("upf", "ran", 3, 3));
    let engine = engine_with(
        config(yaml),
        FakeGit::new(),
        FakeValidator::new(),
        FakeMetrics::new(),
    );
    engine.add_cluster("edge01", cluster).await;

    let result = engine.validate_cluster("edge01").await.unwrap();
    assert!(!result.success);
    assert!(result.errors.iter().any(|e| e.contains("spec.replicas")));
}
