//! Resource rule evaluation
//!
//! A [`ResourceRule`] declares which resources must exist in a cluster and
//! what to assert on them. Evaluation lists the matching resources,
//! classifies their readiness with kind-specific logic, and checks the
//! rule's field assertions.

use chrono::Utc;
use serde_json::Value;
use slice_core::{ClusterHandle, FieldAssertion, FieldCondition, Resource, ResourceRule};

use crate::result::ResourceValidationResult;
use crate::Result;

/// Findings from evaluating one rule against one cluster.
#[derive(Debug, Default)]
pub struct RuleOutcome {
    /// Readiness classification for every matched resource
    pub resources: Vec<ResourceValidationResult>,
    /// Failed field assertions (hard findings)
    pub errors: Vec<String>,
    /// Soft findings (e.g. the rule matched nothing)
    pub warnings: Vec<String>,
}

/// Evaluate a rule against a cluster.
///
/// # Errors
///
/// Fails on GVR resolution or listing failure; these are hard per-cluster
/// errors. Assertion failures are findings inside the outcome, not errors.
pub async fn evaluate_rule(handle: &dyn ClusterHandle, rule: &ResourceRule) -> Result<RuleOutcome> {
    let gvr = handle.resolve_gvr(&rule.api_version, &rule.kind).await?;
    let resources = handle
        .list(
            &gvr,
            rule.namespace.as_deref(),
            rule.label_selector.as_deref(),
        )
        .await?;

    let mut outcome = RuleOutcome::default();
    let mut matched = 0usize;

    for resource in &resources {
        if let Some(wanted) = &rule.name
            && resource.name() != Some(wanted.as_str())
        {
            continue;
        }
        matched += 1;
        outcome.resources.push(classify(resource, &rule.kind));

        for assertion in &rule.field_assertions {
            if let Err(finding) = check_assertion(resource, assertion) {
                outcome.errors.push(format!(
                    "{} {}: {}",
                    rule.kind,
                    resource.name().unwrap_or("<unnamed>"),
                    finding
                ));
            }
        }
    }

    if matched == 0 {
        outcome.warnings.push(format!(
            "no {} resources matched rule (namespace: {}, selector: {})",
            rule.kind,
            rule.namespace.as_deref().unwrap_or("any"),
            rule.label_selector.as_deref().unwrap_or("none"),
        ));
    }

    Ok(outcome)
}

/// Classify a resource's readiness using kind-specific logic.
///
/// - `Deployment`: ready iff `readyReplicas == replicas` and `replicas > 0`
/// - `Pod`: ready iff `status.phase == "Running"`
/// - anything else defaults to ready
pub fn classify(resource: &Resource, kind: &str) -> ResourceValidationResult {
    let (ready, status) = match kind {
        "Deployment" => {
            let replicas = resource.replicas().unwrap_or(0);
            let ready_replicas = resource.ready_replicas().unwrap_or(0);
            if replicas > 0 && ready_replicas == replicas {
                (true, "Ready".to_string())
            } else {
                (false, "NotReady".to_string())
            }
        }
        "Pod" => {
            let phase = resource.phase().unwrap_or("Unknown");
            (phase == "Running", phase.to_string())
        }
        _ => (true, "Ready".to_string()),
    };

    ResourceValidationResult {
        name: resource.name().unwrap_or("<unnamed>").to_string(),
        namespace: resource.namespace().map(str::to_string),
        kind: kind.to_string(),
        ready,
        status,
        conditions: resource.condition_summaries(),
        last_updated: Utc::now(),
    }
}

/// Check one field assertion, returning a finding description on failure.
fn check_assertion(resource: &Resource, assertion: &FieldAssertion) -> std::result::Result<(), String> {
    let actual = resource.field(&assertion.path);

    match assertion.condition {
        FieldCondition::Exists => {
            if actual.is_none() {
                return Err(format!("field {} does not exist", assertion.path));
            }
        }
        FieldCondition::Equals => {
            let expected = assertion.value.as_ref();
            if actual != expected {
                return Err(format!(
                    "field {} is {}, expected {}",
                    assertion.path,
                    render(actual),
                    render(expected),
                ));
            }
        }
        FieldCondition::Contains => {
            let needle = expected_string(assertion)?;
            let haystack = actual_string(actual, &assertion.path)?;
            if !haystack.contains(&needle) {
                return Err(format!(
                    "field {} ({}) does not contain {:?}",
                    assertion.path, haystack, needle
                ));
            }
        }
        FieldCondition::Matches => {
            let pattern = expected_string(assertion)?;
            let regex = regex::Regex::new(&pattern)
                .map_err(|e| format!("invalid pattern for {}: {}", assertion.path, e))?;
            let text = actual_string(actual, &assertion.path)?;
            if !regex.is_match(&text) {
                return Err(format!(
                    "field {} ({}) does not match {:?}",
                    assertion.path, text, pattern
                ));
            }
        }
    }
    Ok(())
}

fn expected_string(assertion: &FieldAssertion) -> std::result::Result<String, String> {
    match &assertion.value {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Ok(other.to_string()),
        None => Err(format!(
            "assertion on {} requires a value",
            assertion.path
        )),
    }
}

fn actual_string(actual: Option<&Value>, path: &str) -> std::result::Result<String, String> {
    match actual {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Ok(other.to_string()),
        None => Err(format!("field {} does not exist", path)),
    }
}

fn render(value: Option<&Value>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "<absent>".to_string(),
    }
}
