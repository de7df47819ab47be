//! Update decision and conflict resolution
//!
//! Every non-trivial update is treated as a potential conflict between
//! the Git-declared and cluster-observed state. The update decision uses
//! structural deep equality over the JSON documents, so formatting and
//! map ordering differences never produce false positives.

use serde_json::{Map, Value};
use slice_core::{ConflictStrategy, Resource};

use crate::result::ConflictKind;
use crate::{Error, Result};

/// Annotation prefixes managed by the cluster tooling, excluded from the
/// update comparison. Extended by `ignoredAnnotationPrefixes` in the sync
/// settings.
pub const SYSTEM_ANNOTATION_PREFIXES: &[&str] = &[
    "kubectl.kubernetes.io/",
    "deployment.kubernetes.io/",
    "pv.kubernetes.io/",
];

/// Decide whether the observed resource needs an update to match the
/// declared one, and how the two diverge.
///
/// - Spec present on one side only, or both specs structurally unequal:
///   spec divergence
/// - Neither side has a spec: metadata divergence iff labels differ or
///   annotations differ after dropping system-managed prefixes
/// - Otherwise no update is needed
pub fn resource_needs_update(
    existing: &Resource,
    desired: &Resource,
    extra_ignored_prefixes: &[String],
) -> Option<ConflictKind> {
    match (existing.spec(), desired.spec()) {
        (Some(existing_spec), Some(desired_spec)) => {
            if existing_spec != desired_spec {
                Some(ConflictKind::SpecDivergence)
            } else {
                None
            }
        }
        (None, None) => {
            if existing.labels() != desired.labels() {
                return Some(ConflictKind::MetadataDivergence);
            }
            let existing_annotations =
                filtered_annotations(existing.annotations(), extra_ignored_prefixes);
            let desired_annotations =
                filtered_annotations(desired.annotations(), extra_ignored_prefixes);
            if existing_annotations != desired_annotations {
                Some(ConflictKind::MetadataDivergence)
            } else {
                None
            }
        }
        _ => Some(ConflictKind::SpecDivergence),
    }
}

fn filtered_annotations(
    annotations: Option<&Map<String, Value>>,
    extra_ignored_prefixes: &[String],
) -> Map<String, Value> {
    let Some(annotations) = annotations else {
        return Map::new();
    };
    annotations
        .iter()
        .filter(|(key, _)| {
            !SYSTEM_ANNOTATION_PREFIXES
                .iter()
                .any(|prefix| key.starts_with(prefix))
                && !extra_ignored_prefixes
                    .iter()
                    .any(|prefix| key.starts_with(prefix.as_str()))
        })
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// What a conflict resolution decided.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Write this object to the cluster
    Write(Resource),
    /// Keep the existing object; no write
    Keep,
}

/// Resolve a conflict between the declared and observed resource.
///
/// - `git-wins`: write the declared object, carrying the cluster identity
///   fields from the existing one
/// - `cluster-wins`: keep the existing object
/// - `merge`: write the declared content but keep identity fields and
///   generation from the existing object
/// - `manual`: refuse; the caller records the pair as conflicted
///
/// # Errors
///
/// [`Error::ManualResolutionRequired`] for the `manual` strategy.
pub fn resolve(
    strategy: ConflictStrategy,
    desired: &Resource,
    existing: &Resource,
) -> Result<Resolution> {
    match strategy {
        ConflictStrategy::GitWins => {
            let mut resolved = desired.clone();
            resolved.carry_identity_from(existing);
            Ok(Resolution::Write(resolved))
        }
        ConflictStrategy::ClusterWins => Ok(Resolution::Keep),
        ConflictStrategy::Merge => {
            let mut resolved = desired.clone();
            resolved.carry_identity_and_generation_from(existing);
            Ok(Resolution::Write(resolved))
        }
        ConflictStrategy::Manual => Err(Error::ManualResolutionRequired {
            kind: desired.kind().unwrap_or("<unknown>").to_string(),
            name: desired.name().unwrap_or("<unnamed>").to_string(),
        }),
    }
}
