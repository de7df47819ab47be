//! Unstructured resource representation
//!
//! Rendered packages and live cluster objects are both carried as
//! schemaless JSON documents, the way a dynamic Kubernetes client sees
//! them. [`Resource`] wraps the payload with typed accessors for the
//! handful of well-known fields the engines care about, and [`Gvr`]
//! identifies a resource type for API access.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Group-version-resource triple identifying a resource type.
///
/// The authoritative way to obtain one is
/// [`ClusterHandle::resolve_gvr`](crate::ClusterHandle::resolve_gvr), which
/// is backed by the cluster's own API discovery. [`Gvr::guess`] exists as a
/// fallback for handles without discovery support.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Gvr {
    /// API group; empty for the core group
    pub group: String,
    /// API version, e.g. "v1"
    pub version: String,
    /// Plural resource name, e.g. "deployments"
    pub resource: String,
}

impl Gvr {
    /// Build a GVR from an `apiVersion` string and a kind by string
    /// heuristic.
    ///
    /// Handles the regular `+s` class and the consonant-`y` → `-ies` class
    /// ("Policy" → "policies", but "Gateway" → "gateways"). Kinds with
    /// genuinely irregular plurals need discovery-based resolution instead.
    pub fn guess(api_version: &str, kind: &str) -> Gvr {
        let (group, version) = match api_version.split_once('/') {
            Some((g, v)) => (g.to_string(), v.to_string()),
            None => (String::new(), api_version.to_string()),
        };

        let lower = kind.to_lowercase();
        let consonant_y_stem = lower
            .strip_suffix('y')
            .filter(|stem| !stem.ends_with(['a', 'e', 'i', 'o', 'u']));
        let resource = if let Some(stem) = consonant_y_stem {
            format!("{}ies", stem)
        } else if lower.ends_with('s') {
            lower
        } else {
            format!("{}s", lower)
        };

        Gvr {
            group,
            version,
            resource,
        }
    }
}

impl std::fmt::Display for Gvr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}/{}", self.version, self.resource)
        } else {
            write!(f, "{}/{}/{}", self.group, self.version, self.resource)
        }
    }
}

/// A schemaless resource document (desired or observed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resource(pub Value);

/// Identity fields owned by the cluster, carried from the existing object
/// onto anything the engine writes back.
const IDENTITY_FIELDS: &[&str] = &[
    "resourceVersion",
    "uid",
    "creationTimestamp",
    "managedFields",
];

impl Resource {
    /// Wrap a JSON value, requiring `apiVersion`, `kind`, and
    /// `metadata.name` to be present.
    pub fn from_value(value: Value) -> Result<Resource> {
        let resource = Resource(value);
        for (field, got) in [
            ("apiVersion", resource.api_version()),
            ("kind", resource.kind()),
            ("metadata.name", resource.name()),
        ] {
            if got.is_none() {
                return Err(Error::MalformedResource {
                    message: format!("missing {}", field),
                });
            }
        }
        Ok(resource)
    }

    /// The `apiVersion` field, if present.
    pub fn api_version(&self) -> Option<&str> {
        self.0.get("apiVersion").and_then(Value::as_str)
    }

    /// The `kind` field, if present.
    pub fn kind(&self) -> Option<&str> {
        self.0.get("kind").and_then(Value::as_str)
    }

    /// The `metadata.name` field, if present.
    pub fn name(&self) -> Option<&str> {
        self.field("metadata.name").and_then(Value::as_str)
    }

    /// The `metadata.namespace` field, if present.
    pub fn namespace(&self) -> Option<&str> {
        self.field("metadata.namespace").and_then(Value::as_str)
    }

    /// The `metadata.labels` map, if present.
    pub fn labels(&self) -> Option<&Map<String, Value>> {
        self.field("metadata.labels").and_then(Value::as_object)
    }

    /// The `metadata.annotations` map, if present.
    pub fn annotations(&self) -> Option<&Map<String, Value>> {
        self.field("metadata.annotations").and_then(Value::as_object)
    }

    /// The `spec` section, if present.
    pub fn spec(&self) -> Option<&Value> {
        self.0.get("spec")
    }

    /// Look up a value by dot-separated path (e.g. `"status.readyReplicas"`).
    ///
    /// Array elements are addressed by index (`"spec.ports.0.port"`).
    pub fn field(&self, path: &str) -> Option<&Value> {
        let mut current = &self.0;
        for part in path.split('.') {
            match current {
                Value::Object(map) => {
                    current = map.get(part)?;
                }
                Value::Array(arr) => {
                    let index: usize = part.parse().ok()?;
                    current = arr.get(index)?;
                }
                _ => return None,
            }
        }
        Some(current)
    }

    /// Desired replica count (`spec.replicas`), if present.
    pub fn replicas(&self) -> Option<i64> {
        self.field("spec.replicas").and_then(Value::as_i64)
    }

    /// Ready replica count (`status.readyReplicas`), if present.
    pub fn ready_replicas(&self) -> Option<i64> {
        self.field("status.readyReplicas").and_then(Value::as_i64)
    }

    /// Pod phase (`status.phase`), if present.
    pub fn phase(&self) -> Option<&str> {
        self.field("status.phase").and_then(Value::as_str)
    }

    /// Status conditions flattened to `"type=status"` strings.
    pub fn condition_summaries(&self) -> Vec<String> {
        let Some(conditions) = self.field("status.conditions").and_then(Value::as_array) else {
            return Vec::new();
        };
        conditions
            .iter()
            .filter_map(|c| {
                let ctype = c.get("type").and_then(Value::as_str)?;
                let status = c.get("status").and_then(Value::as_str)?;
                Some(format!("{}={}", ctype, status))
            })
            .collect()
    }

    /// Mutable access to the `metadata` object, creating it if absent.
    pub fn metadata_mut(&mut self) -> &mut Map<String, Value> {
        if !matches!(self.0, Value::Object(_)) {
            self.0 = Value::Object(Map::new());
        }
        let Value::Object(root) = &mut self.0 else {
            unreachable!()
        };
        let entry = root
            .entry("metadata")
            .or_insert_with(|| Value::Object(Map::new()));
        if !matches!(entry, Value::Object(_)) {
            *entry = Value::Object(Map::new());
        }
        let Value::Object(metadata) = entry else {
            unreachable!()
        };
        metadata
    }

    /// Copy cluster-managed identity fields (resourceVersion, uid,
    /// creationTimestamp, managedFields) from an existing object onto this
    /// one, so that writing it back does not strip them.
    pub fn carry_identity_from(&mut self, existing: &Resource) {
        let mut carried: Vec<(String, Value)> = Vec::new();
        if let Some(meta) = existing.field("metadata").and_then(Value::as_object) {
            for field in IDENTITY_FIELDS {
                if let Some(value) = meta.get(*field) {
                    carried.push((field.to_string(), value.clone()));
                }
            }
        }
        let metadata = self.metadata_mut();
        for (field, value) in carried {
            metadata.insert(field, value);
        }
    }

    /// As [`carry_identity_from`](Self::carry_identity_from), plus
    /// `metadata.generation`. Used by merge-style conflict resolution.
    pub fn carry_identity_and_generation_from(&mut self, existing: &Resource) {
        self.carry_identity_from(existing);
        if let Some(generation) = existing.field("metadata.generation").cloned() {
            self.metadata_mut().insert("generation".to_string(), generation);
        }
    }
}
