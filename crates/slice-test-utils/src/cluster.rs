//! In-memory cluster fake

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use slice_core::{
    parse_label_selector, selector_matches, ClusterHandle, Error, Gvr, Resource, Result,
};

type StoreKey = (String, String, String); // (plural resource, namespace, name)

/// An in-memory resource store implementing [`ClusterHandle`].
///
/// `create` stamps resourceVersion/uid/creationTimestamp the way an API
/// server would; `update` bumps the resourceVersion. Set
/// [`set_unreachable`](Self::set_unreachable) to make every call fail,
/// for isolation tests.
#[derive(Default)]
pub struct FakeCluster {
    store: Mutex<HashMap<StoreKey, Resource>>,
    version: AtomicU64,
    unreachable: AtomicBool,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a cluster API error.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Insert a resource directly, bypassing create stamping. The resource
    /// must carry apiVersion, kind, and metadata.name.
    pub fn seed(&self, resource: Resource) {
        let key = self.key_for(&resource);
        self.store.lock().unwrap().insert(key, resource);
    }

    /// Snapshot of every stored resource.
    pub fn resources(&self) -> Vec<Resource> {
        self.store.lock().unwrap().values().cloned().collect()
    }

    fn key_for(&self, resource: &Resource) -> StoreKey {
        let gvr = Gvr::guess(
            resource.api_version().unwrap_or(""),
            resource.kind().unwrap_or(""),
        );
        (
            gvr.resource,
            resource.namespace().unwrap_or("").to_string(),
            resource.name().unwrap_or("").to_string(),
        )
    }

    fn check_reachable(&self) -> Result<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            Err(Error::ClusterApi {
                message: "connection refused".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ClusterHandle for FakeCluster {
    async fn list(
        &self,
        gvr: &Gvr,
        namespace: Option<&str>,
        selector: Option<&str>,
    ) -> Result<Vec<Resource>> {
        self.check_reachable()?;
        let pairs = selector.map(parse_label_selector).unwrap_or_default();
        let store = self.store.lock().unwrap();
        Ok(store
            .iter()
            .filter(|((resource, ns, _), _)| {
                *resource == gvr.resource && namespace.is_none_or(|want| ns == want)
            })
            .map(|(_, r)| r)
            .filter(|r| selector_matches(r, &pairs))
            .cloned()
            .collect())
    }

    async fn get(&self, gvr: &Gvr, namespace: Option<&str>, name: &str) -> Result<Resource> {
        self.check_reachable()?;
        let key = (
            gvr.resource.clone(),
            namespace.unwrap_or("").to_string(),
            name.to_string(),
        );
        self.store
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::ResourceNotFound {
                kind: gvr.resource.clone(),
                name: name.to_string(),
            })
    }

    async fn create(
        &self,
        gvr: &Gvr,
        namespace: Option<&str>,
        resource: &Resource,
    ) -> Result<Resource> {
        self.check_reachable()?;
        let mut stored = resource.clone();
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        let metadata = stored.metadata_mut();
        metadata.insert("resourceVersion".to_string(), json!(version.to_string()));
        metadata.insert("uid".to_string(), json!(uuid::Uuid::new_v4().to_string()));
        metadata.insert(
            "creationTimestamp".to_string(),
            json!(Utc::now().to_rfc3339()),
        );

        let key = (
            gvr.resource.clone(),
            namespace
                .or(resource.namespace())
                .unwrap_or("")
                .to_string(),
            resource.name().unwrap_or("").to_string(),
        );
        self.store.lock().unwrap().insert(key, stored.clone());
        Ok(stored)
    }

    async fn update(
        &self,
        gvr: &Gvr,
        namespace: Option<&str>,
        resource: &Resource,
    ) -> Result<Resource> {
        self.check_reachable()?;
        let mut stored = resource.clone();
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        stored
            .metadata_mut()
            .insert("resourceVersion".to_string(), json!(version.to_string()));

        let key = (
            gvr.resource.clone(),
            namespace
                .or(resource.namespace())
                .unwrap_or("")
                .to_string(),
            resource.name().unwrap_or("").to_string(),
        );
        let mut store = self.store.lock().unwrap();
        if !store.contains_key(&key) {
            return Err(Error::ResourceNotFound {
                kind: gvr.resource.clone(),
                name: key.2,
            });
        }
        store.insert(key, stored.clone());
        Ok(stored)
    }

    async fn resolve_gvr(&self, api_version: &str, kind: &str) -> Result<Gvr> {
        self.check_reachable()?;
        Ok(Gvr::guess(api_version, kind))
    }
}
