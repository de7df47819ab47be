//! Desired-state repository seam
//!
//! Git holds the rendered deployment packages that constitute desired
//! state. The engines never touch a repository directly; they consume this
//! trait, and the clone/fetch/diff machinery lives behind it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::resource::Resource;
use crate::Result;

/// Synchronization state of the local checkout against its remote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitSyncStatus {
    /// Status label, e.g. "synced", "behind", "diverged"
    pub status: String,
    /// When the checkout last synchronized with the remote
    pub last_sync: Option<DateTime<Utc>>,
}

/// Read-only view of the Git repository holding desired state.
#[async_trait]
pub trait DesiredStateRepository: Send + Sync {
    /// Currently checked-out branch.
    async fn current_branch(&self) -> Result<String>;

    /// Commit id at the head of the checkout.
    async fn last_commit(&self) -> Result<String>;

    /// Whether the working tree is clean.
    async fn is_clean(&self) -> Result<bool>;

    /// Remote synchronization status.
    async fn sync_status(&self) -> Result<GitSyncStatus>;

    /// Rendered resources constituting the named package.
    async fn package_content(&self, package: &str) -> Result<Vec<Resource>>;
}
