//! Canned desired-state repository fake

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use slice_core::{DesiredStateRepository, Error, GitSyncStatus, Resource, Result};

/// A desired-state repository with canned branch/commit state and
/// per-package resource lists.
pub struct FakeGit {
    branch: String,
    commit: String,
    clean: bool,
    packages: Mutex<HashMap<String, Vec<Resource>>>,
    unreachable: AtomicBool,
}

impl Default for FakeGit {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeGit {
    pub fn new() -> Self {
        Self {
            branch: "main".to_string(),
            commit: "abc1234".to_string(),
            clean: true,
            packages: Mutex::new(HashMap::new()),
            unreachable: AtomicBool::new(false),
        }
    }

    /// Builder: register a package's rendered resources.
    pub fn with_package(self, name: &str, resources: Vec<Resource>) -> Self {
        self.packages
            .lock()
            .unwrap()
            .insert(name.to_string(), resources);
        self
    }

    /// Builder: mark the working tree dirty.
    pub fn dirty(mut self) -> Self {
        self.clean = false;
        self
    }

    /// Make every subsequent call fail.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    fn check_reachable(&self) -> Result<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            Err(Error::Git {
                message: "remote unreachable".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DesiredStateRepository for FakeGit {
    async fn current_branch(&self) -> Result<String> {
        self.check_reachable()?;
        Ok(self.branch.clone())
    }

    async fn last_commit(&self) -> Result<String> {
        self.check_reachable()?;
        Ok(self.commit.clone())
    }

    async fn is_clean(&self) -> Result<bool> {
        self.check_reachable()?;
        Ok(self.clean)
    }

    async fn sync_status(&self) -> Result<GitSyncStatus> {
        self.check_reachable()?;
        Ok(GitSyncStatus {
            status: "synced".to_string(),
            last_sync: Some(Utc::now()),
        })
    }

    async fn package_content(&self, package: &str) -> Result<Vec<Resource>> {
        self.check_reachable()?;
        self.packages
            .lock()
            .unwrap()
            .get(package)
            .cloned()
            .ok_or_else(|| Error::Git {
                message: format!("package {} not found in repository", package),
            })
    }
}
