//! Shared synchronization status table
//!
//! The only engine-owned mutable shared state. One entry per (package,
//! cluster) pair, created lazily on first update, never deleted by the
//! engine itself. A single table-wide lock guards reads and writes; the
//! lock is never held across an await point.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle stage of one (package, cluster) reconciliation attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    #[default]
    Unknown,
    Pending,
    InProgress,
    Synced,
    Failed,
    Conflict,
    Waiting,
}

/// One recorded synchronization error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncError {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Synchronization status for one (package, cluster) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageSyncStatus {
    pub package: String,
    pub cluster: String,
    pub state: SyncState,
    /// Last time any state change was recorded
    pub last_sync: Option<DateTime<Utc>>,
    /// Last transition into `synced`
    pub last_success: Option<DateTime<Utc>>,
    /// Version deployed by the last successful sync
    pub deployed_version: Option<String>,
    /// Errors in arrival order
    pub errors: Vec<SyncError>,
    /// Consecutive failures since the last success
    pub retry_count: u32,
    /// Earliest time the next retry should run
    pub next_retry: Option<DateTime<Utc>>,
    /// Health summary derived from the state
    pub health: Option<String>,
}

impl PackageSyncStatus {
    fn new(package: &str, cluster: &str) -> Self {
        Self {
            package: package.to_string(),
            cluster: cluster.to_string(),
            state: SyncState::Unknown,
            last_sync: None,
            last_success: None,
            deployed_version: None,
            errors: Vec::new(),
            retry_count: 0,
            next_retry: None,
            health: None,
        }
    }
}

/// Backoff growth is capped at this many doublings.
const MAX_BACKOFF_DOUBLINGS: u32 = 5;

/// Concurrency-safe sync-status table keyed by (package, cluster).
pub struct StatusTable {
    entries: Mutex<HashMap<(String, String), PackageSyncStatus>>,
    retry_backoff: Duration,
}

impl StatusTable {
    /// Create an empty table with the given base retry backoff.
    pub fn new(retry_backoff: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            retry_backoff,
        }
    }

    /// Lock the table, recovering the data when a previous holder
    /// panicked. Every write happens atomically under the lock, so a
    /// poisoned table is still internally consistent and dependency
    /// polling can keep observing it.
    fn lock(&self) -> MutexGuard<'_, HashMap<(String, String), PackageSyncStatus>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a state change for a (package, cluster) pair. This is the
    /// single mutation point for the table.
    ///
    /// - Appends an error entry when a message is supplied
    /// - Stamps `lastSync` on every call
    /// - On `Synced`: stamps `lastSuccess`, resets the retry count, and
    ///   records the deployed version when supplied
    /// - On `Failed`: increments the retry count and schedules `nextRetry`
    ///   with exponential backoff
    pub fn update(
        &self,
        package: &str,
        cluster: &str,
        state: SyncState,
        message: Option<&str>,
        version: Option<&str>,
    ) {
        let now = Utc::now();
        let mut entries = self.lock();
        let entry = entries
            .entry((package.to_string(), cluster.to_string()))
            .or_insert_with(|| PackageSyncStatus::new(package, cluster));

        entry.state = state;
        entry.last_sync = Some(now);
        if let Some(message) = message {
            entry.errors.push(SyncError {
                message: message.to_string(),
                timestamp: now,
            });
        }

        match state {
            SyncState::Synced => {
                entry.last_success = Some(now);
                entry.retry_count = 0;
                entry.next_retry = None;
                entry.health = Some("Healthy".to_string());
                if let Some(version) = version {
                    entry.deployed_version = Some(version.to_string());
                }
            }
            SyncState::Failed => {
                entry.retry_count += 1;
                let doublings = (entry.retry_count - 1).min(MAX_BACKOFF_DOUBLINGS);
                let backoff = self.retry_backoff * 2u32.pow(doublings);
                entry.next_retry = now
                    .checked_add_signed(
                        chrono::Duration::from_std(backoff).unwrap_or(chrono::Duration::zero()),
                    );
                entry.health = Some("Degraded".to_string());
            }
            SyncState::Conflict => {
                entry.health = Some("Conflicted".to_string());
            }
            _ => {}
        }
    }

    /// Status for one pair, if it has ever been updated.
    pub fn get(&self, package: &str, cluster: &str) -> Option<PackageSyncStatus> {
        self.lock()
            .get(&(package.to_string(), cluster.to_string()))
            .cloned()
    }

    /// Whether a package is fully synced: at least one entry exists for it
    /// and every entry is in the `synced` state.
    pub fn package_synced(&self, package: &str) -> bool {
        let entries = self.lock();
        let mut seen = false;
        for ((p, _), status) in entries.iter() {
            if p == package {
                if status.state != SyncState::Synced {
                    return false;
                }
                seen = true;
            }
        }
        seen
    }

    /// Snapshot of every entry, for the presentation layer.
    pub fn snapshot(&self) -> Vec<PackageSyncStatus> {
        self.lock().values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table() -> StatusTable {
        StatusTable::new(Duration::from_secs(30))
    }

    #[test]
    fn entries_created_lazily() {
        let t = table();
        assert!(t.get("upf", "edge01").is_none());
        t.update("upf", "edge01", SyncState::Pending, None, None);
        let status = t.get("upf", "edge01").unwrap();
        assert_eq!(status.state, SyncState::Pending);
        assert!(status.last_sync.is_some());
        assert!(status.last_success.is_none());
    }

    #[test]
    fn synced_resets_retry_count_and_records_version() {
        let t = table();
        t.update("upf", "edge01", SyncState::Failed, Some("boom"), None);
        t.update("upf", "edge01", SyncState::Failed, Some("boom again"), None);
        let status = t.get("upf", "edge01").unwrap();
        assert_eq!(status.retry_count, 2);
        assert!(status.next_retry.is_some());

        t.update("upf", "edge01", SyncState::Synced, None, Some("abc1234"));
        let status = t.get("upf", "edge01").unwrap();
        assert_eq!(status.retry_count, 0);
        assert!(status.next_retry.is_none());
        assert_eq!(status.deployed_version.as_deref(), Some("abc1234"));
        assert!(status.last_success.is_some());
        assert_eq!(status.errors.len(), 2); // history is kept
    }

    #[test]
    fn backoff_grows_with_retries() {
        let t = table();
        t.update("upf", "edge01", SyncState::Failed, None, None);
        let first = t.get("upf", "edge01").unwrap().next_retry.unwrap();
        t.update("upf", "edge01", SyncState::Failed, None, None);
        let second = t.get("upf", "edge01").unwrap().next_retry.unwrap();
        // second retry is scheduled further out than the first
        assert!(second - Utc::now() > first - Utc::now());
    }

    #[test]
    fn table_stays_usable_after_panicked_holder() {
        let t = table();
        t.update("upf", "edge01", SyncState::Synced, None, None);

        // panic while holding the lock, poisoning the mutex
        std::thread::scope(|s| {
            let handle = s.spawn(|| {
                let _guard = t.entries.lock().unwrap();
                panic!("holder died");
            });
            assert!(handle.join().is_err());
        });

        assert_eq!(t.get("upf", "edge01").unwrap().state, SyncState::Synced);
        assert!(t.package_synced("upf"));
        t.update("upf", "edge01", SyncState::Failed, Some("boom"), None);
        assert_eq!(t.get("upf", "edge01").unwrap().retry_count, 1);
    }

    #[test]
    fn package_synced_requires_all_entries_synced() {
        let t = table();
        assert!(!t.package_synced("upf"));
        t.update("upf", "edge01", SyncState::Synced, None, None);
        assert!(t.package_synced("upf"));
        t.update("upf", "edge02", SyncState::Failed, Some("boom"), None);
        assert!(!t.package_synced("upf"));
        t.update("upf", "edge02", SyncState::Synced, None, None);
        assert!(t.package_synced("upf"));
    }
}
