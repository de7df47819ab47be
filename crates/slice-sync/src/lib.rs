//! Synchronization engine for the slice-manager reconciliation core
//!
//! Reconciles Git-declared packages into target clusters:
//!
//! - **Ordering**: package groups run in descending priority; group and
//!   package dependencies gate execution until their targets are synced
//! - **Concurrency**: non-sequential groups fan out their packages under a
//!   bounded worker pool; sequential groups run strictly in listed order
//! - **Reconciliation**: per resource, create when absent, skip when in
//!   sync, otherwise resolve the divergence (`git-wins`, `cluster-wins`,
//!   `merge`, or `manual`) and update, preserving cluster identity fields
//! - **Status**: a shared table tracks per-(package, cluster) state with
//!   retry bookkeeping; it is the observation source for dependency waits

pub mod conflict;
pub mod engine;
pub mod error;
pub mod result;
pub mod status;
pub mod wait;

pub use conflict::{resolve, resource_needs_update, Resolution, SYSTEM_ANNOTATION_PREFIXES};
pub use engine::SyncEngine;
pub use error::{Error, Result};
pub use result::{
    ConflictKind, PackageSyncResult, SyncAction, SyncActionKind, SyncConflict, SyncOperationResult,
};
pub use status::{PackageSyncStatus, StatusTable, SyncError, SyncState};
pub use wait::{wait_for_group, wait_for_package, DEFAULT_POLL_INTERVAL};
